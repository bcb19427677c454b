use shirt_tracker_core::constants::CURRENT_USER_KEY;
use shirt_tracker_storage::Storage;

use crate::error::{Result, ServiceError};

/// Record `user_id` as the signed-in user.
///
/// When a different user was signed in before, every app key except the
/// current-user key is cleared first so one account never sees another's
/// sheets. Returns true when local data was wiped.
pub fn switch_user(storage: &Storage, user_id: &str) -> Result<bool> {
    let user_id = user_id.trim();
    if user_id.is_empty() {
        return Err(ServiceError::InvalidInput("user id is empty".into()));
    }
    let previous = storage.current_user()?;
    let wiped = match previous.as_deref() {
        Some(previous) if previous != user_id => {
            let removed = storage.clear_except(&[CURRENT_USER_KEY])?;
            tracing::info!(removed, "Different user signed in; cleared local data");
            true
        },
        _ => false,
    };
    storage.set_current_user(user_id)?;
    Ok(wiped)
}

#[cfg(test)]
mod tests {
    use shirt_tracker_core::AppMode;

    use super::*;
    use crate::tests::create_test_storage;
    use crate::Workspace;

    #[test]
    fn test_same_user_keeps_data() {
        let (storage, _dir) = create_test_storage();
        assert!(!switch_user(&storage, "user-1").unwrap());
        let mut workspace = Workspace::open(storage.clone()).unwrap();
        workspace.add_tab("Aloha").unwrap();

        assert!(!switch_user(&storage, "user-1").unwrap());
        assert_eq!(storage.load_tabs(AppMode::Inventory).unwrap().unwrap().tabs.len(), 2);
    }

    #[test]
    fn test_other_user_wipes_everything_but_current_user() {
        let (storage, _dir) = create_test_storage();
        switch_user(&storage, "user-1").unwrap();
        let mut workspace = Workspace::open(storage.clone()).unwrap();
        workspace.add_tab("Aloha").unwrap();

        assert!(switch_user(&storage, "user-2").unwrap());
        assert!(storage.load_tabs(AppMode::Inventory).unwrap().is_none());
        assert_eq!(storage.current_user().unwrap().as_deref(), Some("user-2"));
        let fresh = Workspace::open(storage).unwrap();
        assert_eq!(fresh.tabs().tabs.len(), 1);
    }

    #[test]
    fn test_blank_user_rejected() {
        let (storage, _dir) = create_test_storage();
        assert!(switch_user(&storage, "  ").is_err());
    }
}
