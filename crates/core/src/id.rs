use uuid::Uuid;

/// Generate a fresh identifier for a tab, column, row or log entry.
///
/// Ids are random UUIDv4 strings and are never reused.
#[must_use]
pub fn create_id() -> String {
    Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_unique_uuids() {
        let a = create_id();
        let b = create_id();
        assert_ne!(a, b);
        assert!(Uuid::parse_str(&a).is_ok());
    }
}
