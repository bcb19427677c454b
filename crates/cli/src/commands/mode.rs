use anyhow::Result;
use clap::ValueEnum;
use shirt_tracker_core::AppMode;

use super::AppContext;

#[derive(Clone, Copy, ValueEnum)]
pub(crate) enum ModeArg {
    Inventory,
    Wishlist,
}

impl From<ModeArg> for AppMode {
    fn from(value: ModeArg) -> Self {
        match value {
            ModeArg::Inventory => Self::Inventory,
            ModeArg::Wishlist => Self::Wishlist,
        }
    }
}

pub(crate) fn run(ctx: &AppContext, mode: Option<ModeArg>) -> Result<()> {
    let mut workspace = ctx.workspace()?;
    if let Some(mode) = mode {
        workspace.switch_mode(mode.into())?;
    }
    println!("{} ({})", workspace.mode(), workspace.active_tab_name());
    Ok(())
}
