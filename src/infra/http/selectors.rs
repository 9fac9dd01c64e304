//! CSS selectors targeted by datastar patches.

pub const PREFERENCES_PANEL: &str = "#preferences-panel";
pub const ACTION_STATUS: &str = "#action-status";
