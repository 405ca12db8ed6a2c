//! Guarded editing of the ban engine's XML configuration document.
//!
//! Two independent paths: whole-document exchange (validated replace) and
//! selective key/value exchange restricted to [`QUICK_SETTINGS_KEYS`]. The
//! selective path is update-only: it never creates, removes or reorders
//! nodes, so the edited file stays loadable by the engine's own config
//! loader, whose expected document shape this crate must not invent.

use std::path::PathBuf;

mod editor;
mod scratch;

pub use editor::ConfigEditor;
pub use scratch::ScratchDir;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors produced by document access and editing.
///
/// Absent document is an error only for the selective write (which has
/// nothing to update); read paths map absence to empty results before ever
/// constructing a `NotFound`.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config document not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("config document not well-formed: {0}")]
    Malformed(String),
    #[error("config io error: {0}")]
    Io(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Quick-settings allow-list
// ---------------------------------------------------------------------------

/// The fixed, versioned set of keys editable through the selective path.
///
/// Everything else in the document is out of reach for the editor. This
/// list is shipped with the core and is not configurable at runtime.
pub const QUICK_SETTINGS_KEYS: &[&str] = &[
    "FailedLoginAttemptsBeforeBan",
    "BanTime",
    "ExpireTime",
    "CycleTime",
    "ResetFailedLoginCountForUnbannedIPAddresses",
    "ClearBannedIPAddressesOnRestart",
    "ClearFailedLoginsOnSuccessfulLogin",
    "ProcessInternalIPAddresses",
    "Whitelist",
    "WhitelistRegex",
    "Blacklist",
    "BlacklistRegex",
    "FailedLoginAttemptsBeforeBanUserNameWhitelist",
    "UserNameWhitelist",
    "FirewallRulePrefix",
];

/// Case-insensitive lookup into the allow-list, returning the canonical
/// spelling. Supplied keys are matched loosely; document nodes are matched
/// exactly against the canonical spelling.
pub fn canonical_key(name: &str) -> Option<&'static str> {
    QUICK_SETTINGS_KEYS
        .iter()
        .copied()
        .find(|k| k.eq_ignore_ascii_case(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_key_is_case_insensitive() {
        assert_eq!(canonical_key("bantime"), Some("BanTime"));
        assert_eq!(canonical_key("FIREWALLRULEPREFIX"), Some("FirewallRulePrefix"));
        assert_eq!(canonical_key("Whitelist"), Some("Whitelist"));
        assert_eq!(canonical_key("NotAKey"), None);
    }
}
