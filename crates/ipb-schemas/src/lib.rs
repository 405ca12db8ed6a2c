//! Shared model types for the IPBan admin core.
//!
//! These types are `Serialize + Deserialize` so any transport binding can
//! encode them. No business logic lives here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One record from the ban store, keyed by IP address.
///
/// Entries are created and updated by the external ban engine; this
/// workspace reads and deletes them, never writes them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpAddressEntry {
    /// Unique key within the store.
    pub ip_address: String,
    /// Present ⇔ the address is currently banned.
    pub ban_start_date: Option<DateTime<Utc>>,
    /// Scheduled end of the ban, if the engine recorded one.
    pub ban_end_date: Option<DateTime<Utc>>,
    /// Most recent failed login; defined for banned entries too.
    pub last_failed_login: DateTime<Utc>,
    pub failed_login_count: i64,
}

impl IpAddressEntry {
    /// Partition predicate used by stats and pagination.
    pub fn is_banned(&self) -> bool {
        self.ban_start_date.is_some()
    }
}

/// Dashboard statistics for one snapshot of the store.
///
/// Invariant: `total_ips == banned_ips + failed_login_ips`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BanStats {
    pub total_ips: i64,
    /// Entries with a ban start date.
    pub banned_ips: i64,
    /// Entries with failed-login history but no ban yet.
    pub failed_login_ips: i64,
}

/// One page of an ordered, filtered subset of the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PagedResult<T> {
    /// At most `page_size` items.
    pub items: Vec<T>,
    /// Count of the full filtered subset, not of this page.
    pub total: i64,
    /// 1-based page number as served (after clamping).
    pub page: i64,
    pub page_size: i64,
}

impl<T> PagedResult<T> {
    /// An empty page echoing the (clamped) request, used when the store
    /// does not exist. Not an error.
    pub fn empty(page: i64, page_size: i64) -> Self {
        Self {
            items: Vec::new(),
            total: 0,
            page,
            page_size,
        }
    }
}
