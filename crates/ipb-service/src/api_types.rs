//! Request types for the admin operations.
//!
//! `Serialize + Deserialize` so any transport binding can decode them.
//! Response shapes come from `ipb-schemas` (entries, stats, pages) or are
//! plain maps/strings; no business logic lives here.

use serde::{Deserialize, Serialize};

/// Pagination parameters as received from the caller, pre-clamp.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PageQuery {
    /// 1-based; values below 1 are served as page 1.
    pub page: i64,
    /// Served sizes are clamped to [10, 200].
    pub page_size: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnbanRequest {
    pub ip_address: String,
}
