//! Transport-agnostic admin operations over the ban store and config
//! document.
//!
//! One function per operation; the embedding transport maps its requests
//! onto these and encodes the results. Every call opens what it needs,
//! computes, and releases before returning — no state is retained across
//! requests. Read paths degrade to empty/zero results when the underlying
//! resource is absent; write paths validate first and leave prior state
//! untouched on failure.

use std::collections::BTreeMap;

use ipb_config::ConfigError;
use ipb_db::{DbError, PageRequest};
use ipb_schemas::{BanStats, IpAddressEntry, PagedResult};
use tracing::{debug, info};

pub mod api_types;
mod context;

pub use api_types::{PageQuery, UnbanRequest};
pub use context::{AppContext, ServiceSettings};

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Operation outcome taxonomy, mapped onto whatever status scheme the
/// transport uses.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// A write needed a resource that does not exist (e.g. selective
    /// settings write with no document), or an unban targeted an unknown
    /// address. Never produced by read paths for absent resources.
    #[error("not found: {0}")]
    NotFound(String),
    /// The caller's payload was rejected before anything was persisted.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// Underlying storage failure, surfaced with its message. Not retried
    /// here; retry policy belongs to the external store.
    #[error(transparent)]
    Db(#[from] DbError),
    /// Underlying document I/O failure.
    #[error(transparent)]
    Config(ConfigError),
}

impl From<ConfigError> for ServiceError {
    fn from(e: ConfigError) -> Self {
        match e {
            ConfigError::NotFound(path) => {
                ServiceError::NotFound(format!("config document {}", path.display()))
            }
            ConfigError::Malformed(msg) => {
                ServiceError::InvalidInput(format!("malformed config document: {msg}"))
            }
            other => ServiceError::Config(other),
        }
    }
}

// ---------------------------------------------------------------------------
// Dataset operations
// ---------------------------------------------------------------------------

/// Dashboard statistics. Zero-filled when the store does not exist.
pub async fn get_stats(ctx: &AppContext) -> Result<BanStats, ServiceError> {
    let stats = ipb_db::stats(&ctx.settings().database_path).await?;
    debug!(
        total = stats.total_ips,
        banned = stats.banned_ips,
        failed = stats.failed_login_ips,
        "stats"
    );
    Ok(stats)
}

/// Banned entries, most recently banned first.
pub async fn get_banned(
    ctx: &AppContext,
    query: PageQuery,
) -> Result<PagedResult<IpAddressEntry>, ServiceError> {
    let req = PageRequest::new(query.page, query.page_size);
    Ok(ipb_db::banned_page(&ctx.settings().database_path, req).await?)
}

/// Failed-login (not banned) entries, most recent failure first.
pub async fn get_failed(
    ctx: &AppContext,
    query: PageQuery,
) -> Result<PagedResult<IpAddressEntry>, ServiceError> {
    let req = PageRequest::new(query.page, query.page_size);
    Ok(ipb_db::failed_login_page(&ctx.settings().database_path, req).await?)
}

/// Remove one entry from the store. `NotFound` covers both "no such
/// entry" and "no store at all"; a repeat unban of the same address is
/// therefore `NotFound` too.
pub async fn unban(ctx: &AppContext, req: UnbanRequest) -> Result<(), ServiceError> {
    if req.ip_address.trim().is_empty() {
        return Err(ServiceError::InvalidInput(
            "ip address is required".to_string(),
        ));
    }

    let removed = ipb_db::delete_ip(&ctx.settings().database_path, &req.ip_address).await?;
    if removed {
        info!(ip = %req.ip_address, "unban");
        Ok(())
    } else {
        Err(ServiceError::NotFound(format!(
            "ip address '{}' not in store",
            req.ip_address
        )))
    }
}

// ---------------------------------------------------------------------------
// Config document operations
// ---------------------------------------------------------------------------

/// The full document text; empty string when none exists yet.
pub fn get_config_raw(ctx: &AppContext) -> Result<String, ServiceError> {
    Ok(ctx.editor().read_raw()?)
}

/// Replace the whole document after well-formedness validation.
pub fn set_config_raw(ctx: &AppContext, text: &str) -> Result<(), ServiceError> {
    ctx.editor().write_raw(text)?;
    info!(bytes = text.len(), "config document replaced");
    Ok(())
}

/// Allow-listed settings present in the document; empty when absent.
pub fn get_quick_settings(ctx: &AppContext) -> Result<BTreeMap<String, String>, ServiceError> {
    Ok(ctx.editor().read_quick_settings()?)
}

/// Update allow-listed, pre-existing settings in place. Unknown keys are
/// ignored; an empty update map is rejected; a missing document is
/// `NotFound` (there is nothing to update).
pub fn set_quick_settings(
    ctx: &AppContext,
    updates: &BTreeMap<String, String>,
) -> Result<(), ServiceError> {
    if updates.is_empty() {
        return Err(ServiceError::InvalidInput(
            "no settings provided".to_string(),
        ));
    }

    ctx.editor().write_quick_settings(updates)?;
    info!(keys = updates.len(), "quick settings updated");
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests (degrade paths that need no seeded store)
// ---------------------------------------------------------------------------
