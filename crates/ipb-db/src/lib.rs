//! Read/delete access to the ban store (a SQLite file owned by the
//! external ban engine).
//!
//! Every operation opens a fresh short-lived connection, does its work and
//! releases it before returning; nothing is cached across requests. A
//! missing store file is not an error on read paths: [`BanStore::open`]
//! returns `Ok(None)` and the top-level helpers degrade to zero/empty
//! results so a freshly installed system still renders a usable dashboard.

use chrono::{DateTime, Utc};
use futures_util::StreamExt;
use ipb_schemas::{BanStats, IpAddressEntry, PagedResult};
use sqlx::{sqlite::SqliteConnectOptions, Connection, SqliteConnection};
use std::path::Path;

pub mod page;

pub use page::{PageRequest, MAX_PAGE_SIZE, MIN_PAGE_SIZE};

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors produced by store access.
///
/// "Store file absent" is deliberately NOT a variant; that outcome is
/// `Ok(None)` from [`BanStore::open`]. These variants are genuine failures
/// that must surface to the caller with the underlying message.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("store io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("store query failed: {0}")]
    Sqlite(#[from] sqlx::Error),
    #[error("store row for '{ip}': timestamp {millis} out of range")]
    InvalidTimestamp { ip: String, millis: i64 },
}

// ---------------------------------------------------------------------------
// BanStore handle
// ---------------------------------------------------------------------------

/// A short-lived handle on the ban store.
///
/// One handle per request: open, scan/delete, [`BanStore::close`]. The scan
/// is lazy and non-restartable per handle; open a fresh handle to scan
/// again. Dropping the handle mid-scan releases the connection too, just
/// less politely.
pub struct BanStore {
    conn: SqliteConnection,
}

/// Row shape of the `IPAddresses` table, before timestamp decoding.
type StoreRow = (String, i64, i64, Option<i64>, Option<i64>);

const SCAN_SQL: &str = "\
    select IPAddress, LastFailedLogin, FailedLoginCount, BanStartDate, BanEndDate \
    from IPAddresses";

impl BanStore {
    /// Open the store at `path`.
    ///
    /// Returns `Ok(None)` when no store file exists — callers treat that as
    /// "zero entries", never as a hard error. Connects with
    /// `create_if_missing = false`: this crate must never invent a store
    /// the ban engine did not create.
    pub async fn open(path: &Path) -> Result<Option<Self>, DbError> {
        match std::fs::metadata(path) {
            Ok(_) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(DbError::Io(e)),
        }

        let opts = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(false);
        let conn = SqliteConnection::connect_with(&opts).await?;
        Ok(Some(Self { conn }))
    }

    /// Lazily enumerate every entry in the store, in enumeration (rowid)
    /// order. The stream borrows the handle; drop it before calling
    /// [`BanStore::close`].
    pub fn scan(
        &mut self,
    ) -> impl futures_util::Stream<Item = Result<IpAddressEntry, DbError>> + '_ {
        sqlx::query_as::<_, StoreRow>(SCAN_SQL)
            .fetch(&mut self.conn)
            .map(|row| decode_row(row?))
    }

    /// Delete one entry by IP address. `true` iff a row existed and was
    /// removed; a second delete of the same key returns `false`.
    pub async fn delete(&mut self, ip_address: &str) -> Result<bool, DbError> {
        let result = sqlx::query("delete from IPAddresses where IPAddress = ?")
            .bind(ip_address)
            .execute(&mut self.conn)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Deterministic release of the underlying connection.
    pub async fn close(self) -> Result<(), DbError> {
        self.conn.close().await?;
        Ok(())
    }
}

fn decode_row(row: StoreRow) -> Result<IpAddressEntry, DbError> {
    let (ip_address, last_failed, failed_count, ban_start, ban_end) = row;
    Ok(IpAddressEntry {
        last_failed_login: decode_millis(&ip_address, last_failed)?,
        ban_start_date: ban_start
            .map(|ms| decode_millis(&ip_address, ms))
            .transpose()?,
        ban_end_date: ban_end
            .map(|ms| decode_millis(&ip_address, ms))
            .transpose()?,
        failed_login_count: failed_count,
        ip_address,
    })
}

fn decode_millis(ip: &str, millis: i64) -> Result<DateTime<Utc>, DbError> {
    DateTime::<Utc>::from_timestamp_millis(millis).ok_or(DbError::InvalidTimestamp {
        ip: ip.to_string(),
        millis,
    })
}

// ---------------------------------------------------------------------------
// Snapshot queries (one open/close per call)
// ---------------------------------------------------------------------------

/// Single-pass partition of the full store into banned / not-yet-banned
/// counts. Absent store ⇒ all-zero stats. Iteration order never affects
/// the result.
pub async fn stats(path: &Path) -> Result<BanStats, DbError> {
    let Some(mut store) = BanStore::open(path).await? else {
        return Ok(BanStats::default());
    };

    let mut out = BanStats::default();
    {
        let mut scan = store.scan();
        while let Some(entry) = scan.next().await {
            let entry = entry?;
            out.total_ips += 1;
            if entry.is_banned() {
                out.banned_ips += 1;
            } else {
                out.failed_login_ips += 1;
            }
        }
    }
    store.close().await?;
    Ok(out)
}

/// Banned entries, most recently banned first.
pub async fn banned_page(
    path: &Path,
    req: PageRequest,
) -> Result<PagedResult<IpAddressEntry>, DbError> {
    let req = req.clamped();
    let Some(entries) = collect_filtered(path, |e| e.is_banned()).await? else {
        return Ok(PagedResult::empty(req.page, req.page_size));
    };
    Ok(page::paginate(entries, |e| e.ban_start_date, req))
}

/// Failed-login (not banned) entries, most recent failure first.
pub async fn failed_login_page(
    path: &Path,
    req: PageRequest,
) -> Result<PagedResult<IpAddressEntry>, DbError> {
    let req = req.clamped();
    let Some(entries) = collect_filtered(path, |e| !e.is_banned()).await? else {
        return Ok(PagedResult::empty(req.page, req.page_size));
    };
    Ok(page::paginate(entries, |e| e.last_failed_login, req))
}

/// Delete one entry by key. Absent store or missing row ⇒ `Ok(false)`.
pub async fn delete_ip(path: &Path, ip_address: &str) -> Result<bool, DbError> {
    let Some(mut store) = BanStore::open(path).await? else {
        return Ok(false);
    };
    let removed = store.delete(ip_address).await?;
    store.close().await?;
    Ok(removed)
}

/// Full scan filtered by `keep`, preserving enumeration order.
/// `Ok(None)` when the store file does not exist.
async fn collect_filtered<F>(path: &Path, keep: F) -> Result<Option<Vec<IpAddressEntry>>, DbError>
where
    F: Fn(&IpAddressEntry) -> bool,
{
    let Some(mut store) = BanStore::open(path).await? else {
        return Ok(None);
    };

    let mut entries = Vec::new();
    {
        let mut scan = store.scan();
        while let Some(entry) = scan.next().await {
            let entry = entry?;
            if keep(&entry) {
                entries.push(entry);
            }
        }
    }
    store.close().await?;
    Ok(Some(entries))
}
