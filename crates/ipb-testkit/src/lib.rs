//! Fixture builders for the scenario tests under `tests/`.
//!
//! The ban store is normally written by the external ban engine; these
//! helpers stand in for it, creating a SQLite file with the engine's
//! schema and a deterministic set of rows. Insertion order is enumeration
//! order (rowid), which is what the pagination tie-break is defined over.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{sqlite::SqliteConnectOptions, Connection, SqliteConnection};
use std::path::Path;

/// One row to seed into a fixture store.
#[derive(Debug, Clone)]
pub struct SeedEntry {
    pub ip: String,
    pub ban_start: Option<DateTime<Utc>>,
    pub last_failed: DateTime<Utc>,
    pub failed_count: i64,
}

/// A banned entry (ban start present).
pub fn banned(ip: &str, ban_start: DateTime<Utc>, last_failed: DateTime<Utc>) -> SeedEntry {
    SeedEntry {
        ip: ip.to_string(),
        ban_start: Some(ban_start),
        last_failed,
        failed_count: 5,
    }
}

/// A failed-login entry that has not been banned yet.
pub fn failed(ip: &str, last_failed: DateTime<Utc>) -> SeedEntry {
    SeedEntry {
        ip: ip.to_string(),
        ban_start: None,
        last_failed,
        failed_count: 2,
    }
}

/// Parse an RFC 3339 timestamp fixture literal.
pub fn ts(s: &str) -> DateTime<Utc> {
    s.parse().expect("fixture timestamp must be RFC 3339")
}

const CREATE_SQL: &str = "\
    create table if not exists IPAddresses (\
        IPAddress        text primary key not null,\
        LastFailedLogin  integer not null,\
        FailedLoginCount integer not null default 0,\
        BanStartDate     integer null,\
        BanEndDate       integer null\
    )";

/// Create a store file at `path` with the engine's schema and insert
/// `entries` in order.
pub async fn seed_store(path: &Path, entries: &[SeedEntry]) -> Result<()> {
    let opts = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true);
    let mut conn = SqliteConnection::connect_with(&opts)
        .await
        .with_context(|| format!("create fixture store: {}", path.display()))?;

    sqlx::query(CREATE_SQL)
        .execute(&mut conn)
        .await
        .context("create IPAddresses table")?;

    for entry in entries {
        sqlx::query(
            "insert into IPAddresses \
             (IPAddress, LastFailedLogin, FailedLoginCount, BanStartDate, BanEndDate) \
             values (?, ?, ?, ?, ?)",
        )
        .bind(&entry.ip)
        .bind(entry.last_failed.timestamp_millis())
        .bind(entry.failed_count)
        .bind(entry.ban_start.map(|d| d.timestamp_millis()))
        .bind(Option::<i64>::None)
        .execute(&mut conn)
        .await
        .with_context(|| format!("insert fixture row for {}", entry.ip))?;
    }

    conn.close().await.context("close fixture store")?;
    Ok(())
}

/// A config document with the shape the ban engine's loader expects:
/// an `<appSettings>` section of `<add key value/>` nodes, some on the
/// quick-settings allow-list and some not.
pub fn sample_config() -> &'static str {
    r#"<?xml version="1.0"?>
<configuration>
  <!-- managed by the ban engine; edit with care -->
  <appSettings>
    <add key="FailedLoginAttemptsBeforeBan" value="5"/>
    <add key="BanTime" value="01:00:00"/>
    <add key="Whitelist" value=""/>
    <add key="FirewallRulePrefix" value="IPBan_"/>
    <add key="InternalOnlySetting" value="do-not-touch"/>
  </appSettings>
  <logging level="info"/>
</configuration>
"#
}
