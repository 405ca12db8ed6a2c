// Stats over a seeded store: single-pass partition on ban-start presence,
// with the documented three-entry example exercised end to end.

use anyhow::Result;
use ipb_service::{AppContext, PageQuery, ServiceSettings};
use ipb_testkit::{banned, failed, seed_store, ts, SeedEntry};

async fn ctx_with(entries: &[SeedEntry]) -> Result<(tempfile::TempDir, AppContext)> {
    let dir = tempfile::tempdir()?;
    let db = dir.path().join("ipban.sqlite");
    seed_store(&db, entries).await?;
    let settings = ServiceSettings {
        database_path: db,
        config_path: dir.path().join("ipban.config"),
    };
    let ctx = AppContext::new(settings, dir.path())?;
    Ok((dir, ctx))
}

#[tokio::test]
async fn three_entry_example_matches_documented_results() -> Result<()> {
    let (_dir, ctx) = ctx_with(&[
        banned(
            "1.1.1.1",
            ts("2024-01-01T00:00:00Z"),
            ts("2024-01-01T00:00:00Z"),
        ),
        banned(
            "2.2.2.2",
            ts("2024-02-01T00:00:00Z"),
            ts("2024-02-01T00:00:00Z"),
        ),
        failed("3.3.3.3", ts("2024-03-01T00:00:00Z")),
    ])
    .await?;

    let stats = ipb_service::get_stats(&ctx).await?;
    assert_eq!(stats.total_ips, 3);
    assert_eq!(stats.banned_ips, 2);
    assert_eq!(stats.failed_login_ips, 1);

    // Most recently banned first.
    let page = ipb_service::get_banned(
        &ctx,
        PageQuery {
            page: 1,
            page_size: 10,
        },
    )
    .await?;
    let ips: Vec<&str> = page.items.iter().map(|e| e.ip_address.as_str()).collect();
    assert_eq!(ips, vec!["2.2.2.2", "1.1.1.1"]);
    assert_eq!(page.total, 2);

    let page = ipb_service::get_failed(
        &ctx,
        PageQuery {
            page: 1,
            page_size: 10,
        },
    )
    .await?;
    let ips: Vec<&str> = page.items.iter().map(|e| e.ip_address.as_str()).collect();
    assert_eq!(ips, vec!["3.3.3.3"]);
    assert_eq!(page.total, 1);

    Ok(())
}

#[tokio::test]
async fn total_is_always_banned_plus_failed() -> Result<()> {
    // Mixed seed: 13 banned, 7 failed, interleaved.
    let base = ts("2024-05-01T00:00:00Z");
    let mut entries = Vec::new();
    for i in 0..20i64 {
        let when = base + chrono::Duration::minutes(i);
        let ip = format!("10.0.0.{i}");
        entries.push(if i % 3 == 0 {
            failed(&ip, when)
        } else {
            banned(&ip, when, when)
        });
    }
    let (_dir, ctx) = ctx_with(&entries).await?;

    let stats = ipb_service::get_stats(&ctx).await?;
    assert_eq!(stats.total_ips, 20);
    assert_eq!(stats.banned_ips, 13);
    assert_eq!(stats.failed_login_ips, 7);
    assert_eq!(stats.total_ips, stats.banned_ips + stats.failed_login_ips);

    Ok(())
}
