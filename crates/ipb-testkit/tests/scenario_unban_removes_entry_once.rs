// Unban semantics: delete-by-key is idempotent ((true, false) on repeat),
// the service surfaces the repeat as NotFound, and stats reflect the
// removal on the next snapshot.

use anyhow::Result;
use ipb_service::{AppContext, ServiceError, ServiceSettings, UnbanRequest};
use ipb_testkit::{banned, failed, seed_store, ts};
use std::path::PathBuf;

async fn seeded() -> Result<(tempfile::TempDir, PathBuf, AppContext)> {
    let dir = tempfile::tempdir()?;
    let db = dir.path().join("ipban.sqlite");
    seed_store(
        &db,
        &[
            banned(
                "1.1.1.1",
                ts("2024-01-01T00:00:00Z"),
                ts("2024-01-01T00:00:00Z"),
            ),
            failed("3.3.3.3", ts("2024-03-01T00:00:00Z")),
        ],
    )
    .await?;
    let settings = ServiceSettings {
        database_path: db.clone(),
        config_path: dir.path().join("ipban.config"),
    };
    let ctx = AppContext::new(settings, dir.path())?;
    Ok((dir, db, ctx))
}

#[tokio::test]
async fn delete_twice_yields_true_then_false() -> Result<()> {
    let (_dir, db, _ctx) = seeded().await?;

    assert!(ipb_db::delete_ip(&db, "1.1.1.1").await?);
    assert!(!ipb_db::delete_ip(&db, "1.1.1.1").await?);

    Ok(())
}

#[tokio::test]
async fn service_unban_then_repeat_is_not_found() -> Result<()> {
    let (_dir, _db, ctx) = seeded().await?;

    let req = UnbanRequest {
        ip_address: "3.3.3.3".to_string(),
    };
    ipb_service::unban(&ctx, req.clone()).await?;

    let err = ipb_service::unban(&ctx, req).await.unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));

    // The snapshot after removal no longer counts the entry.
    let stats = ipb_service::get_stats(&ctx).await?;
    assert_eq!(stats.total_ips, 1);
    assert_eq!(stats.failed_login_ips, 0);
    assert_eq!(stats.banned_ips, 1);

    Ok(())
}

#[tokio::test]
async fn unban_unknown_ip_is_not_found_without_side_effects() -> Result<()> {
    let (_dir, _db, ctx) = seeded().await?;

    let err = ipb_service::unban(
        &ctx,
        UnbanRequest {
            ip_address: "9.9.9.9".to_string(),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));

    let stats = ipb_service::get_stats(&ctx).await?;
    assert_eq!(stats.total_ips, 2);

    Ok(())
}
