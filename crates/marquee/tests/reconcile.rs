use std::env;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use sqlx::Row;
use tokio::runtime::Runtime;

use marquee_core::config::{FeedConfig, ReconcileRules};
use marquee_core::db;
use marquee_core::engine::SyncEngine;
use marquee_core::fetch::{FeedSource, FetchError};
use marquee_core::store::PgBookingStore;

struct StaticSource {
    body: &'static str,
}

#[async_trait]
impl FeedSource for StaticSource {
    async fn fetch_text(&self) -> Result<String, FetchError> {
        Ok(self.body.to_string())
    }
}

const FEED: &str = "\
Marquee export\n\
date,event,dj_1,dj_2\n\
16.08.2026,Tet Countdown,DJ Amor 21:30 - 23:00,DJ Sample 23:00 - 01;00\n\
17.08.2026,Friday,DJ Mekong 22:00 - 02:00,\n";

fn test_config() -> FeedConfig {
    FeedConfig {
        source_url: Some("static://feed".to_string()),
        fetch_timeout: Duration::from_secs(5),
        cooldown: Duration::ZERO,
        timezone: chrono_tz::Asia::Ho_Chi_Minh,
        rules: ReconcileRules::new(
            1_000_000,
            vec!["Anh Tuan".into()],
            vec!["DJ Amor".into(), "DJ Sample".into(), "DJ Mekong".into()],
        ),
    }
}

#[test]
fn reconcile_roundtrip_against_postgres() -> Result<()> {
    let database_url = match env::var("MARQUEE_TEST_DATABASE_URL") {
        Ok(url) => url,
        Err(_) => {
            eprintln!(
                "Skipping reconcile integration test because MARQUEE_TEST_DATABASE_URL is not set"
            );
            return Ok(());
        }
    };

    let rt = Runtime::new()?;
    rt.block_on(async move {
        let pool = db::connect(&database_url).await?;
        db::run_migrations(&pool).await?;
        sqlx::query("TRUNCATE TABLE bookings").execute(&pool).await?;

        let engine = SyncEngine::new(
            Some(Arc::new(StaticSource { body: FEED })),
            Arc::new(PgBookingStore::new(pool.clone())),
            &test_config(),
        );

        let first = engine.sync().await?;
        assert_eq!(first.inserted, 3);
        assert_eq!(first.updated, 0);
        assert!(first.errors.is_empty());

        // Operator edits: mark one booking paid and pin its amount.
        let key = "2026-08-16|tetcountdown|dj amor|1290";
        sqlx::query(
            "UPDATE bookings SET payment_status = 'paid', amount_minor = 999, amount_override = TRUE WHERE sync_key = $1",
        )
        .bind(key)
        .execute(&pool)
        .await?;

        let second = engine.sync().await?;
        assert_eq!(second.inserted, 0);
        assert_eq!(second.updated, 3);
        assert!(second.errors.is_empty());

        let row = sqlx::query(
            "SELECT payment_status, amount_minor, amount_override, duration_minutes, synced_from_source FROM bookings WHERE sync_key = $1",
        )
        .bind(key)
        .fetch_one(&pool)
        .await?;

        let payment_status: String = row.try_get("payment_status")?;
        let amount_minor: Option<i64> = row.try_get("amount_minor")?;
        let amount_override: bool = row.try_get("amount_override")?;
        let duration_minutes: Option<i32> = row.try_get("duration_minutes")?;
        let synced_from_source: bool = row.try_get("synced_from_source")?;

        assert_eq!(payment_status, "paid");
        assert_eq!(amount_minor, Some(999));
        assert!(amount_override);
        assert_eq!(duration_minutes, Some(90));
        assert!(synced_from_source);

        Ok(())
    })
}
