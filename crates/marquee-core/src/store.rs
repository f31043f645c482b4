use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::FromRow;
use thiserror::Error;
use tracing::warn;
use uuid::Uuid;

use crate::db::DbPool;
use crate::records::{
    AmountPatch, CandidateRecord, EventKind, ParticipantType, PaymentStatus, PayerBucket,
    PersistedRecord, SourceFieldUpdate, SourceStatus,
};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database query failed: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("corrupt row {id}: {message}")]
    Corrupt { id: Uuid, message: String },
}

/// Per-item result of a bulk insert. A failed item never aborts the rest of
/// the batch.
#[derive(Debug, Clone)]
pub struct InsertOutcome {
    pub sync_key: String,
    pub error: Option<String>,
}

/// The three datastore operations the reconciliation engine consumes. No
/// transactions and no joins; field protection, not locking, is what keeps
/// operator edits safe.
#[async_trait]
pub trait BookingStore: Send + Sync {
    async fn select_by_keys(&self, keys: &[String]) -> Result<Vec<PersistedRecord>, StoreError>;

    async fn insert_many(
        &self,
        records: &[CandidateRecord],
    ) -> Result<Vec<InsertOutcome>, StoreError>;

    async fn update_partial(
        &self,
        id: Uuid,
        update: &SourceFieldUpdate,
    ) -> Result<(), StoreError>;
}

pub struct PgBookingStore {
    pool: DbPool,
}

impl PgBookingStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

/// Raw row shape; enum columns come back as text and are parsed on the way
/// out so a corrupt row is reported with its id instead of poisoning the
/// whole select.
#[derive(Debug, FromRow)]
struct BookingRow {
    id: Uuid,
    sync_key: Option<String>,
    booking_date: NaiveDate,
    event_name: Option<String>,
    participant: String,
    category: String,
    payer_bucket: String,
    participant_type: String,
    start_minute: Option<i32>,
    end_minute: Option<i32>,
    duration_minutes: Option<i32>,
    amount_minor: Option<i64>,
    source_status: String,
    payment_status: String,
    amount_override: bool,
    receipt_uploaded: bool,
    notes: Option<String>,
    synced_from_source: bool,
}

impl TryFrom<BookingRow> for PersistedRecord {
    type Error = StoreError;

    fn try_from(row: BookingRow) -> Result<Self, StoreError> {
        let id = row.id;
        let corrupt = move |message: String| StoreError::Corrupt { id, message };
        Ok(PersistedRecord {
            id: row.id,
            sync_key: row.sync_key,
            booking_date: row.booking_date,
            event_name: row.event_name,
            participant: row.participant,
            category: EventKind::parse(&row.category).map_err(&corrupt)?,
            payer_bucket: PayerBucket::parse(&row.payer_bucket).map_err(&corrupt)?,
            participant_type: ParticipantType::parse(&row.participant_type).map_err(&corrupt)?,
            start_minute: row.start_minute,
            end_minute: row.end_minute,
            duration_minutes: row.duration_minutes,
            amount_minor: row.amount_minor,
            source_status: SourceStatus::parse(&row.source_status).map_err(&corrupt)?,
            payment_status: PaymentStatus::parse(&row.payment_status).map_err(&corrupt)?,
            amount_override: row.amount_override,
            receipt_uploaded: row.receipt_uploaded,
            notes: row.notes,
            synced_from_source: row.synced_from_source,
        })
    }
}

const SELECT_COLUMNS: &str = "id, sync_key, booking_date, event_name, participant, category, \
     payer_bucket, participant_type, start_minute, end_minute, duration_minutes, amount_minor, \
     source_status, payment_status, amount_override, receipt_uploaded, notes, synced_from_source";

#[async_trait]
impl BookingStore for PgBookingStore {
    async fn select_by_keys(&self, keys: &[String]) -> Result<Vec<PersistedRecord>, StoreError> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!("SELECT {SELECT_COLUMNS} FROM bookings WHERE sync_key = ANY($1)");
        let rows: Vec<BookingRow> = sqlx::query_as(&sql)
            .bind(keys)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(PersistedRecord::try_from).collect()
    }

    async fn insert_many(
        &self,
        records: &[CandidateRecord],
    ) -> Result<Vec<InsertOutcome>, StoreError> {
        let mut outcomes = Vec::with_capacity(records.len());
        for record in records {
            let result = sqlx::query(
                r#"
                    INSERT INTO bookings (
                        sync_key, booking_date, event_name, participant, category,
                        payer_bucket, participant_type, start_minute, end_minute,
                        duration_minutes, amount_minor, source_status, payment_status,
                        synced_from_source
                    )
                    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, TRUE)
                "#,
            )
            .bind(&record.sync_key)
            .bind(record.date)
            .bind(&record.event_name)
            .bind(&record.participant)
            .bind(record.category.as_str())
            .bind(record.payer_bucket.as_str())
            .bind(record.participant_type.as_str())
            .bind(record.time_range.map(|r| r.start_minute() as i32))
            .bind(record.time_range.map(|r| r.end_minute() as i32))
            .bind(record.duration_minutes().map(|m| m as i32))
            .bind(record.amount_minor)
            .bind(record.source_status.as_str())
            .bind(record.initial_payment_status.as_str())
            .execute(&self.pool)
            .await;

            let error = match result {
                Ok(_) => None,
                Err(err) => {
                    warn!(sync_key = %record.sync_key, error = %err, "insert rejected");
                    Some(err.to_string())
                }
            };
            outcomes.push(InsertOutcome {
                sync_key: record.sync_key.clone(),
                error,
            });
        }
        Ok(outcomes)
    }

    async fn update_partial(
        &self,
        id: Uuid,
        update: &SourceFieldUpdate,
    ) -> Result<(), StoreError> {
        // Two statements rather than one dynamic query: the protected form
        // must not name amount_minor at all. Neither form names
        // payment_status or any other operator-owned column.
        match update.amount {
            AmountPatch::Recompute(amount_minor) => {
                sqlx::query(
                    r#"
                        UPDATE bookings
                        SET booking_date = $1, event_name = $2, category = $3,
                            payer_bucket = $4, participant_type = $5, start_minute = $6,
                            end_minute = $7, duration_minutes = $8, source_status = $9,
                            amount_minor = $10, updated_at = now()
                        WHERE id = $11
                    "#,
                )
                .bind(update.booking_date)
                .bind(&update.event_name)
                .bind(update.category.as_str())
                .bind(update.payer_bucket.as_str())
                .bind(update.participant_type.as_str())
                .bind(update.start_minute)
                .bind(update.end_minute)
                .bind(update.duration_minutes)
                .bind(update.source_status.as_str())
                .bind(amount_minor)
                .bind(id)
                .execute(&self.pool)
                .await?;
            }
            AmountPatch::Protected => {
                sqlx::query(
                    r#"
                        UPDATE bookings
                        SET booking_date = $1, event_name = $2, category = $3,
                            payer_bucket = $4, participant_type = $5, start_minute = $6,
                            end_minute = $7, duration_minutes = $8, source_status = $9,
                            updated_at = now()
                        WHERE id = $10
                    "#,
                )
                .bind(update.booking_date)
                .bind(&update.event_name)
                .bind(update.category.as_str())
                .bind(update.payer_bucket.as_str())
                .bind(update.participant_type.as_str())
                .bind(update.start_minute)
                .bind(update.end_minute)
                .bind(update.duration_minutes)
                .bind(update.source_status.as_str())
                .bind(id)
                .execute(&self.pool)
                .await?;
            }
        }
        Ok(())
    }
}
