use std::sync::Arc;

use chrono::Utc;
use chrono_tz::Tz;
use serde::Serialize;
use tracing::{info, warn};

use marquee_feed::{normalize_document, parse_document};

use crate::builder::build_candidates;
use crate::config::{FeedConfig, ReconcileRules};
use crate::error::SyncError;
use crate::fetch::FeedSource;
use crate::guard::SyncGuard;
use crate::records::{CandidateRecord, PersistedRecord, SourceFieldUpdate};
use crate::store::BookingStore;

const WRITE_BATCH_SIZE: usize = 50;

/// Phases of one run; failures always return the engine to idle, ready for
/// the next manual trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunPhase {
    Idle,
    Fetching,
    Parsing,
    Diffing,
    Writing,
    Failed,
}

impl RunPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunPhase::Idle => "idle",
            RunPhase::Fetching => "fetching",
            RunPhase::Parsing => "parsing",
            RunPhase::Diffing => "diffing",
            RunPhase::Writing => "writing",
            RunPhase::Failed => "failed",
        }
    }
}

/// Outcome summary of one sync run. Row-level problems land in `errors`;
/// only systemic failures abort the run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SyncReport {
    pub inserted: usize,
    pub updated: usize,
    pub skipped: usize,
    pub errors: Vec<String>,
    pub unrecognized_entities: Vec<String>,
    pub warnings: Vec<String>,
}

impl SyncReport {
    /// The empty result returned for guard rejections and missing
    /// configuration.
    pub fn no_op() -> Self {
        Self::default()
    }
}

pub struct SyncEngine {
    source: Option<Arc<dyn FeedSource>>,
    store: Arc<dyn BookingStore>,
    guard: SyncGuard,
    rules: ReconcileRules,
    timezone: Tz,
}

impl SyncEngine {
    pub fn new(
        source: Option<Arc<dyn FeedSource>>,
        store: Arc<dyn BookingStore>,
        config: &FeedConfig,
    ) -> Self {
        if source.is_none() {
            warn!("no feed URL configured; sync() will be a no-op");
        }
        Self {
            source,
            store,
            guard: SyncGuard::new(config.cooldown),
            rules: config.rules.clone(),
            timezone: config.timezone,
        }
    }

    /// Runs one reconciliation pass: fetch, parse, diff against the store,
    /// and apply field-protected upserts. Safe to trigger at any time;
    /// overlapping or too-frequent triggers collapse into a no-op result.
    pub async fn sync(&self) -> Result<SyncReport, SyncError> {
        let Some(_permit) = self.guard.try_acquire() else {
            return Ok(SyncReport::no_op());
        };
        let Some(source) = self.source.as_ref() else {
            warn!("sync triggered without a configured feed URL");
            return Ok(SyncReport::no_op());
        };

        info!(phase = RunPhase::Fetching.as_str(), "sync run started");
        let text = match source.fetch_text().await {
            Ok(text) => text,
            Err(err) => {
                warn!(phase = RunPhase::Failed.as_str(), error = %err, "fetch failed");
                return Err(err.into());
            }
        };

        info!(phase = RunPhase::Parsing.as_str(), bytes = text.len(), "document fetched");
        let mut report = SyncReport::default();

        let rows = parse_document(&text).map_err(|err| {
            warn!(phase = RunPhase::Failed.as_str(), error = %err, "payload rejected");
            SyncError::from(err)
        })?;

        let Some(sheet) = normalize_document(&rows) else {
            // Layout drift, not an outage: report it loudly but succeed.
            warn!("no recognizable header row; treating document as empty");
            report
                .warnings
                .push("no recognizable header row found in source document".to_string());
            return Ok(report);
        };
        report.skipped = sheet.skipped_rows;

        let today = Utc::now().with_timezone(&self.timezone).date_naive();
        let batch = build_candidates(&sheet, &self.rules, today);
        report.unrecognized_entities = batch.unrecognized.clone();

        if batch.candidates.is_empty() {
            if !rows.is_empty() {
                warn!("document parsed but yielded zero candidates");
                report
                    .warnings
                    .push("source document yielded no candidate records".to_string());
            }
            return Ok(report);
        }

        info!(
            phase = RunPhase::Diffing.as_str(),
            candidates = batch.candidates.len(),
            deduped = batch.deduped,
            "candidates built"
        );

        let keys: Vec<String> = batch
            .candidates
            .iter()
            .map(|c| c.sync_key.clone())
            .collect();
        let existing = self.store.select_by_keys(&keys).await?;
        let by_key: std::collections::HashMap<&str, &PersistedRecord> = existing
            .iter()
            .filter_map(|rec| rec.sync_key.as_deref().map(|key| (key, rec)))
            .collect();

        let mut to_insert: Vec<&CandidateRecord> = Vec::new();
        let mut to_update: Vec<(&CandidateRecord, &PersistedRecord)> = Vec::new();
        for candidate in &batch.candidates {
            match by_key.get(candidate.sync_key.as_str()) {
                Some(&existing) => to_update.push((candidate, existing)),
                None => to_insert.push(candidate),
            }
        }

        info!(
            phase = RunPhase::Writing.as_str(),
            inserts = to_insert.len(),
            updates = to_update.len(),
            "applying writes"
        );

        for chunk in to_insert.chunks(WRITE_BATCH_SIZE) {
            let records: Vec<CandidateRecord> = chunk.iter().map(|c| (*c).clone()).collect();
            let outcomes = self.store.insert_many(&records).await?;
            for outcome in outcomes {
                match outcome.error {
                    Some(error) => report
                        .errors
                        .push(format!("insert {}: {}", outcome.sync_key, error)),
                    None => report.inserted += 1,
                }
            }
        }

        for (candidate, existing) in to_update {
            let update = SourceFieldUpdate::from_candidate(candidate, existing.amount_override);
            match self.store.update_partial(existing.id, &update).await {
                Ok(()) => report.updated += 1,
                Err(err) => {
                    warn!(sync_key = %candidate.sync_key, error = %err, "update rejected");
                    report
                        .errors
                        .push(format!("update {}: {}", candidate.sync_key, err));
                }
            }
        }

        info!(
            phase = RunPhase::Idle.as_str(),
            inserted = report.inserted,
            updated = report.updated,
            skipped = report.skipped,
            errors = report.errors.len(),
            "sync run finished"
        );
        Ok(report)
    }
}
