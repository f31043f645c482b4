use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;
use tracing::debug;

use marquee_feed::{NormalizedRow, NormalizedSheet};

use crate::classify::{classify_event, classify_participant, classify_payer, compute_amount_minor};
use crate::config::ReconcileRules;
use crate::records::{CandidateRecord, ParticipantType, PaymentStatus, PayerBucket, SourceStatus};

/// All candidates derived from one parse pass, plus the bookkeeping the
/// engine folds into its report.
#[derive(Debug, Default)]
pub struct BuiltBatch {
    pub candidates: Vec<CandidateRecord>,
    /// Distinct participant names absent from the roster, sorted.
    pub unrecognized: Vec<String>,
    /// Candidates collapsed by sync-key dedup.
    pub deduped: usize,
}

/// Deterministic merge key: normalized date, truncated event slug,
/// participant, and start minute. Stable across repeated parses of the same
/// logical row; collides only for true duplicates.
pub fn make_sync_key(
    date: NaiveDate,
    event: Option<&str>,
    participant: &str,
    start_minute: Option<u32>,
) -> String {
    let slug: String = event
        .unwrap_or("")
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .take(16)
        .collect();
    let start = start_minute.map(|m| m.to_string()).unwrap_or_default();
    format!(
        "{}|{}|{}|{}",
        date.format("%Y-%m-%d"),
        slug,
        participant.trim().to_lowercase(),
        start
    )
}

fn build_one(
    row: &NormalizedRow,
    slot_name: &str,
    slot_range: Option<marquee_feed::TimeRange>,
    rules: &ReconcileRules,
    today: NaiveDate,
) -> CandidateRecord {
    let event_text = row.event.as_deref().unwrap_or("");
    let sync_key = make_sync_key(
        row.date,
        row.event.as_deref(),
        slot_name,
        slot_range.map(|r| r.start_minute()),
    );
    let source_status = SourceStatus::for_date(row.date, today);

    // The known-exception rule outranks classification entirely: a flagged
    // name is the proprietor, not a paid contractor, whatever the event text
    // would otherwise imply.
    if rules.is_flagged(slot_name) {
        return CandidateRecord {
            date: row.date,
            event_name: row.event.clone(),
            participant: slot_name.to_string(),
            category: classify_event(event_text),
            payer_bucket: PayerBucket::House,
            participant_type: ParticipantType::Owner,
            time_range: slot_range,
            amount_minor: Some(0),
            sync_key,
            source_status,
            initial_payment_status: PaymentStatus::NotApplicable,
        };
    }

    let category = classify_event(event_text);
    let amount_minor = slot_range
        .map(|range| compute_amount_minor(range.duration_minutes(), rules.base_rate_minor, category));

    CandidateRecord {
        date: row.date,
        event_name: row.event.clone(),
        participant: slot_name.to_string(),
        category,
        payer_bucket: classify_payer(event_text),
        participant_type: classify_participant(slot_name),
        time_range: slot_range,
        amount_minor,
        sync_key,
        source_status,
        initial_payment_status: PaymentStatus::Unpaid,
    }
}

/// Fans each normalized row out into one candidate per occupied slot, then
/// collapses the batch by sync key keeping the last occurrence (later rows
/// in file order are corrections).
pub fn build_candidates(
    sheet: &NormalizedSheet,
    rules: &ReconcileRules,
    today: NaiveDate,
) -> BuiltBatch {
    let mut batch = BuiltBatch::default();
    let mut unrecognized: HashSet<String> = HashSet::new();
    let mut by_key: HashMap<String, usize> = HashMap::new();

    for row in &sheet.rows {
        for slot in &row.slots {
            let candidate = build_one(row, &slot.name, slot.range, rules, today);

            if !rules.is_flagged(&slot.name) && !rules.in_roster(&slot.name) {
                unrecognized.insert(slot.name.trim().to_string());
            }

            match by_key.get(&candidate.sync_key) {
                Some(&index) => {
                    debug!(
                        sync_key = %candidate.sync_key,
                        line = row.source_line,
                        "duplicate source row, keeping later occurrence"
                    );
                    batch.candidates[index] = candidate;
                    batch.deduped += 1;
                }
                None => {
                    by_key.insert(candidate.sync_key.clone(), batch.candidates.len());
                    batch.candidates.push(candidate);
                }
            }
        }
    }

    batch.unrecognized = unrecognized.into_iter().collect();
    batch.unrecognized.sort();
    batch
}
