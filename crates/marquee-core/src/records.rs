use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use marquee_feed::TimeRange;

/// Event classification driving the rate multiplier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Tet,
    PublicHoliday,
    Private,
    Regular,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Tet => "tet",
            EventKind::PublicHoliday => "public_holiday",
            EventKind::Private => "private",
            EventKind::Regular => "regular",
        }
    }

    pub fn parse(s: &str) -> Result<Self, String> {
        match s {
            "tet" => Ok(EventKind::Tet),
            "public_holiday" => Ok(EventKind::PublicHoliday),
            "private" => Ok(EventKind::Private),
            "regular" => Ok(EventKind::Regular),
            other => Err(format!("unknown event kind '{other}'")),
        }
    }

    /// Rate multiplier as an exact rational `(numerator, denominator)`, so
    /// monetary math stays in integers and rounds exactly once.
    pub fn multiplier(&self) -> (i64, i64) {
        match self {
            EventKind::Tet | EventKind::PublicHoliday => (3, 2),
            EventKind::Private | EventKind::Regular => (1, 1),
        }
    }
}

/// Which ledger a computed amount belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayerBucket {
    Sponsor,
    Promoter,
    House,
}

impl PayerBucket {
    pub fn as_str(&self) -> &'static str {
        match self {
            PayerBucket::Sponsor => "sponsor",
            PayerBucket::Promoter => "promoter",
            PayerBucket::House => "house",
        }
    }

    pub fn parse(s: &str) -> Result<Self, String> {
        match s {
            "sponsor" => Ok(PayerBucket::Sponsor),
            "promoter" => Ok(PayerBucket::Promoter),
            "house" => Ok(PayerBucket::House),
            other => Err(format!("unknown payer bucket '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParticipantType {
    /// Assigned only by the known-exception rule; never paid.
    Owner,
    Resident,
    Guest,
}

impl ParticipantType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParticipantType::Owner => "owner",
            ParticipantType::Resident => "resident",
            ParticipantType::Guest => "guest",
        }
    }

    pub fn parse(s: &str) -> Result<Self, String> {
        match s {
            "owner" => Ok(ParticipantType::Owner),
            "resident" => Ok(ParticipantType::Resident),
            "guest" => Ok(ParticipantType::Guest),
            other => Err(format!("unknown participant type '{other}'")),
        }
    }
}

/// Derived from the record date versus "today" in the venue timezone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceStatus {
    Scheduled,
    Completed,
}

impl SourceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceStatus::Scheduled => "scheduled",
            SourceStatus::Completed => "completed",
        }
    }

    pub fn parse(s: &str) -> Result<Self, String> {
        match s {
            "scheduled" => Ok(SourceStatus::Scheduled),
            "completed" => Ok(SourceStatus::Completed),
            other => Err(format!("unknown source status '{other}'")),
        }
    }

    pub fn for_date(date: NaiveDate, today: NaiveDate) -> Self {
        if date < today {
            SourceStatus::Completed
        } else {
            SourceStatus::Scheduled
        }
    }
}

/// Operator-owned workflow status. The sync path sets it once at insert time
/// and never afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Unpaid,
    Paid,
    NotApplicable,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Unpaid => "unpaid",
            PaymentStatus::Paid => "paid",
            PaymentStatus::NotApplicable => "not_applicable",
        }
    }

    pub fn parse(s: &str) -> Result<Self, String> {
        match s {
            "unpaid" => Ok(PaymentStatus::Unpaid),
            "paid" => Ok(PaymentStatus::Paid),
            "not_applicable" => Ok(PaymentStatus::NotApplicable),
            other => Err(format!("unknown payment status '{other}'")),
        }
    }
}

/// One parsed-and-derived booking, ready to be reconciled against the store.
#[derive(Debug, Clone)]
pub struct CandidateRecord {
    pub date: NaiveDate,
    pub event_name: Option<String>,
    pub participant: String,
    pub category: EventKind,
    pub payer_bucket: PayerBucket,
    pub participant_type: ParticipantType,
    pub time_range: Option<TimeRange>,
    pub amount_minor: Option<i64>,
    pub sync_key: String,
    pub source_status: SourceStatus,
    pub initial_payment_status: PaymentStatus,
}

impl CandidateRecord {
    pub fn duration_minutes(&self) -> Option<u32> {
        self.time_range.map(|range| range.duration_minutes())
    }
}

/// The datastore's representation of a booking: the source-derived fields of
/// a candidate plus the operator-owned fields that a sync must never clobber.
#[derive(Debug, Clone)]
pub struct PersistedRecord {
    pub id: Uuid,
    pub sync_key: Option<String>,
    pub booking_date: NaiveDate,
    pub event_name: Option<String>,
    pub participant: String,
    pub category: EventKind,
    pub payer_bucket: PayerBucket,
    pub participant_type: ParticipantType,
    pub start_minute: Option<i32>,
    pub end_minute: Option<i32>,
    pub duration_minutes: Option<i32>,
    pub amount_minor: Option<i64>,
    pub source_status: SourceStatus,
    pub payment_status: PaymentStatus,
    pub amount_override: bool,
    pub receipt_uploaded: bool,
    pub notes: Option<String>,
    pub synced_from_source: bool,
}

/// Whether a partial update may rewrite the computed amount. `Protected`
/// means an operator set the amount by hand and recomputation is suppressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AmountPatch {
    Protected,
    Recompute(Option<i64>),
}

/// The update payload for an existing record. It is built exclusively from
/// source-owned fields; operator-owned fields (payment status, override
/// flag, receipts, notes) have no representation here, so no update path can
/// touch them.
#[derive(Debug, Clone)]
pub struct SourceFieldUpdate {
    pub booking_date: NaiveDate,
    pub event_name: Option<String>,
    pub category: EventKind,
    pub payer_bucket: PayerBucket,
    pub participant_type: ParticipantType,
    pub start_minute: Option<i32>,
    pub end_minute: Option<i32>,
    pub duration_minutes: Option<i32>,
    pub source_status: SourceStatus,
    pub amount: AmountPatch,
}

impl SourceFieldUpdate {
    pub fn from_candidate(candidate: &CandidateRecord, amount_protected: bool) -> Self {
        let amount = if amount_protected {
            AmountPatch::Protected
        } else {
            AmountPatch::Recompute(candidate.amount_minor)
        };
        Self {
            booking_date: candidate.date,
            event_name: candidate.event_name.clone(),
            category: candidate.category,
            payer_bucket: candidate.payer_bucket,
            participant_type: candidate.participant_type,
            start_minute: candidate.time_range.map(|r| r.start_minute() as i32),
            end_minute: candidate.time_range.map(|r| r.end_minute() as i32),
            duration_minutes: candidate.duration_minutes().map(|m| m as i32),
            source_status: candidate.source_status,
            amount,
        }
    }
}
