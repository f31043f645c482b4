use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub const MINUTES_PER_DAY: u32 = 1440;

/// A pair of minute-of-day offsets. An end earlier than the start means the
/// range crosses midnight, in which case the end is stored shifted by a full
/// day so that `end >= start` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeRange {
    start: u32,
    end: u32,
}

impl TimeRange {
    pub fn new(start: u32, end: u32) -> Result<Self, String> {
        if start >= MINUTES_PER_DAY {
            return Err(format!("start minute {start} out of range"));
        }
        if end >= MINUTES_PER_DAY {
            return Err(format!("end minute {end} out of range"));
        }
        let end = if end < start { end + MINUTES_PER_DAY } else { end };
        Ok(Self { start, end })
    }

    pub fn from_hhmm(start_h: u32, start_m: u32, end_h: u32, end_m: u32) -> Result<Self, String> {
        if start_h > 23 || end_h > 23 || start_m > 59 || end_m > 59 {
            return Err(format!(
                "invalid clock time {start_h:02}:{start_m:02}-{end_h:02}:{end_m:02}"
            ));
        }
        Self::new(start_h * 60 + start_m, end_h * 60 + end_m)
    }

    pub fn start_minute(&self) -> u32 {
        self.start
    }

    /// End minute, possibly >= 1440 when the range wraps past midnight.
    pub fn end_minute(&self) -> u32 {
        self.end
    }

    pub fn duration_minutes(&self) -> u32 {
        self.end - self.start
    }

    pub fn duration_hours(&self) -> f64 {
        f64::from(self.duration_minutes()) / 60.0
    }
}

/// One participant slot extracted from a free-text cell. The time range is
/// optional: a cell naming a performer without a recognizable range still
/// carries the name downstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotEntry {
    pub name: String,
    pub range: Option<TimeRange>,
    pub raw: String,
}

/// A source row after coercion. Cells that failed to coerce are `None`; only
/// a missing date disqualifies the whole row.
#[derive(Debug, Clone)]
pub struct NormalizedRow {
    pub date: NaiveDate,
    /// Whether the date was inherited from an earlier row rather than read
    /// from this row's own cell.
    pub date_carried: bool,
    pub event: Option<String>,
    pub slots: Vec<SlotEntry>,
    pub source_line: usize,
}

#[derive(Debug, Default)]
pub struct NormalizedSheet {
    pub rows: Vec<NormalizedRow>,
    /// Rows dropped for lacking a usable date.
    pub skipped_rows: usize,
}
