use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::model::{NormalizedRow, NormalizedSheet, SlotEntry, TimeRange};

/// Banner/title rows may precede the real header; scan at most this many rows
/// looking for it.
const HEADER_SCAN_LIMIT: usize = 10;

const DATE_COLUMNS: &[&str] = &["date", "day", "booking_date", "show_date"];
const EVENT_COLUMNS: &[&str] = &["event", "event_name", "theme", "program", "title"];

static SLOT_COLUMN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^dj_?(\d)$").expect("slot column regex"));

// `<name> HH:MM - HH:MM`, tolerating `;` as a typo for `:` on either side.
static SLOT_CELL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?s)(.*?)\s*(\d{1,2})\s*[:;]\s*(\d{2})\s*-\s*(\d{1,2})\s*[:;]\s*(\d{2})\s*$")
        .expect("slot cell regex")
});

// Numeric day-first dates (`16.08.2026`, `16/8/26`, `16-08-2026`) and
// day-month-name dates (`16-Aug-2026`).
static NUMERIC_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{1,2})[./-](\d{1,2})[./-](\d{2,4})$").expect("numeric date regex"));
static MONTH_NAME_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{1,2})[./ -]([A-Za-z]{3,9})[./ -](\d{2,4})$").expect("month name date regex"));

/// Column positions discovered by the header scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderLayout {
    pub header_index: usize,
    pub date_col: usize,
    pub event_col: Option<usize>,
    /// Participant slot columns in ascending slot order.
    pub slot_cols: Vec<usize>,
}

fn normalize_column_name(raw: &str) -> String {
    raw.trim()
        .to_ascii_lowercase()
        .chars()
        .map(|c| if c == ' ' || c == '-' { '_' } else { c })
        .collect()
}

/// Scans the first few rows for a header containing a date column together
/// with at least one participant slot column. Returns `None` when no such
/// row exists, which callers treat as "no data" rather than a parse failure.
pub fn find_header_row(rows: &[Vec<String>]) -> Option<HeaderLayout> {
    for (index, row) in rows.iter().take(HEADER_SCAN_LIMIT).enumerate() {
        let names: Vec<String> = row.iter().map(|cell| normalize_column_name(cell)).collect();

        let date_col = names
            .iter()
            .position(|name| DATE_COLUMNS.contains(&name.as_str()));
        let Some(date_col) = date_col else {
            continue;
        };

        let mut slots: Vec<(u8, usize)> = Vec::new();
        for (col, name) in names.iter().enumerate() {
            if let Some(caps) = SLOT_COLUMN.captures(name) {
                if let Ok(slot) = caps[1].parse::<u8>() {
                    slots.push((slot, col));
                }
            }
        }
        if slots.is_empty() {
            continue;
        }
        slots.sort_by_key(|(slot, _)| *slot);

        let event_col = names
            .iter()
            .position(|name| EVENT_COLUMNS.contains(&name.as_str()));

        return Some(HeaderLayout {
            header_index: index,
            date_col,
            event_col,
            slot_cols: slots.into_iter().map(|(_, col)| col).collect(),
        });
    }
    None
}

fn month_from_name(name: &str) -> Option<u32> {
    let prefix = name.get(..3)?.to_ascii_lowercase();
    let month = match prefix.as_str() {
        "jan" => 1,
        "feb" => 2,
        "mar" => 3,
        "apr" => 4,
        "may" => 5,
        "jun" => 6,
        "jul" => 7,
        "aug" => 8,
        "sep" => 9,
        "oct" => 10,
        "nov" => 11,
        "dec" => 12,
        _ => return None,
    };
    Some(month)
}

fn expand_year(year: i32) -> i32 {
    // Two-digit years are assumed to be 20xx.
    if year < 100 {
        2000 + year
    } else {
        year
    }
}

/// Accepts ISO dates plus the regional day-first formats seen in the feed.
/// Returns `None` for anything unparseable; unusable dates drop the row, not
/// the batch.
pub fn parse_feed_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Some(date);
    }

    if let Some(caps) = NUMERIC_DATE.captures(trimmed) {
        let day: u32 = caps[1].parse().ok()?;
        let month: u32 = caps[2].parse().ok()?;
        let year: i32 = caps[3].parse().ok()?;
        return NaiveDate::from_ymd_opt(expand_year(year), month, day);
    }

    if let Some(caps) = MONTH_NAME_DATE.captures(trimmed) {
        let day: u32 = caps[1].parse().ok()?;
        let month = month_from_name(&caps[2])?;
        let year: i32 = caps[3].parse().ok()?;
        return NaiveDate::from_ymd_opt(expand_year(year), month, day);
    }

    None
}

/// Extracts a participant name and, when present, a time range from a free
/// text slot cell. A cell with a name but no recognizable range yields the
/// name alone. Empty cells yield nothing.
pub fn parse_slot_cell(raw: &str) -> Option<SlotEntry> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Some(caps) = SLOT_CELL.captures(trimmed) {
        let name = caps[1].trim().trim_start_matches(['-', '*']).trim();
        let start_h: u32 = caps[2].parse().ok()?;
        let start_m: u32 = caps[3].parse().ok()?;
        let end_h: u32 = caps[4].parse().ok()?;
        let end_m: u32 = caps[5].parse().ok()?;
        if !name.is_empty() {
            if let Ok(range) = TimeRange::from_hhmm(start_h, start_m, end_h, end_m) {
                return Some(SlotEntry {
                    name: name.to_string(),
                    range: Some(range),
                    raw: trimmed.to_string(),
                });
            }
        }
    }

    Some(SlotEntry {
        name: trimmed.to_string(),
        range: None,
        raw: trimmed.to_string(),
    })
}

/// Turns parsed rows into normalized rows. Returns `None` when no header row
/// is found (the document's shape changed, or it carries no data).
///
/// Dates carry forward: the source groups several entries under one date
/// header, so a blank date cell inherits the most recent non-blank date seen
/// earlier in the same pass. Rows with no usable date at all are dropped and
/// counted.
pub fn normalize_document(rows: &[Vec<String>]) -> Option<NormalizedSheet> {
    let layout = find_header_row(rows)?;
    let mut sheet = NormalizedSheet::default();
    let mut current_date: Option<NaiveDate> = None;

    for (offset, row) in rows.iter().enumerate().skip(layout.header_index + 1) {
        if row.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }

        let date_cell = row.get(layout.date_col).map(String::as_str).unwrap_or("");
        let (date, date_carried) = if date_cell.trim().is_empty() {
            match current_date {
                Some(date) => (date, true),
                None => {
                    sheet.skipped_rows += 1;
                    continue;
                }
            }
        } else {
            match parse_feed_date(date_cell) {
                Some(date) => {
                    current_date = Some(date);
                    (date, false)
                }
                None => {
                    sheet.skipped_rows += 1;
                    continue;
                }
            }
        };

        let event = layout
            .event_col
            .and_then(|col| row.get(col))
            .map(|cell| cell.trim())
            .filter(|cell| !cell.is_empty())
            .map(|cell| cell.to_string());

        let slots = layout
            .slot_cols
            .iter()
            .filter_map(|&col| row.get(col))
            .filter_map(|cell| parse_slot_cell(cell))
            .collect();

        sheet.rows.push(NormalizedRow {
            date,
            date_carried,
            event,
            slots,
            source_line: offset,
        });
    }

    Some(sheet)
}
