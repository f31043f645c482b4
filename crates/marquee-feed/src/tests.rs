use chrono::NaiveDate;

use crate::delimited::parse_document;
use crate::errors::FeedParseError;
use crate::model::TimeRange;
use crate::normalize::{find_header_row, normalize_document, parse_feed_date, parse_slot_cell};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

#[test]
fn parse_document_honors_quoting() {
    let text = "date,event,dj_1\n2026-08-16,\"Tet, Countdown\",\"DJ \"\"A\"\" 21:30 - 23:00\"\n";
    let rows = parse_document(text).expect("parse");
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[1][1], "Tet, Countdown");
    assert_eq!(rows[1][2], "DJ \"A\" 21:30 - 23:00");
}

#[test]
fn parse_document_handles_embedded_newlines_and_crlf() {
    let text = "date,notes\r\n2026-08-16,\"line one\nline two\"\r\n";
    let rows = parse_document(text).expect("parse");
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[1][1], "line one\nline two");
}

#[test]
fn parse_document_drops_trailing_blank_lines() {
    let text = "date,dj_1\n2026-08-16,DJ A\n\n,\n";
    let rows = parse_document(text).expect("parse");
    assert_eq!(rows.len(), 2);
}

#[test]
fn parse_document_rejects_markup() {
    let err = parse_document("<!DOCTYPE html><html><body>sign in</body></html>")
        .expect_err("markup must be rejected");
    assert!(matches!(err, FeedParseError::NotTabular { .. }));

    let err = parse_document("  <html lang=\"en\">").expect_err("markup must be rejected");
    assert!(matches!(err, FeedParseError::NotTabular { .. }));
}

#[test]
fn header_row_found_below_banner_rows() {
    let rows = vec![
        vec!["Club Marquee".to_string()],
        vec!["August schedule".to_string(), String::new()],
        vec![
            "Date".to_string(),
            "Event".to_string(),
            "DJ 1".to_string(),
            "dj_2".to_string(),
        ],
        vec!["2026-08-16".to_string()],
    ];
    let layout = find_header_row(&rows).expect("header");
    assert_eq!(layout.header_index, 2);
    assert_eq!(layout.date_col, 0);
    assert_eq!(layout.event_col, Some(1));
    assert_eq!(layout.slot_cols, vec![2, 3]);
}

#[test]
fn header_scan_gives_up_without_marker_columns() {
    let rows = vec![
        vec!["just".to_string(), "prose".to_string()],
        vec!["more".to_string(), "prose".to_string()],
    ];
    assert!(find_header_row(&rows).is_none());
    assert!(normalize_document(&rows).is_none());
}

#[test]
fn feed_dates_accept_regional_formats() {
    assert_eq!(parse_feed_date("2026-08-16"), Some(date(2026, 8, 16)));
    assert_eq!(parse_feed_date("16/8/2026"), Some(date(2026, 8, 16)));
    assert_eq!(parse_feed_date("16.08.2026"), Some(date(2026, 8, 16)));
    assert_eq!(parse_feed_date("16-08-2026"), Some(date(2026, 8, 16)));
    assert_eq!(parse_feed_date("16-Aug-2026"), Some(date(2026, 8, 16)));
    assert_eq!(parse_feed_date(" 5/1/2026 "), Some(date(2026, 1, 5)));
}

#[test]
fn two_digit_years_expand_to_20xx() {
    assert_eq!(parse_feed_date("16/8/26"), Some(date(2026, 8, 16)));
    assert_eq!(parse_feed_date("1.1.99"), Some(date(2099, 1, 1)));
}

#[test]
fn unparseable_dates_yield_none() {
    assert_eq!(parse_feed_date(""), None);
    assert_eq!(parse_feed_date("next friday"), None);
    assert_eq!(parse_feed_date("32/13/2026"), None);
}

#[test]
fn slot_cell_extracts_name_and_range() {
    let entry = parse_slot_cell("DJ Amor 21:30 - 23:00").expect("entry");
    assert_eq!(entry.name, "DJ Amor");
    let range = entry.range.expect("range");
    assert_eq!(range.start_minute(), 1290);
    assert_eq!(range.end_minute(), 1380);
}

#[test]
fn slot_cell_tolerates_semicolon_typo() {
    let entry = parse_slot_cell("DJ Sample 23:00 - 01;00").expect("entry");
    let range = entry.range.expect("range");
    assert_eq!(range.start_minute(), 1380);
    assert_eq!(range.end_minute(), 1500);
}

#[test]
fn slot_cell_keeps_bare_names() {
    let entry = parse_slot_cell("  DJ Mekong  ").expect("entry");
    assert_eq!(entry.name, "DJ Mekong");
    assert!(entry.range.is_none());

    assert!(parse_slot_cell("   ").is_none());
}

#[test]
fn midnight_rollover_normalizes_end_past_1440() {
    let range = TimeRange::from_hhmm(21, 30, 1, 0).expect("range");
    assert_eq!(range.start_minute(), 1290);
    assert_eq!(range.end_minute(), 1500);
    assert_eq!(range.duration_minutes(), 210);
    assert!((range.duration_hours() - 3.5).abs() < f64::EPSILON);
}

#[test]
fn time_range_rejects_out_of_range_minutes() {
    assert!(TimeRange::from_hhmm(24, 0, 1, 0).is_err());
    assert!(TimeRange::from_hhmm(21, 60, 1, 0).is_err());
    assert!(TimeRange::new(1440, 10).is_err());
}

#[test]
fn dates_carry_forward_within_a_pass() {
    let rows = vec![
        vec!["date".into(), "event".into(), "dj_1".into()],
        vec!["16.08.2026".into(), "Tet Countdown".into(), "DJ Amor 21:30 - 23:00".into()],
        vec!["".into(), "Tet Countdown".into(), "DJ Sample 23:00 - 01;00".into()],
        vec!["17.08.2026".into(), "Recovery".into(), "DJ Mekong 22:00 - 02:00".into()],
    ];
    let sheet = normalize_document(&rows).expect("sheet");
    assert_eq!(sheet.skipped_rows, 0);
    assert_eq!(sheet.rows.len(), 3);
    assert_eq!(sheet.rows[0].date, date(2026, 8, 16));
    assert!(!sheet.rows[0].date_carried);
    assert_eq!(sheet.rows[1].date, date(2026, 8, 16));
    assert!(sheet.rows[1].date_carried);
    assert_eq!(sheet.rows[2].date, date(2026, 8, 17));
}

#[test]
fn rows_without_usable_dates_are_counted_not_fatal() {
    let rows = vec![
        vec!["date".into(), "dj_1".into()],
        vec!["".into(), "DJ Orphan 21:00 - 23:00".into()],
        vec!["garbage".into(), "DJ Junk 21:00 - 23:00".into()],
        vec!["2026-08-16".into(), "DJ Amor 21:30 - 23:00".into()],
    ];
    let sheet = normalize_document(&rows).expect("sheet");
    assert_eq!(sheet.skipped_rows, 2);
    assert_eq!(sheet.rows.len(), 1);
    assert_eq!(sheet.rows[0].slots.len(), 1);
}
