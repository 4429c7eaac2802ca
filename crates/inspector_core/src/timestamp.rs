use chrono::NaiveDateTime;

/// Layout of the capture timestamp embedded in inspector filenames.
pub const RAW_DATE_FORMAT: &str = "%Y%m%d%H%M%S";
/// Layout spreadsheet tools recognise without a custom format.
pub const REPORT_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Reformats `YYYYMMDDHHMMSS` as `YYYY-MM-DD HH:MM:SS`, or returns an empty
/// string when the input is not a valid timestamp.
pub fn reformat_raw_date(raw: &str) -> String {
    NaiveDateTime::parse_from_str(raw, RAW_DATE_FORMAT)
        .map(|dt| dt.format(REPORT_DATE_FORMAT).to_string())
        .unwrap_or_default()
}
