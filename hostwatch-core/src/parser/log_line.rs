//! Syslog-style lines: `<timestamp> <host> <process[pid]>: <message>`

use chrono::{DateTime, Datelike, Duration, Local, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::model::{LogRecord, Severity};

static LINE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"^(?P<ts>[A-Za-z]{3}\s+\d{1,2}\s+\d{2}:\d{2}:\d{2}(?:\s+\d{4})?",
        r"|\d{4}-\d{2}-\d{2}[T ]\d{2}:\d{2}:\d{2}(?:\.\d+)?(?:Z|[+-]\d{2}:\d{2})?)",
        r"\s+(?P<host>\S+)\s+(?P<process>[^:]+):\s+(?P<message>.+)$",
    ))
    .expect("log line pattern is valid")
});

static PID_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[(\d+)\]").expect("pid pattern is valid"));

static IPV4_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(?:\d{1,3}\.){3}\d{1,3}\b").expect("ipv4 pattern is valid"));

/// Year-less stamps are parsed in a leap year so `Feb 29` is accepted,
/// then moved to the year they belong to.
const LEAP_REFERENCE_YEAR: i32 = 2000;

/// How far past "now" a year-less stamp may lie before it is taken to be
/// from last year (clock skew between hosts, late writers).
const ROLLOVER_SLACK_HOURS: i64 = 24;

/// Timestamp layouts, tried in order. The first one that parses wins, so
/// the year-less layout must stay ahead of the one carrying a year.
enum TimestampFormat {
    /// No year in the text
    Yearless(&'static str),
    Pattern(&'static str),
    Rfc3339,
}

const TIMESTAMP_FORMATS: &[TimestampFormat] = &[
    TimestampFormat::Yearless("%Y %b %d %H:%M:%S"),
    TimestampFormat::Pattern("%b %d %H:%M:%S %Y"),
    TimestampFormat::Pattern("%Y-%m-%d %H:%M:%S"),
    TimestampFormat::Pattern("%Y-%m-%dT%H:%M:%S"),
    TimestampFormat::Pattern("%Y-%m-%d %H:%M:%S%.f"),
    TimestampFormat::Pattern("%Y-%m-%dT%H:%M:%S%.f"),
    TimestampFormat::Rfc3339,
];

/// Which year a year-less stamp lands in
#[derive(Debug, Clone, Copy)]
enum YearRule {
    /// Always this year
    Pinned(i32),
    /// The year of `now`, or the one before when that would put the stamp
    /// in the future (a file spanning New Year)
    RolloverAt(NaiveDateTime),
}

/// Move a stamp to `year`, walking back to the closest year where the date
/// exists (only `Feb 29` ever needs to).
fn place_in_year(stamp: NaiveDateTime, year: i32) -> Option<NaiveDateTime> {
    (0..8).find_map(|back| stamp.with_year(year - back))
}

impl YearRule {
    fn apply(self, stamp: NaiveDateTime) -> Option<NaiveDateTime> {
        match self {
            YearRule::Pinned(year) => place_in_year(stamp, year),
            YearRule::RolloverAt(now) => {
                let candidate = place_in_year(stamp, now.year())?;
                if candidate > now + Duration::hours(ROLLOVER_SLACK_HOURS) {
                    place_in_year(stamp, now.year() - 1)
                } else {
                    Some(candidate)
                }
            }
        }
    }
}

impl TimestampFormat {
    fn parse(&self, text: &str, rule: YearRule) -> Option<NaiveDateTime> {
        match self {
            TimestampFormat::Yearless(fmt) => {
                let stamp =
                    NaiveDateTime::parse_from_str(&format!("{LEAP_REFERENCE_YEAR} {text}"), fmt).ok()?;
                rule.apply(stamp)
            }
            TimestampFormat::Pattern(fmt) => NaiveDateTime::parse_from_str(text, fmt).ok(),
            // Offset is dropped: records are timezone-naive
            TimestampFormat::Rfc3339 => DateTime::parse_from_rfc3339(text)
                .ok()
                .map(|dt| dt.naive_local()),
        }
    }
}

fn parse_timestamp(raw: &str, rule: YearRule) -> Option<NaiveDateTime> {
    // "Jan  5" and "Jan 5" must parse the same
    let text = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    TIMESTAMP_FORMATS.iter().find_map(|format| format.parse(&text, rule))
}

/// Keyword heuristic, error keywords checked before warning keywords.
const SEVERITY_KEYWORDS: &[(Severity, &[&str])] = &[
    (Severity::Error, &["error", "failed"]),
    (Severity::Warning, &["warning", "warn"]),
];

/// Infer a severity from free text. Not a declared log level.
pub fn infer_severity(message: &str) -> Severity {
    let lower = message.to_lowercase();
    SEVERITY_KEYWORDS
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| lower.contains(k)))
        .map(|(severity, _)| *severity)
        .unwrap_or(Severity::Info)
}

/// Parse one log line; year-less stamps are placed relative to the local
/// clock (see `parse_log_line_at`).
pub fn parse_log_line(line: &str) -> Option<LogRecord> {
    parse_log_line_at(line, Local::now().naive_local())
}

/// Parse one log line read at `now`.
///
/// A year-less stamp takes the year of `now`, unless that would put it more
/// than a day past `now`; then it belongs to the previous year.
pub fn parse_log_line_at(line: &str, now: NaiveDateTime) -> Option<LogRecord> {
    parse_with(line, YearRule::RolloverAt(now))
}

/// Parse one log line, placing year-less stamps in `year`.
///
/// `Feb 29` in a non-leap year falls back to the closest earlier leap year.
pub fn parse_log_line_in_year(line: &str, year: i32) -> Option<LogRecord> {
    parse_with(line, YearRule::Pinned(year))
}

fn parse_with(line: &str, rule: YearRule) -> Option<LogRecord> {
    let caps = LINE_RE.captures(line.trim_end())?;
    let timestamp = parse_timestamp(&caps["ts"], rule)?;

    let process = caps["process"].trim();
    let process_name = process
        .split('[')
        .next()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(String::from);
    let process_id = PID_RE
        .captures(process)
        .and_then(|pid| pid[1].parse::<u32>().ok());

    let message = caps["message"].to_string();
    let ip = IPV4_RE.find(&message).map(|m| m.as_str().to_string());

    Some(LogRecord {
        timestamp,
        source: caps["host"].to_string(),
        level: infer_severity(&message),
        message,
        process_name,
        process_id,
        ip,
    })
}

/// Parse a whole log text read at `now`, keeping file order and dropping
/// malformed lines.
pub fn parse_log_text(text: &str, now: NaiveDateTime) -> Vec<LogRecord> {
    let rule = YearRule::RolloverAt(now);
    text.lines().filter_map(|line| parse_with(line, rule)).collect()
}
