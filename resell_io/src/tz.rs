//! Timestamp parsing and time zone conversion.
//!
//! What this module provides:
//! - [`parse_ts_to_utc`]: timestamps carrying an offset, converted to UTC.
//! - [`from_local_naive_with_policy`]: a naive wall time in an IANA zone to UTC,
//!   with a [`DstPolicy`] for gaps and repeated hours.
//! - [`parse_timestamp`]: the entry point used by the CSV readers. Offsets win;
//!   naive values are read in the configured source zone.
//!
//! Accepted shapes:
//! - RFC-3339: `2025-01-31T09:30:00-05:00`, `2025-01-31T14:30:00Z`
//! - space separated with offset: `2025-01-31 14:30:00+00:00`
//! - naive: `2025-01-31 14:30:00`, `2025-01-31T14:30:00.250`
//! - date only: `2025-01-31` (midnight in the source zone)
//!
//! Notes:
//! - Ambiguous local times happen during "fall back" when a wall time occurs twice.
//! - Nonexistent local times happen during "spring forward" when a wall time is skipped.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use snafu::{Backtrace, OptionExt, Snafu};

/// Errors from timestamp parsing and zone conversion.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum TimestampError {
    /// None of the accepted shapes matched.
    #[snafu(display("unrecognized timestamp: {raw:?}"))]
    Unrecognized { raw: String, backtrace: Backtrace },

    /// The IANA zone name is unknown.
    #[snafu(display("unknown time zone: {name:?}"))]
    UnknownZone { name: String, backtrace: Backtrace },

    /// The wall time occurs twice in the zone and the policy does not pick one.
    #[snafu(display("ambiguous local time {naive} in {tz}"))]
    Ambiguous {
        naive: NaiveDateTime,
        tz: Tz,
        backtrace: Backtrace,
    },

    /// The wall time is skipped in the zone and the policy does not shift it.
    #[snafu(display("nonexistent local time {naive} in {tz}"))]
    Nonexistent {
        naive: NaiveDateTime,
        tz: Tz,
        backtrace: Backtrace,
    },
}

/// Policy for handling DST edge cases when converting local naive timestamps to UTC.
///
/// Set from `input.dst_policy` in the config (`"strict"`, `"prefer_earliest"`,
/// `"prefer_latest"`, `"shift_forward"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DstPolicy {
    /// Error on ambiguous or nonexistent local times.
    Strict,
    /// For ambiguous local times pick the earlier instant.
    #[default]
    PreferEarliest,
    /// For ambiguous local times pick the later instant.
    PreferLatest,
    /// For nonexistent local times step forward one minute at a time until the
    /// first valid instant (capped at 2 hours); ambiguous times take the earlier one.
    ShiftForward,
}

const OFFSET_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f%:z", "%Y-%m-%d %H:%M:%S%.f%#z"];
const NAIVE_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M"];

/// Parse an IANA zone name such as `"Asia/Seoul"`.
pub fn parse_zone(name: &str) -> Result<Tz, TimestampError> {
    name.trim()
        .parse::<Tz>()
        .ok()
        .context(UnknownZoneSnafu { name })
}

/// Timestamp with an explicit offset -> UTC. `None` when no offset shape matches.
pub fn parse_ts_to_utc(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    OFFSET_FORMATS
        .iter()
        .find_map(|f| DateTime::parse_from_str(s, f).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

fn parse_naive(s: &str) -> Option<NaiveDateTime> {
    NAIVE_FORMATS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(s, f).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// Convert a naive local timestamp to UTC using an IANA zone and a DST policy.
pub fn from_local_naive_with_policy(
    naive: NaiveDateTime,
    tz: Tz,
    policy: DstPolicy,
) -> Result<DateTime<Utc>, TimestampError> {
    use chrono::offset::LocalResult::*;
    match tz.from_local_datetime(&naive) {
        Single(dt) => Ok(dt.with_timezone(&Utc)),
        Ambiguous(a, b) => match policy {
            DstPolicy::PreferEarliest | DstPolicy::ShiftForward => Ok(a.with_timezone(&Utc)),
            DstPolicy::PreferLatest => Ok(b.with_timezone(&Utc)),
            DstPolicy::Strict => AmbiguousSnafu { naive, tz }.fail(),
        },
        None => {
            if policy == DstPolicy::ShiftForward {
                let mut t = naive;
                for _ in 0..120 {
                    t += chrono::Duration::minutes(1);
                    if let Single(dt) = tz.from_local_datetime(&t) {
                        return Ok(dt.with_timezone(&Utc));
                    }
                }
            }
            NonexistentSnafu { naive, tz }.fail()
        }
    }
}

/// Parse one raw timestamp cell.
///
/// Values with an offset are converted directly; naive values are interpreted in
/// `source_tz` under `policy`.
pub fn parse_timestamp(
    raw: &str,
    source_tz: Tz,
    policy: DstPolicy,
) -> Result<DateTime<Utc>, TimestampError> {
    let s = raw.trim();
    if let Some(utc) = parse_ts_to_utc(s) {
        return Ok(utc);
    }
    let naive = parse_naive(s).context(UnrecognizedSnafu { raw: s })?;
    from_local_naive_with_policy(naive, source_tz, policy)
}
