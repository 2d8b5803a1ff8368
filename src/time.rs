//! Certificate timestamp parsing and the clock used for expiry arithmetic.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};

use crate::error::TLSCheckError;

/// Layout OpenSSL uses when printing an `ASN1_TIME`, after whitespace is collapsed.
const ASN1_TIME_FORMAT: &str = "%b %d %H:%M:%S %Y GMT";

/// Layout used for every rendered date.
pub const DISPLAY_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const SECONDS_PER_DAY: i64 = 86_400;

/// Source of "now" for expiry calculations.
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock frozen at one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Parses an ASN.1 time as printed by OpenSSL, e.g. `"Jun  1 00:00:00 2024 GMT"`.
///
/// The day of month is space padded by OpenSSL, so runs of whitespace are
/// collapsed before matching. Anything else that deviates from the layout,
/// including a zone other than `GMT`, is rejected.
pub fn parse_asn1_time(raw: &str) -> Result<DateTime<Utc>, TLSCheckError> {
    let normalized = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    let naive = NaiveDateTime::parse_from_str(&normalized, ASN1_TIME_FORMAT).map_err(|e| {
        TLSCheckError::certificate_parse(format!("invalid certificate timestamp '{}': {}", raw, e))
    })?;
    Ok(Utc.from_utc_datetime(&naive))
}

/// Renders a timestamp the way reports show it: `2024-06-01 00:00:00`.
pub fn format_timestamp(at: &DateTime<Utc>) -> String {
    at.format(DISPLAY_FORMAT).to_string()
}

/// Whole days from `now` until `not_after`, rounded toward negative infinity.
///
/// A certificate that expired one second ago reports `-1`, never `0`.
pub fn days_until(not_after: &DateTime<Utc>, now: &DateTime<Utc>) -> i64 {
    let seconds = not_after.signed_duration_since(*now).num_seconds();
    seconds.div_euclid(SECONDS_PER_DAY)
}
