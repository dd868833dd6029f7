use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Round-trip time in milliseconds
pub type RttMillis = f64;

/// A normalized DNS probe observation.
///
/// `arrival_time` is optional on the wire only so that a missing timestamp
/// can be reported; grouping rejects any batch that contains one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeRecord {
    pub domain: String,
    pub vantage_point: String,
    pub resolver: String,
    #[serde(default, deserialize_with = "deserialize_arrival")]
    pub arrival_time: Option<DateTime<Utc>>,
    pub ttl_seconds: i64,
    #[serde(default)]
    pub rtt_ms: Option<RttMillis>,
    #[serde(default)]
    pub location: Option<String>,
}

impl ProbeRecord {
    /// Requested domain with surrounding whitespace and dots removed,
    /// so `example.com.` and `example.com\r\n` land in the same group.
    pub fn canonical_domain(&self) -> &str {
        canonical_domain(&self.domain)
    }

    /// Arrival time truncated to whole Unix seconds
    pub fn arrival_second(&self) -> Option<i64> {
        self.arrival_time.map(|t| t.timestamp())
    }

    /// Instant (Unix seconds) at which the observed answer's TTL lapses.
    /// `None` when the record carries no usable cache signal. Instants past
    /// the representable range clamp to `i64::MAX`.
    pub fn expiry_instant(&self) -> Option<i64> {
        if self.ttl_seconds <= 0 {
            return None;
        }
        self.arrival_second()
            .map(|secs| secs.saturating_add(self.ttl_seconds))
    }

    /// Location label, treating empty or blank labels as absent
    pub fn location_label(&self) -> Option<&str> {
        self.location
            .as_deref()
            .map(str::trim)
            .filter(|l| !l.is_empty())
    }
}

/// Parse an arrival timestamp. RFC 3339 instants are converted to UTC;
/// timestamps without an offset are taken as UTC.
pub fn parse_arrival_time(raw: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    let raw = raw.trim();
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .or_else(|_| raw.parse::<NaiveDateTime>().map(|t| t.and_utc()))
        .or_else(|_| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f").map(|t| t.and_utc())
        })
}

fn deserialize_arrival<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(raw) = Option::<String>::deserialize(deserializer)? else {
        return Ok(None);
    };
    parse_arrival_time(&raw)
        .map(Some)
        .map_err(|e| serde::de::Error::custom(format!("arrival_time {raw:?}: {e}")))
}

pub fn canonical_domain(domain: &str) -> &str {
    domain
        .trim()
        .trim_matches('.')
}
