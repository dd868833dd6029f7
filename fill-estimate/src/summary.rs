use crate::error::Result;
use crate::group::{self, Group};
use crate::record::{ProbeRecord, RttMillis};
use crate::resolver::ResolverTable;
use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use std::fmt;

pub const NO_DATA: &str = "no data";
pub const UNSUPPORTED_RESOLVER: &str = "unsupported resolver";

/// Outcome of estimating one group.
///
/// Zero is only produced by an estimator that ran; missing data and unknown
/// resolvers are reported as markers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Estimate {
    Count(u64),
    UnsupportedResolver,
    NoData,
}

impl Estimate {
    pub fn count(&self) -> Option<u64> {
        match self {
            Estimate::Count(n) => Some(*n),
            _ => None,
        }
    }
}

impl fmt::Display for Estimate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Estimate::Count(n) => write!(f, "{n}"),
            Estimate::UnsupportedResolver => f.write_str(UNSUPPORTED_RESOLVER),
            Estimate::NoData => f.write_str(NO_DATA),
        }
    }
}

/// Counts serialize as numbers, markers as their literal strings
impl Serialize for Estimate {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Estimate::Count(n) => serializer.serialize_u64(*n),
            Estimate::UnsupportedResolver => serializer.serialize_str(UNSUPPORTED_RESOLVER),
            Estimate::NoData => serializer.serialize_str(NO_DATA),
        }
    }
}

/// One output row per group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub domain: String,
    pub vantage_point: String,
    pub resolver: String,
    pub operator: Option<String>,
    /// Sorted unique location labels joined with commas
    pub pop_location: String,
    pub estimate: Estimate,
    pub last_probe: Option<DateTime<Utc>>,
    pub ttls: Vec<i64>,
    pub rtts: Vec<RttMillis>,
}

impl Summary {
    pub fn ttls_joined(&self) -> String {
        join(&self.ttls)
    }

    pub fn rtts_joined(&self) -> String {
        join(&self.rtts)
    }
}

fn join<T: ToString>(values: &[T]) -> String {
    values
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

/// Shape a finalized group into its output row.
pub fn summarize(group: &Group, table: &ResolverTable) -> Summary {
    let key = group.key();
    let estimate = table.estimate(group);
    let operator = table.operator_for(&key.resolver).map(str::to_string);

    let mut summary = Summary {
        domain: key.domain.clone(),
        vantage_point: key.vantage_point.clone(),
        resolver: key.resolver.clone(),
        operator,
        pop_location: String::new(),
        estimate,
        last_probe: None,
        ttls: Vec::new(),
        rtts: Vec::new(),
    };

    if estimate != Estimate::NoData {
        summary.pop_location = group.locations().collect::<Vec<_>>().join(",");
        summary.last_probe = Some(group.last_probe());
        summary.ttls = group.ttls().to_vec();
        summary.rtts = group.rtts().to_vec();
    }
    summary
}

/// Group a batch and summarize every group, ordered by key.
pub fn summarize_batch<I>(records: I, table: &ResolverTable) -> Result<Vec<Summary>>
where
    I: IntoIterator<Item = ProbeRecord>,
{
    let groups = group::group_records(records)?;
    Ok(groups.iter().map(|g| summarize(g, table)).collect())
}
