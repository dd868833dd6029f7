use crate::error::{Error, Result};
use crate::record::{ProbeRecord, RttMillis};
use chrono::{DateTime, Utc};
use log::debug;
use std::collections::{BTreeMap, BTreeSet};

/// Aggregation key: one group per domain, vantage point and resolver.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GroupKey {
    pub domain: String,
    pub vantage_point: String,
    pub resolver: String,
}

/// Everything observed for one key during a batch pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    key: GroupKey,
    expiry_instants: Vec<i64>,
    ttls: Vec<i64>,
    locations: BTreeSet<String>,
    rtts: Vec<RttMillis>,
    last_probe: DateTime<Utc>,
    record_count: usize,
}

impl Group {
    fn new(key: GroupKey, first_probe: DateTime<Utc>) -> Self {
        Group {
            key,
            expiry_instants: Vec::new(),
            ttls: Vec::new(),
            locations: BTreeSet::new(),
            rtts: Vec::new(),
            last_probe: first_probe,
            record_count: 0,
        }
    }

    fn push(&mut self, record: &ProbeRecord, arrival: DateTime<Utc>) {
        if let Some(instant) = record.expiry_instant() {
            self.expiry_instants.push(instant);
        }
        self.ttls.push(record.ttl_seconds);
        if let Some(label) = record.location_label() {
            self.locations.insert(label.to_string());
        }
        if let Some(rtt) = record.rtt_ms {
            self.rtts.push(rtt);
        }
        if arrival > self.last_probe {
            self.last_probe = arrival;
        }
        self.record_count += 1;
    }

    pub fn key(&self) -> &GroupKey {
        &self.key
    }

    pub fn resolver(&self) -> &str {
        &self.key.resolver
    }

    /// Expiry instants (Unix seconds) of records with a positive TTL
    pub fn expiry_instants(&self) -> &[i64] {
        &self.expiry_instants
    }

    /// TTLs of every record, in input order, including non-positive ones
    pub fn ttls(&self) -> &[i64] {
        &self.ttls
    }

    /// Unique non-empty location labels, sorted
    pub fn locations(&self) -> impl Iterator<Item = &str> {
        self.locations.iter().map(String::as_str)
    }

    pub fn rtts(&self) -> &[RttMillis] {
        &self.rtts
    }

    /// Latest arrival time among the group's records, whole seconds
    pub fn last_probe(&self) -> DateTime<Utc> {
        self.last_probe
    }

    pub fn record_count(&self) -> usize {
        self.record_count
    }

    /// Number of records that carried a usable TTL
    pub fn surviving_count(&self) -> usize {
        self.expiry_instants.len()
    }

    pub fn has_data(&self) -> bool {
        !self.expiry_instants.is_empty()
    }
}

/// Partition a batch of probe records into groups.
///
/// Records with a non-positive TTL contribute no expiry instant but still
/// create their group. Any record without an arrival time fails the whole
/// batch. Groups are returned ordered by key.
pub fn group_records<I>(records: I) -> Result<Vec<Group>>
where
    I: IntoIterator<Item = ProbeRecord>,
{
    let mut groups: BTreeMap<GroupKey, Group> = BTreeMap::new();

    for (index, record) in records.into_iter().enumerate() {
        let key = GroupKey {
            domain: record.canonical_domain().to_string(),
            vantage_point: record.vantage_point.clone(),
            resolver: record.resolver.clone(),
        };
        let arrival = record
            .arrival_second()
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
            .ok_or_else(|| Error::MissingArrivalTime {
                index,
                domain: key.domain.clone(),
                vantage_point: key.vantage_point.clone(),
                resolver: key.resolver.clone(),
            })?;

        groups
            .entry(key.clone())
            .or_insert_with(|| Group::new(key, arrival))
            .push(&record, arrival);
    }

    debug!("grouped batch into {} groups", groups.len());
    Ok(groups.into_values().collect())
}
