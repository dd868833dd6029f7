//! Resolver identity table and estimation dispatch.
//!
//! Operators differ in how much cache-refresh timing they leak through TTL
//! countdowns. That classification is static configuration: a small
//! ordered list of typed matchers, first match wins.

use crate::coalesce;
use crate::epoch::{self, QUAD9_EPOCH_SECS};
use crate::error::{Error, Result};
use crate::group::Group;
use crate::summary::Estimate;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "match", content = "pattern", rename_all = "snake_case")]
pub enum ResolverMatcher {
    Exact(String),
    Contains(String),
}

impl ResolverMatcher {
    pub fn matches(&self, resolver: &str) -> bool {
        match self {
            ResolverMatcher::Exact(p) => resolver == p,
            ResolverMatcher::Contains(p) => resolver.contains(p.as_str()),
        }
    }

    fn pattern(&self) -> &str {
        match self {
            ResolverMatcher::Exact(p) | ResolverMatcher::Contains(p) => p,
        }
    }
}

/// Counting semantics for a resolver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Strategy {
    /// Near-continuous cache visibility
    RunCoalescing,
    /// Visibility only in fixed windows of `width_secs`
    EpochBucket { width_secs: u64 },
}

impl Strategy {
    pub fn count(&self, instants: &[i64]) -> usize {
        match *self {
            Strategy::RunCoalescing => coalesce::count_fills(instants),
            Strategy::EpochBucket { width_secs } => epoch::count_buckets(instants, width_secs),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolverRule {
    pub matcher: ResolverMatcher,
    pub strategy: Strategy,
    /// Friendly operator name, e.g. `Cloudflare`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operator: Option<String>,
}

impl ResolverRule {
    fn new(matcher: ResolverMatcher, strategy: Strategy, operator: &str) -> Self {
        ResolverRule {
            matcher,
            strategy,
            operator: Some(operator.to_string()),
        }
    }
}

/// Ordered resolver rules. Deserializing goes through the same validation
/// as [`ResolverTable::new`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawTable")]
pub struct ResolverTable {
    rules: Vec<ResolverRule>,
}

#[derive(Deserialize)]
struct RawTable {
    rules: Vec<ResolverRule>,
}

impl TryFrom<RawTable> for ResolverTable {
    type Error = Error;

    fn try_from(raw: RawTable) -> Result<Self> {
        ResolverTable::new(raw.rules)
    }
}

impl ResolverTable {
    /// Build a table from rules, rejecting ones that can never produce an
    /// estimate.
    pub fn new(rules: Vec<ResolverRule>) -> Result<Self> {
        let table = ResolverTable { rules };
        table.validate()?;
        Ok(table)
    }

    /// Load a table from a JSON file
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let text = fs::read_to_string(path.as_ref())?;
        let raw: RawTable = serde_json::from_str(&text)?;
        let table = ResolverTable::new(raw.rules)?;
        debug!(
            "loaded {} resolver rules from {}",
            table.rules.len(),
            path.as_ref().display()
        );
        Ok(table)
    }

    fn validate(&self) -> Result<()> {
        if self.rules.is_empty() {
            return Err(Error::InvalidConfig("no resolver rules".to_string()));
        }
        for (i, rule) in self.rules.iter().enumerate() {
            if rule.matcher.pattern().is_empty() {
                return Err(Error::InvalidConfig(format!("rule {i} has an empty pattern")));
            }
            if let Strategy::EpochBucket { width_secs: 0 } = rule.strategy {
                return Err(Error::InvalidConfig(format!(
                    "rule {i} has a zero epoch width"
                )));
            }
        }
        Ok(())
    }

    pub fn rules(&self) -> &[ResolverRule] {
        &self.rules
    }

    /// First rule matching the resolver identity
    pub fn lookup(&self, resolver: &str) -> Option<&ResolverRule> {
        self.rules.iter().find(|r| r.matcher.matches(resolver))
    }

    pub fn strategy_for(&self, resolver: &str) -> Option<Strategy> {
        self.lookup(resolver).map(|r| r.strategy)
    }

    pub fn operator_for(&self, resolver: &str) -> Option<&str> {
        self.lookup(resolver).and_then(|r| r.operator.as_deref())
    }

    /// Estimate the number of cache fills behind a group's observations.
    pub fn estimate(&self, group: &Group) -> Estimate {
        if !group.has_data() {
            return Estimate::NoData;
        }
        let Some(strategy) = self.strategy_for(group.resolver()) else {
            warn!("no estimator for resolver {}", group.resolver());
            return Estimate::UnsupportedResolver;
        };
        let count = strategy.count(group.expiry_instants());
        debug!(
            "{}/{}/{}: {} instants -> {} fills ({:?})",
            group.key().domain,
            group.key().vantage_point,
            group.resolver(),
            group.surviving_count(),
            count,
            strategy
        );
        Estimate::Count(count as u64)
    }
}

impl Default for ResolverTable {
    fn default() -> Self {
        use ResolverMatcher::{Contains, Exact};
        let run = Strategy::RunCoalescing;

        ResolverTable {
            rules: vec![
                ResolverRule::new(Exact("149.112.112.112".into()), run, "Quad9"),
                ResolverRule::new(Exact("1.1.1.1".into()), run, "Cloudflare"),
                ResolverRule::new(Contains("208.67".into()), run, "OpenDNS"),
                ResolverRule::new(Contains("8.8".into()), run, "Google"),
                ResolverRule::new(
                    Exact("9.9.9.9".into()),
                    Strategy::EpochBucket {
                        width_secs: QUAD9_EPOCH_SECS,
                    },
                    "Quad9",
                ),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_dispatch() {
        let table = ResolverTable::default();
        assert_eq!(table.strategy_for("1.1.1.1"), Some(Strategy::RunCoalescing));
        assert_eq!(
            table.strategy_for("149.112.112.112"),
            Some(Strategy::RunCoalescing)
        );
        assert_eq!(
            table.strategy_for("208.67.220.220"),
            Some(Strategy::RunCoalescing)
        );
        assert_eq!(table.strategy_for("8.8.4.4"), Some(Strategy::RunCoalescing));
        assert_eq!(
            table.strategy_for("9.9.9.9"),
            Some(Strategy::EpochBucket { width_secs: 10_800 })
        );
        assert_eq!(table.strategy_for("4.4.4.4"), None);
    }

    #[test]
    fn test_exact_does_not_match_prefix() {
        let table = ResolverTable::default();
        assert_eq!(table.strategy_for("1.1.1.10"), None);
        assert_eq!(table.strategy_for("9.9.9.99"), None);
    }

    #[test]
    fn test_operator_names() {
        let table = ResolverTable::default();
        assert_eq!(table.operator_for("8.8.8.8"), Some("Google"));
        assert_eq!(table.operator_for("9.9.9.9"), Some("Quad9"));
        assert_eq!(table.operator_for("4.4.4.4"), None);
    }

    #[test]
    fn test_rejects_empty_table() {
        assert!(matches!(
            ResolverTable::new(Vec::new()),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_rejects_zero_width() {
        let rule = ResolverRule {
            matcher: ResolverMatcher::Exact("9.9.9.9".into()),
            strategy: Strategy::EpochBucket { width_secs: 0 },
            operator: None,
        };
        assert!(matches!(
            ResolverTable::new(vec![rule]),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_from_path_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("resolvers.json");
        let table = ResolverTable::default();
        fs::write(&path, serde_json::to_string_pretty(&table).unwrap()).unwrap();

        let loaded = ResolverTable::from_path(&path).unwrap();
        assert_eq!(loaded, table);
    }

    #[test]
    fn test_from_path_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = ResolverTable::from_path(dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_from_path_rejects_empty_pattern() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("resolvers.json");
        fs::write(
            &path,
            r#"{"rules": [{"matcher": {"match": "exact", "pattern": ""},
                           "strategy": {"kind": "run_coalescing"}}]}"#,
        )
        .unwrap();

        let err = ResolverTable::from_path(&path).unwrap_err();
        match err {
            Error::InvalidConfig(msg) => assert!(msg.contains("empty pattern"), "{msg}"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_rejects_empty_pattern() {
        let rule = ResolverRule {
            matcher: ResolverMatcher::Contains(String::new()),
            strategy: Strategy::RunCoalescing,
            operator: None,
        };
        assert!(matches!(
            ResolverTable::new(vec![rule]),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_deserialize_validates() {
        assert!(serde_json::from_str::<ResolverTable>(r#"{"rules": []}"#).is_err());

        let zero_width = r#"{"rules": [{"matcher": {"match": "exact", "pattern": "9.9.9.9"},
                                        "strategy": {"kind": "epoch_bucket", "width_secs": 0}}]}"#;
        let err = serde_json::from_str::<ResolverTable>(zero_width).unwrap_err();
        assert!(err.to_string().contains("zero epoch width"), "{err}");
    }

    #[test]
    fn test_table_json_shape() {
        let json = r#"{
            "rules": [
                {"matcher": {"match": "exact", "pattern": "9.9.9.9"},
                 "strategy": {"kind": "epoch_bucket", "width_secs": 3600}},
                {"matcher": {"match": "contains", "pattern": "8.8"},
                 "strategy": {"kind": "run_coalescing"},
                 "operator": "Google"}
            ]
        }"#;
        let table: ResolverTable = serde_json::from_str(json).unwrap();
        assert_eq!(
            table.strategy_for("9.9.9.9"),
            Some(Strategy::EpochBucket { width_secs: 3600 })
        );
        assert_eq!(table.operator_for("8.8.8.8"), Some("Google"));
        assert_eq!(table.operator_for("9.9.9.9"), None);
    }
}
