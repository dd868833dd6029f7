//! Cache-fill estimation from DNS probe TTL observations.
//!
//! A batch of [`ProbeRecord`]s is grouped per (domain, vantage point,
//! resolver); each group's expiry instants are then counted with the
//! strategy the [`ResolverTable`] assigns to its resolver.

mod error;
mod group;
mod record;
mod resolver;
mod summary;

pub mod coalesce;
pub mod epoch;

pub use error::{Error, Result};
pub use group::{Group, GroupKey, group_records};
pub use record::{ProbeRecord, RttMillis, canonical_domain, parse_arrival_time};
pub use resolver::{ResolverMatcher, ResolverRule, ResolverTable, Strategy};
pub use summary::{Estimate, NO_DATA, Summary, UNSUPPORTED_RESOLVER, summarize, summarize_batch};
