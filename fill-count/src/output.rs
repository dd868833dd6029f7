use anyhow::{Context as _, Result};
use chrono::{DateTime, NaiveDate, Utc};
use fill_estimate::Summary;
use log::info;
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

const HEADER: [&str; 9] = [
    "timestamp",
    "domain",
    "vantage_point",
    "resolver",
    "pop_location",
    "cache_count",
    "last_probe",
    "ttls",
    "rtt",
];

/// Resolvers without an operator name share this file
const OTHER_OPERATOR: &str = "Other";

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

fn row(summary: &Summary, generated_at: DateTime<Utc>) -> [String; 9] {
    [
        generated_at.format(TIME_FORMAT).to_string(),
        summary.domain.clone(),
        summary.vantage_point.clone(),
        summary.resolver.clone(),
        summary.pop_location.clone(),
        summary.estimate.to_string(),
        summary
            .last_probe
            .map(|t| t.format(TIME_FORMAT).to_string())
            .unwrap_or_default(),
        summary.ttls_joined(),
        summary.rtts_joined(),
    ]
}

/// Write every summary as one CSV stream.
pub fn write_csv<W: Write>(
    out: W,
    summaries: &[Summary],
    generated_at: DateTime<Utc>,
) -> Result<()> {
    let mut writer = csv::Writer::from_writer(out);
    writer.write_record(HEADER)?;
    for summary in summaries {
        writer.write_record(row(summary, generated_at))?;
    }
    writer.flush()?;
    Ok(())
}

pub fn analysis_file_name(operator: &str, date: NaiveDate) -> String {
    format!("{operator}_analysis_{}.csv", date.format("%Y-%m-%d"))
}

/// Write one CSV file per resolver operator into `dir`, returning the paths
/// written.
pub fn write_per_operator(
    dir: &Path,
    summaries: &[Summary],
    generated_at: DateTime<Utc>,
) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;

    let mut by_operator: BTreeMap<&str, Vec<&Summary>> = BTreeMap::new();
    for summary in summaries {
        let operator = summary.operator.as_deref().unwrap_or(OTHER_OPERATOR);
        by_operator.entry(operator).or_default().push(summary);
    }

    let mut written = Vec::new();
    for (operator, rows) in by_operator {
        let path = dir.join(analysis_file_name(operator, generated_at.date_naive()));
        let file = File::create(&path).with_context(|| format!("creating {}", path.display()))?;
        let mut writer = csv::Writer::from_writer(file);
        writer.write_record(HEADER)?;
        for summary in &rows {
            writer.write_record(row(summary, generated_at))?;
        }
        writer.flush()?;
        info!("wrote {} rows to {}", rows.len(), path.display());
        written.push(path);
    }
    Ok(written)
}
