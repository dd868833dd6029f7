use anyhow::{Context as _, Result};
use fill_estimate::ProbeRecord;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

/// Read newline-delimited JSON probe records from a file, or stdin for `-`.
pub fn read_records(path: &Path) -> Result<Vec<ProbeRecord>> {
    if path == Path::new("-") {
        return parse_lines(io::stdin().lock());
    }
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    parse_lines(BufReader::new(file)).with_context(|| format!("reading {}", path.display()))
}

pub fn parse_lines<R: BufRead>(reader: R) -> Result<Vec<ProbeRecord>> {
    let mut records = Vec::new();
    for (n, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let record: ProbeRecord =
            serde_json::from_str(&line).with_context(|| format!("line {}", n + 1))?;
        records.push(record);
    }
    Ok(records)
}
