use anyhow::Context as _;
use clap::Parser;
use fill_estimate::{Estimate, ResolverTable, summarize_batch};
#[rustfmt::skip]
use log::{info, warn};
use std::{io, path::PathBuf};

mod input;
mod output;

/// Estimate how many resolver cache copies were filled per domain, vantage
/// point and resolver from a batch of normalized DNS probe records.
#[derive(Parser, Debug)]
#[command(name = "fill-count", version, about)]
struct Cli {
    /// Newline-delimited JSON probe records, or `-` for stdin
    input: PathBuf,

    /// JSON resolver table replacing the built-in one
    #[arg(long)]
    resolvers: Option<PathBuf>,

    /// Directory for per-operator analysis CSV files
    #[arg(long, default_value = ".", conflicts_with = "stdout")]
    output_dir: PathBuf,

    /// Write a single CSV stream to stdout instead of per-operator files
    #[arg(long)]
    stdout: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let table = match &cli.resolvers {
        Some(path) => ResolverTable::from_path(path)
            .with_context(|| format!("loading resolver table {}", path.display()))?,
        None => ResolverTable::default(),
    };

    let records = input::read_records(&cli.input)?;
    info!("read {} probe records", records.len());

    let summaries = summarize_batch(records, &table).context("estimating cache fills")?;
    let no_data = summaries
        .iter()
        .filter(|s| s.estimate == Estimate::NoData)
        .count();
    let unsupported = summaries
        .iter()
        .filter(|s| s.estimate == Estimate::UnsupportedResolver)
        .count();
    info!(
        "{} groups ({} no data, {} unsupported resolver)",
        summaries.len(),
        no_data,
        unsupported
    );
    if unsupported > 0 {
        warn!("{unsupported} groups use a resolver with no estimator");
    }

    let generated_at = chrono::Utc::now();
    if cli.stdout {
        output::write_csv(io::stdout().lock(), &summaries, generated_at)?;
    } else {
        let written = output::write_per_operator(&cli.output_dir, &summaries, generated_at)?;
        info!("wrote {} analysis files", written.len());
    }

    Ok(())
}
