use anyhow::{Context as _, Result};
use axum::{
    extract::{
        Json,
        State,
    },
    Router,
    routing::{get, post},
    http::StatusCode,
};
use clap::Parser;
use fill_estimate::{ProbeRecord, ResolverTable, Summary, summarize_batch};
use log::{info, warn};
use serde::Serialize;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;

/// Serve cache-fill estimates over HTTP.
#[derive(Parser, Debug)]
#[command(name = "fill-api", version, about)]
struct Cli {
    #[arg(long, default_value = "0.0.0.0:8080")]
    listen: SocketAddr,

    /// JSON resolver table replacing the built-in one
    #[arg(long)]
    resolvers: Option<PathBuf>,
}

type SharedTable = Arc<ResolverTable>;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let table = match &cli.resolvers {
        Some(path) => ResolverTable::from_path(path)
            .with_context(|| format!("loading resolver table {}", path.display()))?,
        None => ResolverTable::default(),
    };

    let rtr = router(Arc::new(table));

    info!("Listening on {}", cli.listen);
    let listener = TcpListener::bind(cli.listen).await?;
    axum::serve(listener, rtr)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Exiting...");
        })
        .await?;

    Ok(())
}

fn router(table: SharedTable) -> Router {
    Router::new().
        route("/estimates", post(post_estimates)).
        route("/resolvers", get(get_resolvers)).
        with_state(table)
}

#[derive(Serialize)]
struct EstimatesResponse {
    record_count: usize,
    group_count: usize,
    summaries: Vec<Summary>,
}

async fn post_estimates(
    State(table): State<SharedTable>,
    Json(records): Json<Vec<ProbeRecord>>,
) -> Result<Json<EstimatesResponse>, (StatusCode, String)> {
    let record_count = records.len();
    let summaries = match summarize_batch(records, &table) {
        Ok(s) => s,
        Err(e) => {
            warn!("rejected batch of {} records: {}", record_count, e);

            return Err((StatusCode::UNPROCESSABLE_ENTITY, e.to_string()))
        }
    };
    info!("estimated {} groups from {} records", summaries.len(), record_count);

    Ok(Json(EstimatesResponse {
        record_count,
        group_count: summaries.len(),
        summaries,
    }))
}

async fn get_resolvers(State(table): State<SharedTable>) -> Json<ResolverTable> {
    Json(table.as_ref().clone())
}
