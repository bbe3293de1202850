use std::env;

use anyhow::Result;
use dotenvy::dotenv;
use genre_engine::{CombinationCount, DEFAULT_KEEP, PruneSummary, db, maintenance, variety};
use serde::Serialize;
use tracing::error;
use tracing_subscriber::EnvFilter;

#[derive(Serialize)]
struct MaintenanceReport {
    prune: PruneSummary,
    top_combinations: Vec<CombinationCount>,
}

#[tokio::main]
async fn main() {
    dotenv().ok();
    init_tracing();

    if let Err(err) = app_main().await {
        error!(?err, "maintenance run failed");
        std::process::exit(1);
    }
}

async fn app_main() -> Result<()> {
    let keep = env_i64("GENRE_HISTORY_KEEP", DEFAULT_KEEP);
    let report_limit = env_i64("GENRE_REPORT_LIMIT", 10);

    let pool = db::connect().await?;

    let prune = maintenance::prune_all(&pool, keep).await?;
    let top_combinations = variety::top_combinations(&pool, report_limit).await?;

    let report = MaintenanceReport {
        prune,
        top_combinations,
    };
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}

fn env_i64(name: &str, default: i64) -> i64 {
    env::var(name)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(default)
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}
