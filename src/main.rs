use std::sync::Arc;

use anyhow::Result;
use clap::Parser;

use codecritic::api::{self, AppState};
use codecritic::config::{AppConfig, env};
use codecritic::db;
use codecritic::history::PgHistoryStore;
use codecritic::llm;
use codecritic::logging;
use codecritic::service::AnalyzerService;

/// Code review agent service.
#[derive(Debug, Parser)]
#[command(name = "codecritic", version, about)]
struct Args {
    /// Address to bind.
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// Port to serve on.
    #[arg(long, env = "APPLICATION_PORT", default_value_t = 5000)]
    port: u16,

    /// Apply pending schema migrations before serving.
    #[arg(long)]
    migrate: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();
    logging::init();

    let config = AppConfig::from_env();

    let migrate_requested = args.migrate
        || (env::get_or("RUN_MAIN", "") == "true"
            && env::get_or("APPLICATION_MIGRATE", "") == "true");

    if migrate_requested {
        tracing::warn!("starting schema migrations");
        if let Err(e) = db::run_migrations(&config.database).await {
            tracing::error!("migration run failed: {}", e);
        }
    }

    let pool = db::connect(&config.database).await?;
    let provider = llm::create_llm_provider(&config.llm)?;
    let history = Arc::new(PgHistoryStore::new(pool));
    let service = AnalyzerService::new(provider, history, config.llm.language.clone());

    let state = AppState {
        service: Arc::new(service),
    };

    api::serve(
        state,
        &args.host,
        args.port,
        &config.server.allowed_origins(),
    )
    .await
}
