use harborwatch::config::{self, EngineConfig};
use harborwatch::logger;
use harborwatch::services::{ingest, EngineState};
use tokio::io::BufReader;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    let config = EngineConfig::from_env()?;
    logger::init(config.log_format);

    let db_pool = config::database::create_pool(&config).await?;
    config::database::init_schema(&db_pool).await?;

    let state = EngineState::new(db_pool, config);
    tracing::info!(
        day_rate = state.config.detention_day_rate,
        radius_nm = state.config.port_search_radius_nm,
        "reading ingest stream from stdin"
    );

    let stdin = BufReader::new(tokio::io::stdin());
    let stdout = tokio::io::stdout();

    tokio::select! {
        result = ingest::run_ingest(&state.detector, stdin, stdout) => {
            result?;
        }
        _ = shutdown_signal() => {
            tracing::info!("shutdown signal received, stopping ingest");
        }
    }

    state.db.close().await;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
