use dotenvy::dotenv;
use tracing::{error, info};

fn init_logging() {
    // .env first so RUST_LOG applies
    dotenv().ok();
    let format = common::utils::logging::LogFormat::from_env();
    common::utils::logging::init_logging(format);
    info!(service = "stats", event = "logger_init", ?format, "tracing subscriber initialized");
}

async fn run(cfg: configs::AppConfig) -> anyhow::Result<()> {
    let storage = service::storage::open_storage(&cfg).await?;
    let counts = service::stats_service::object_counts(storage.as_ref()).await?;
    println!("{}", serde_json::to_string_pretty(&counts)?);
    storage.close().await?;
    Ok(())
}

fn main() -> std::process::ExitCode {
    init_logging();

    let cfg = match configs::AppConfig::load_and_validate() {
        Ok(cfg) => cfg,
        Err(e) => {
            error!(service = "stats", event = "config_invalid", error = %e, "failed to load configuration");
            return std::process::ExitCode::FAILURE;
        }
    };

    let rt = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(rt) => rt,
        Err(e) => {
            error!(service = "stats", event = "runtime_build_failed", error = %e, "failed to build tokio runtime");
            return std::process::ExitCode::FAILURE;
        }
    };

    info!(
        service = "stats",
        event = "start",
        engine = ?cfg.storage.engine,
        version = env!("CARGO_PKG_VERSION"),
        "collecting object counts"
    );
    match rt.block_on(run(cfg)) {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(e) => {
            error!(service = "stats", event = "failed", error = %e, "stats run failed");
            std::process::ExitCode::FAILURE
        }
    }
}
