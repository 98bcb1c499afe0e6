use tracing::info;
use tracing_subscriber::EnvFilter;

use super::config::{load_session_config, SessionConfig};

pub(crate) struct AppWiring {
    pub(crate) config: SessionConfig,
}

pub(crate) fn build_app() -> Result<AppWiring, String> {
    init_tracing();
    info!("=== Connect the Pops Startup ===");

    let config = load_session_config()?;
    info!(
        grid_width = config.grid_width,
        grid_height = config.grid_height,
        rng_seed = config.rng_seed,
        "session_config_resolved"
    );
    Ok(AppWiring { config })
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}
