use match_engine::{
    load_tier_defs, parse_tier_defs, GridCoord, MatchEngine, MatchSignal, SelectOutcome,
    TierIndex, TierSource, TierTable,
};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info, warn};

use super::config::{SessionConfig, TIER_PACK_ENV_VAR};

/// Tier pack compiled into the binary; used when neither the config nor
/// `POPS_TIERS` points at a pack on disk.
const EMBEDDED_TIER_PACK: &str = include_str!("../../../assets/tiers.xml");
const EMBEDDED_TIER_PACK_LABEL: &str = "<embedded tiers.xml>";

/// Safety valve for settle loops; at the default tick this is ~50 logical
/// seconds, far beyond any single cascade.
const MAX_SETTLE_TICKS: u32 = 1000;

include!("types.rs");
include!("driver.rs");

pub(crate) fn build_session(config: &SessionConfig) -> Result<Session, String> {
    let defs = resolve_tier_defs(config)?;
    let tiers = TierTable::new(defs).map_err(|error| error.to_string())?;
    let source = UniformTierSource::seeded(config.rng_seed);
    let engine = MatchEngine::new(
        config.grid_width,
        config.grid_height,
        tiers,
        Box::new(source),
    )
    .map_err(|error| error.to_string())?;
    Ok(Session::new(engine, config.tick_seconds))
}

fn resolve_tier_defs(
    config: &SessionConfig,
) -> Result<Vec<match_engine::TierDef>, String> {
    if let Some(path) = std::env::var_os(TIER_PACK_ENV_VAR).map(std::path::PathBuf::from) {
        return load_tier_defs(&path).map_err(|error| error.to_string());
    }
    if let Some(path) = &config.tier_defs_path {
        return load_tier_defs(path).map_err(|error| error.to_string());
    }
    parse_tier_defs(
        std::path::Path::new(EMBEDDED_TIER_PACK_LABEL),
        EMBEDDED_TIER_PACK,
    )
    .map_err(|error| error.to_string())
}

#[cfg(test)]
mod tests {
    include!("tests.rs");
}
