use thiserror::Error;

pub mod chain;
pub mod content;
pub mod engine;
pub mod grid;
pub mod schedule;
pub mod signal;
pub mod tiers;

pub use chain::{result_tier_index, SelectOutcome, SelectionChain};
pub use content::{
    load_tier_defs, parse_tier_defs, SourceLocation, TierCompileError, TierErrorCode,
};
pub use engine::MatchEngine;
pub use grid::{Cell, Column, Grid, GridCoord};
pub use schedule::{SettleQueue, SettleTask};
pub use signal::{
    MatchSignal, MatchSignalCounts, MatchSignalKind, SignalBus, VisualBus, VisualRequest,
};
pub use tiers::{
    RoundRobinTierSource, TierColor, TierDef, TierIndex, TierSource, TierTable, ValueTier,
    BASE_TIER_POOL,
};

#[derive(Debug, Error)]
pub enum SetupError {
    #[error("tier table must contain at least one tier")]
    EmptyTierTable,
    #[error("grid must be at least 1x1, got {width}x{height}")]
    GridTooSmall { width: u32, height: u32 },
}
