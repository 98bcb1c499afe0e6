#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum SessionPhase {
    #[default]
    Menu,
    Playing,
    GameOver,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct SessionStats {
    gestures_played: u32,
    merges_resolved: u32,
    score: u32,
    highest_value_reached: u32,
}

impl SessionStats {
    fn record_merge(&mut self, value: u32, score: u32) {
        self.merges_resolved = self.merges_resolved.saturating_add(1);
        self.score = self.score.saturating_add(score);
        self.highest_value_reached = self.highest_value_reached.max(value);
    }
}

/// Uniform pick among the base tiers, seeded for reproducible sessions.
struct UniformTierSource {
    rng: SmallRng,
}

impl UniformTierSource {
    fn seeded(seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
        }
    }
}

impl TierSource for UniformTierSource {
    fn next_base_tier(&mut self, base_pool: usize) -> TierIndex {
        TierIndex(self.rng.random_range(0..base_pool.max(1)))
    }
}
