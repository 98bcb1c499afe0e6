/// Position of a tier in the ordered tier table. Index equals position in the
/// sequence; assigned once at setup and immutable after.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TierIndex(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TierColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValueTier {
    pub index: TierIndex,
    pub value: u32,
    pub color: TierColor,
    pub score: u32,
}

/// Tier definition before the table assigns indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TierDef {
    pub value: u32,
    pub color: TierColor,
    pub score: u32,
}

/// Fresh cells (initial population and refills) draw uniformly from this many
/// of the lowest tiers, or fewer if the table itself is smaller.
pub const BASE_TIER_POOL: usize = 4;

/// Ordered, immutable tier sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TierTable {
    tiers: Vec<ValueTier>,
}

impl TierTable {
    pub fn new(defs: Vec<TierDef>) -> Result<Self, crate::SetupError> {
        if defs.is_empty() {
            return Err(crate::SetupError::EmptyTierTable);
        }
        let tiers = defs
            .into_iter()
            .enumerate()
            .map(|(index, def)| ValueTier {
                index: TierIndex(index),
                value: def.value,
                color: def.color,
                score: def.score,
            })
            .collect();
        Ok(Self { tiers })
    }

    pub fn len(&self) -> usize {
        self.tiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiers.is_empty()
    }

    pub fn get(&self, index: TierIndex) -> Option<&ValueTier> {
        self.tiers.get(index.0)
    }

    pub fn max_index(&self) -> TierIndex {
        TierIndex(self.tiers.len() - 1)
    }

    pub fn base_pool_len(&self) -> usize {
        BASE_TIER_POOL.min(self.tiers.len())
    }

    pub fn tiers(&self) -> &[ValueTier] {
        &self.tiers
    }
}

/// Supplies the tier for freshly generated cells. Implementations pick
/// uniformly in `0..base_pool`; the engine never draws outside that range.
pub trait TierSource {
    fn next_base_tier(&mut self, base_pool: usize) -> TierIndex;
}

/// Deterministic round-robin source. Handy for tests and headless runs that
/// need reproducible boards without an RNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct RoundRobinTierSource {
    cursor: usize,
}

impl TierSource for RoundRobinTierSource {
    fn next_base_tier(&mut self, base_pool: usize) -> TierIndex {
        let tier = TierIndex(self.cursor % base_pool.max(1));
        self.cursor = self.cursor.wrapping_add(1);
        tier
    }
}

#[cfg(test)]
pub(crate) fn test_tier_defs(count: usize) -> Vec<TierDef> {
    (0..count)
        .map(|i| TierDef {
            value: 2u32 << i,
            color: TierColor {
                r: (i * 40) as u8,
                g: 128,
                b: 255 - (i * 30) as u8,
            },
            score: 2u32 << i,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_assigns_indices_in_order() {
        let table = TierTable::new(test_tier_defs(6)).expect("table");
        for (position, tier) in table.tiers().iter().enumerate() {
            assert_eq!(tier.index, TierIndex(position));
        }
        assert_eq!(table.max_index(), TierIndex(5));
    }

    #[test]
    fn empty_table_is_a_setup_error() {
        assert!(matches!(
            TierTable::new(Vec::new()),
            Err(crate::SetupError::EmptyTierTable)
        ));
    }

    #[test]
    fn base_pool_is_capped_at_four() {
        let large = TierTable::new(test_tier_defs(9)).expect("table");
        assert_eq!(large.base_pool_len(), 4);
        let small = TierTable::new(test_tier_defs(2)).expect("table");
        assert_eq!(small.base_pool_len(), 2);
    }

    #[test]
    fn round_robin_source_stays_inside_pool() {
        let mut source = RoundRobinTierSource::default();
        for _ in 0..16 {
            let tier = source.next_base_tier(4);
            assert!(tier.0 < 4);
        }
    }
}
