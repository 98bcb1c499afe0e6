use crate::grid::GridCoord;
use crate::tiers::TierIndex;

/// The ordered set of cells selected during one pointer gesture. Validation
/// against adjacency and tier rules happens in the engine, which owns the
/// cells; the chain only tracks insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionChain {
    coords: Vec<GridCoord>,
}

/// What `begin_or_extend_selection` did with a pointer event. `Ignored` is a
/// normal outcome, never an error: mis-clicks must not disturb the gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectOutcome {
    Started,
    Extended,
    SteppedBack,
    Ignored,
}

impl SelectionChain {
    pub fn len(&self) -> usize {
        self.coords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coords.is_empty()
    }

    pub fn coords(&self) -> &[GridCoord] {
        &self.coords
    }

    pub fn first(&self) -> Option<GridCoord> {
        self.coords.first().copied()
    }

    pub fn last(&self) -> Option<GridCoord> {
        self.coords.last().copied()
    }

    pub fn second_to_last(&self) -> Option<GridCoord> {
        if self.coords.len() < 2 {
            return None;
        }
        Some(self.coords[self.coords.len() - 2])
    }

    pub fn contains(&self, coord: GridCoord) -> bool {
        self.coords.contains(&coord)
    }

    pub fn push(&mut self, coord: GridCoord) {
        self.coords.push(coord);
    }

    /// Removes and returns the most recently selected coord (step-back).
    pub fn pop(&mut self) -> Option<GridCoord> {
        self.coords.pop()
    }

    pub fn clear(&mut self) {
        self.coords.clear();
    }
}

/// Merge growth rule: every two selected cells beyond the first promote the
/// result by one tier, capped at the highest tier.
pub fn result_tier_index(base: TierIndex, chain_len: usize, tier_count: usize) -> TierIndex {
    debug_assert!(tier_count > 0);
    let promoted = base.0 + chain_len / 2;
    TierIndex(promoted.min(tier_count - 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coord(x: i32, y: i32) -> GridCoord {
        GridCoord { x, y }
    }

    #[test]
    fn insertion_order_is_preserved() {
        let mut chain = SelectionChain::default();
        chain.push(coord(0, 0));
        chain.push(coord(1, 0));
        chain.push(coord(1, 1));
        assert_eq!(chain.coords(), &[coord(0, 0), coord(1, 0), coord(1, 1)]);
        assert_eq!(chain.last(), Some(coord(1, 1)));
        assert_eq!(chain.second_to_last(), Some(coord(1, 0)));
    }

    #[test]
    fn second_to_last_needs_two_elements() {
        let mut chain = SelectionChain::default();
        assert_eq!(chain.second_to_last(), None);
        chain.push(coord(0, 0));
        assert_eq!(chain.second_to_last(), None);
    }

    #[test]
    fn result_tier_promotes_per_two_cells() {
        // Length 1 leaves the base tier untouched.
        assert_eq!(result_tier_index(TierIndex(0), 1, 8), TierIndex(0));
        // Lengths 2 and 3 promote by one.
        assert_eq!(result_tier_index(TierIndex(0), 2, 8), TierIndex(1));
        assert_eq!(result_tier_index(TierIndex(0), 3, 8), TierIndex(1));
        // Lengths 4 and 5 promote by two.
        assert_eq!(result_tier_index(TierIndex(2), 4, 8), TierIndex(4));
        assert_eq!(result_tier_index(TierIndex(2), 5, 8), TierIndex(4));
    }

    #[test]
    fn result_tier_is_capped_at_the_highest_tier() {
        assert_eq!(result_tier_index(TierIndex(6), 5, 8), TierIndex(7));
        assert_eq!(result_tier_index(TierIndex(7), 9, 8), TierIndex(7));
    }
}
