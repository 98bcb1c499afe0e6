use crate::grid::GridCoord;
use crate::tiers::TierColor;

/// Signals the engine emits to presentation collaborators. They are queued on
/// the engine and drained by the caller each tick; there are no subscriber
/// closures to leak or mismatch on unsubscribe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchSignal {
    /// The selection chain changed; payload is the tier the merge would
    /// produce if the gesture ended now. Drives the floating preview.
    ChainChanged { value: u32, color: TierColor },
    /// The gesture ended and the chain is empty again. Hides the preview.
    SelectionClosed,
    /// A chain of length >= 2 resolved into a merge.
    MergeResolved {
        terminal: GridCoord,
        value: u32,
        score: u32,
        chain_len: usize,
    },
    /// No adjacent same-tier pair remains on a settled board.
    GameOver,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchSignalKind {
    ChainChanged,
    SelectionClosed,
    MergeResolved,
    GameOver,
}

impl MatchSignal {
    pub fn kind(&self) -> MatchSignalKind {
        match self {
            Self::ChainChanged { .. } => MatchSignalKind::ChainChanged,
            Self::SelectionClosed => MatchSignalKind::SelectionClosed,
            Self::MergeResolved { .. } => MatchSignalKind::MergeResolved,
            Self::GameOver => MatchSignalKind::GameOver,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MatchSignalCounts {
    pub total: u32,
    pub chain_changed: u32,
    pub selection_closed: u32,
    pub merge_resolved: u32,
    pub game_over: u32,
}

impl MatchSignalCounts {
    fn record(&mut self, kind: MatchSignalKind) {
        self.total = self.total.saturating_add(1);
        match kind {
            MatchSignalKind::ChainChanged => {
                self.chain_changed = self.chain_changed.saturating_add(1)
            }
            MatchSignalKind::SelectionClosed => {
                self.selection_closed = self.selection_closed.saturating_add(1)
            }
            MatchSignalKind::MergeResolved => {
                self.merge_resolved = self.merge_resolved.saturating_add(1)
            }
            MatchSignalKind::GameOver => self.game_over = self.game_over.saturating_add(1),
        }
    }
}

#[derive(Default)]
pub struct SignalBus {
    queued: Vec<MatchSignal>,
    lifetime_counts: MatchSignalCounts,
}

impl SignalBus {
    pub fn emit(&mut self, signal: MatchSignal) {
        self.lifetime_counts.record(signal.kind());
        self.queued.push(signal);
    }

    pub fn drain(&mut self) -> Vec<MatchSignal> {
        std::mem::take(&mut self.queued)
    }

    pub fn lifetime_counts(&self) -> MatchSignalCounts {
        self.lifetime_counts
    }
}

/// Fire-and-forget visual commands for the presentation layer. The engine
/// never waits on these; settle timing is owned by its own scheduler.
#[derive(Debug, Clone, PartialEq)]
pub enum VisualRequest {
    SelectPulse {
        coord: GridCoord,
    },
    DeselectPulse {
        coord: GridCoord,
    },
    /// The line traced through the current chain, in selection order, tinted
    /// with the chain's base tier color. An empty path clears the line.
    ChainOutline {
        path: Vec<GridCoord>,
        color: Option<TierColor>,
    },
    /// Slide a merged-away cell's visual onto the terminal cell.
    MoveToCell {
        from: GridCoord,
        to: GridCoord,
        duration_seconds: f32,
    },
    ShowTier {
        coord: GridCoord,
        value: u32,
        color: TierColor,
    },
    PunchScale {
        coord: GridCoord,
    },
    ScaleIn {
        coord: GridCoord,
        duration_seconds: f32,
    },
}

#[derive(Default)]
pub struct VisualBus {
    queued: Vec<VisualRequest>,
}

impl VisualBus {
    pub fn emit(&mut self, request: VisualRequest) {
        self.queued.push(request);
    }

    pub fn drain(&mut self) -> Vec<VisualRequest> {
        std::mem::take(&mut self.queued)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drain_empties_the_queue_and_keeps_counts() {
        let mut bus = SignalBus::default();
        bus.emit(MatchSignal::SelectionClosed);
        bus.emit(MatchSignal::GameOver);
        let drained = bus.drain();
        assert_eq!(
            drained,
            vec![MatchSignal::SelectionClosed, MatchSignal::GameOver]
        );
        assert!(bus.drain().is_empty());

        let counts = bus.lifetime_counts();
        assert_eq!(counts.total, 2);
        assert_eq!(counts.selection_closed, 1);
        assert_eq!(counts.game_over, 1);
        assert_eq!(counts.chain_changed, 0);
    }
}
