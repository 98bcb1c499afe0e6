use tracing::{debug, info};

use crate::chain::{result_tier_index, SelectOutcome, SelectionChain};
use crate::grid::{Grid, GridCoord};
use crate::schedule::{SettleQueue, SettleTask};
use crate::signal::{MatchSignal, MatchSignalCounts, SignalBus, VisualBus, VisualRequest};
use crate::tiers::{TierIndex, TierSource, TierTable, ValueTier};
use crate::SetupError;

const MERGE_TRAVEL_SECONDS: f32 = 0.25;
const UPGRADE_DELAY_SECONDS: f32 = 0.4;
const UPGRADE_PUNCH_SECONDS: f32 = 0.15;
const RELOCATE_TRAVEL_SECONDS: f32 = 0.3;
const REFILL_DELAY_SECONDS: f32 = 0.4;
const REFILL_SCALE_SECONDS: f32 = 0.1;
const RESUME_CHECK_DELAY_SECONDS: f32 = 0.5;
const INITIAL_SPAWN_MIN_SECONDS: f32 = 0.5;
const INITIAL_SPAWN_STAGGER_SECONDS: f32 = 0.1;

/// The grid match engine: owns the board, the in-progress selection chain and
/// the settle scheduler. Presentation collaborators feed it pointer gestures
/// and drain its signal/visual queues; they never write cell state directly.
pub struct MatchEngine {
    grid: Grid,
    tiers: TierTable,
    chain: SelectionChain,
    queue: SettleQueue,
    signals: SignalBus,
    visuals: VisualBus,
    tier_source: Box<dyn TierSource>,
    touching: bool,
}

impl MatchEngine {
    pub fn new(
        width: u32,
        height: u32,
        tiers: TierTable,
        tier_source: Box<dyn TierSource>,
    ) -> Result<Self, SetupError> {
        if width == 0 || height == 0 {
            return Err(SetupError::GridTooSmall { width, height });
        }
        let mut engine = Self {
            grid: Grid::new(width, height),
            tiers,
            chain: SelectionChain::default(),
            queue: SettleQueue::default(),
            signals: SignalBus::default(),
            visuals: VisualBus::default(),
            tier_source,
            touching: false,
        };
        engine.populate_initial_board();
        Ok(engine)
    }

    fn populate_initial_board(&mut self) {
        let coords: Vec<GridCoord> = self.grid.cells().map(|cell| cell.coord).collect();
        for coord in coords {
            let tier = self.draw_base_tier();
            let delay = initial_spawn_delay_seconds(coord);
            let cell = self
                .grid
                .cell_mut(coord)
                .expect("populate only visits in-bounds coords");
            cell.tier = tier;
            cell.is_empty = false;
            cell.is_settled = false;
            self.visuals.emit(VisualRequest::ScaleIn {
                coord,
                duration_seconds: delay,
            });
            self.queue
                .schedule(delay, SettleTask::ActivateCell { coord });
        }
        debug!(
            width = self.grid.width(),
            height = self.grid.height(),
            "board_populated"
        );
    }

    fn draw_base_tier(&mut self) -> TierIndex {
        let pool = self.tiers.base_pool_len();
        let drawn = self.tier_source.next_base_tier(pool);
        // A misbehaving source must not place an out-of-table tier.
        TierIndex(drawn.0.min(pool.saturating_sub(1)))
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn tiers(&self) -> &TierTable {
        &self.tiers
    }

    pub fn chain_len(&self) -> usize {
        self.chain.len()
    }

    pub fn is_touching(&self) -> bool {
        self.touching
    }

    /// True while any settle task other than a resumable sweep is pending.
    pub fn board_is_settling(&self) -> bool {
        self.queue.board_is_settling()
    }

    /// True once nothing at all is scheduled, resumable sweeps included.
    pub fn settle_queue_is_idle(&self) -> bool {
        self.queue.is_idle()
    }

    pub fn now_seconds(&self) -> f32 {
        self.queue.now_seconds()
    }

    pub fn drain_signals(&mut self) -> Vec<MatchSignal> {
        self.signals.drain()
    }

    pub fn drain_visuals(&mut self) -> Vec<VisualRequest> {
        self.visuals.drain()
    }

    pub fn signal_counts(&self) -> MatchSignalCounts {
        self.signals.lifetime_counts()
    }

    // ---- gesture input -------------------------------------------------

    pub fn pointer_down(&mut self, coord: GridCoord) -> SelectOutcome {
        self.touching = true;
        self.begin_or_extend_selection(coord)
    }

    /// Pointer-enter only counts while the touch is held, and it can only
    /// grow or shrink an active chain; a fresh chain needs a pointer-down.
    pub fn pointer_enter(&mut self, coord: GridCoord) -> SelectOutcome {
        if !self.touching || self.chain.is_empty() {
            return SelectOutcome::Ignored;
        }
        self.begin_or_extend_selection(coord)
    }

    pub fn pointer_up(&mut self) {
        self.touching = false;
        self.end_selection();
    }

    /// Chain state machine. Invalid targets are ignored silently; a mis-click
    /// never raises an error or disturbs the current chain.
    pub fn begin_or_extend_selection(&mut self, coord: GridCoord) -> SelectOutcome {
        let Some(cell) = self.grid.cell(coord) else {
            return SelectOutcome::Ignored;
        };
        if !cell.is_settled || cell.is_empty {
            return SelectOutcome::Ignored;
        }
        let cell_tier = cell.tier;
        let cell_selected = cell.is_selected;

        let Some(last) = self.chain.last() else {
            self.select_cell(coord);
            return SelectOutcome::Started;
        };

        let last_tier = self
            .grid
            .cell(last)
            .expect("chain coords stay in bounds")
            .tier;
        if coord != last && coord.is_adjacent(last) && cell_tier == last_tier && !cell_selected {
            self.select_cell(coord);
            return SelectOutcome::Extended;
        }

        if self.chain.len() >= 2 && self.chain.second_to_last() == Some(coord) && cell_selected {
            self.step_back();
            return SelectOutcome::SteppedBack;
        }

        SelectOutcome::Ignored
    }

    fn select_cell(&mut self, coord: GridCoord) {
        self.chain.push(coord);
        if let Some(cell) = self.grid.cell_mut(coord) {
            cell.is_selected = true;
        }
        self.visuals.emit(VisualRequest::SelectPulse { coord });
        self.emit_chain_changed();
    }

    /// Undo-by-revisiting-previous-cell: drop the chain's last element.
    fn step_back(&mut self) {
        let Some(removed) = self.chain.pop() else {
            return;
        };
        if let Some(cell) = self.grid.cell_mut(removed) {
            cell.is_selected = false;
        }
        self.visuals
            .emit(VisualRequest::DeselectPulse { coord: removed });
        self.emit_chain_changed();
    }

    fn emit_chain_changed(&mut self) {
        let Some(preview) = self.current_preview_value() else {
            return;
        };
        let (value, color) = (preview.value, preview.color);
        let outline_color = self
            .chain
            .first()
            .and_then(|first| self.grid.cell(first))
            .and_then(|cell| self.tiers.get(cell.tier))
            .map(|tier| tier.color);
        self.signals.emit(MatchSignal::ChainChanged { value, color });
        self.visuals.emit(VisualRequest::ChainOutline {
            path: self.chain.coords().to_vec(),
            color: outline_color,
        });
    }

    /// The tier the merge would produce if the gesture ended right now.
    /// `None` while the chain is empty.
    pub fn current_preview_value(&self) -> Option<&ValueTier> {
        let first = self.chain.first()?;
        let base = self.grid.cell(first)?.tier;
        let result = result_tier_index(base, self.chain.len(), self.tiers.len());
        self.tiers.get(result)
    }

    /// Pointer-up: resolve the gesture. A lone selected cell is released
    /// without a merge; two or more cells merge into the chain's last cell.
    pub fn end_selection(&mut self) {
        match self.chain.len() {
            0 => {}
            1 => {
                let coord = self.chain.first().expect("len checked");
                if let Some(cell) = self.grid.cell_mut(coord) {
                    cell.is_selected = false;
                }
                self.visuals.emit(VisualRequest::DeselectPulse { coord });
                self.chain.clear();
                self.clear_chain_outline();
                self.signals.emit(MatchSignal::SelectionClosed);
            }
            chain_len => {
                self.resolve_merge(chain_len);
            }
        }
    }

    fn resolve_merge(&mut self, chain_len: usize) {
        let first = self.chain.first().expect("chain is non-empty");
        let terminal = self.chain.last().expect("chain is non-empty");
        let base = self
            .grid
            .cell(first)
            .expect("chain coords stay in bounds")
            .tier;
        let result = result_tier_index(base, chain_len, self.tiers.len());

        for coord in self.chain.coords().to_vec() {
            let cell = self
                .grid
                .cell_mut(coord)
                .expect("chain coords stay in bounds");
            cell.is_selected = false;
            cell.is_settled = false;
            if coord == terminal {
                continue;
            }
            cell.is_empty = true;
            self.visuals.emit(VisualRequest::MoveToCell {
                from: coord,
                to: terminal,
                duration_seconds: MERGE_TRAVEL_SECONDS,
            });
        }
        // The terminal waits for the others to visually arrive before it
        // adopts the promoted tier; gap-fill runs off that settle, not here.
        self.queue.schedule(
            UPGRADE_DELAY_SECONDS,
            SettleTask::UpgradeCell {
                coord: terminal,
                tier: result,
            },
        );
        self.queue
            .schedule(RESUME_CHECK_DELAY_SECONDS, SettleTask::ResumableSweep);

        let result_tier = self.tiers.get(result).expect("result tier is clamped");
        debug!(
            chain_len,
            result_value = result_tier.value,
            terminal_x = terminal.x,
            terminal_y = terminal.y,
            "merge_resolved"
        );
        self.signals.emit(MatchSignal::MergeResolved {
            terminal,
            value: result_tier.value,
            score: result_tier.score,
            chain_len,
        });

        self.chain.clear();
        self.clear_chain_outline();
        self.signals.emit(MatchSignal::SelectionClosed);
    }

    fn clear_chain_outline(&mut self) {
        self.visuals.emit(VisualRequest::ChainOutline {
            path: Vec::new(),
            color: None,
        });
    }

    // ---- settle scheduling ---------------------------------------------

    /// Advances the logical clock and applies every settle task whose time
    /// has come, in (fire time, schedule order).
    pub fn advance(&mut self, dt_seconds: f32) {
        for task in self.queue.advance(dt_seconds) {
            self.apply_settle_task(task);
        }
    }

    fn apply_settle_task(&mut self, task: SettleTask) {
        match task {
            SettleTask::UpgradeCell { coord, tier } => {
                let cell = self
                    .grid
                    .cell_mut(coord)
                    .expect("scheduled coords stay in bounds");
                cell.tier = tier;
                let view = self.tiers.get(tier).expect("upgrade tier is clamped");
                self.visuals.emit(VisualRequest::ShowTier {
                    coord,
                    value: view.value,
                    color: view.color,
                });
                self.visuals.emit(VisualRequest::PunchScale { coord });
                self.queue
                    .schedule(UPGRADE_PUNCH_SECONDS, SettleTask::ActivateCell { coord });
            }
            SettleTask::RelocateCell { from, to } => {
                let tier = self
                    .grid
                    .cell(from)
                    .expect("scheduled coords stay in bounds")
                    .tier;
                let target = self
                    .grid
                    .cell_mut(to)
                    .expect("scheduled coords stay in bounds");
                target.tier = tier;
                target.is_empty = false;
                target.is_settled = true;
                let view = self.tiers.get(tier).expect("cell tiers stay in table");
                self.visuals.emit(VisualRequest::ShowTier {
                    coord: to,
                    value: view.value,
                    color: view.color,
                });
                let source = self
                    .grid
                    .cell_mut(from)
                    .expect("scheduled coords stay in bounds");
                source.is_empty = true;
            }
            SettleTask::RefillCell { coord } => {
                let tier = self.draw_base_tier();
                let cell = self
                    .grid
                    .cell_mut(coord)
                    .expect("scheduled coords stay in bounds");
                cell.tier = tier;
                cell.is_empty = false;
                self.visuals.emit(VisualRequest::ScaleIn {
                    coord,
                    duration_seconds: REFILL_SCALE_SECONDS,
                });
                self.queue
                    .schedule(REFILL_SCALE_SECONDS, SettleTask::ActivateCell { coord });
            }
            SettleTask::ActivateCell { coord } => {
                let cell = self
                    .grid
                    .cell_mut(coord)
                    .expect("scheduled coords stay in bounds");
                cell.is_settled = true;
                self.gap_fill();
            }
            SettleTask::ResumableSweep => {
                self.check_resumable();
            }
        }
    }

    // ---- gap-fill ------------------------------------------------------

    /// Collapses each column's first gap and schedules refills for the slots
    /// left at the top. Runs as a continuation of settle tasks and again
    /// after every fill animation completes, converging to a full column.
    /// A no-op on columns without empty cells.
    pub fn gap_fill(&mut self) {
        for x in 0..self.grid.width() as i32 {
            // Settle-before-next-pass as an explicit precondition: a column
            // still owned by pending tasks is skipped, not re-planned.
            if self.queue.owns_column(x) {
                continue;
            }
            self.plan_column_gap_fill(x);
        }
    }

    fn plan_column_gap_fill(&mut self, x: i32) {
        let height = self.grid.height() as i32;
        let column = x as usize;
        let first_empty_from_bottom = (0..height)
            .rev()
            .find(|row| self.grid.columns()[column].cells()[*row as usize].is_empty);
        let Some(gap_row) = first_empty_from_bottom else {
            return;
        };

        // Bottom-to-top partition above (and including) the gap. Both lists
        // keep descending row order so index 0 is the lowest slot.
        let mut empty_rows: Vec<i32> = Vec::new();
        let mut full_rows: Vec<i32> = Vec::new();
        for row in (0..=gap_row).rev() {
            if self.grid.columns()[column].cells()[row as usize].is_empty {
                empty_rows.push(row);
            } else {
                full_rows.push(row);
            }
        }

        if full_rows.is_empty() {
            // Nothing left to drop; regenerate the whole stretch immediately.
            for row in empty_rows {
                self.schedule_refill(GridCoord { x, y: row }, 0.0);
            }
            return;
        }

        let mut slot_pool = empty_rows;
        for from_row in full_rows {
            let to_row = slot_pool.remove(0);
            let from = GridCoord { x, y: from_row };
            let to = GridCoord { x, y: to_row };
            self.grid
                .cell_mut(from)
                .expect("column rows stay in bounds")
                .is_settled = false;
            self.grid
                .cell_mut(to)
                .expect("column rows stay in bounds")
                .is_settled = false;
            self.visuals.emit(VisualRequest::MoveToCell {
                from,
                to,
                duration_seconds: RELOCATE_TRAVEL_SECONDS,
            });
            self.queue
                .schedule(RELOCATE_TRAVEL_SECONDS, SettleTask::RelocateCell { from, to });
            // The vacated slot joins the pool; keep it sorted descending so
            // the lowest open slot is always served first.
            slot_pool.push(from_row);
            slot_pool.sort_unstable_by(|a, b| b.cmp(a));
        }

        // Whatever is still open has bubbled to the top; fresh cells arrive
        // there after a short delay.
        for row in slot_pool {
            self.schedule_refill(GridCoord { x, y: row }, REFILL_DELAY_SECONDS);
        }
    }

    fn schedule_refill(&mut self, coord: GridCoord, delay_seconds: f32) {
        self.grid
            .cell_mut(coord)
            .expect("column rows stay in bounds")
            .is_settled = false;
        self.queue
            .schedule(delay_seconds, SettleTask::RefillCell { coord });
    }

    // ---- resumability --------------------------------------------------

    /// Neighbour-only scan: true if any 8-adjacent pair of non-empty cells
    /// shares a tier.
    pub fn is_resumable(&self) -> bool {
        for cell in self.grid.cells() {
            if cell.is_empty {
                continue;
            }
            for neighbour in self.grid.neighbours(cell.coord) {
                let other = self
                    .grid
                    .cell(neighbour)
                    .expect("neighbours stay in bounds");
                if !other.is_empty && other.tier == cell.tier {
                    return true;
                }
            }
        }
        false
    }

    /// Judge game-over. Re-arms itself instead of judging while a merge's
    /// refill cascade is still in flight.
    pub fn check_resumable(&mut self) {
        // Game-over is only judged on a settled board; while a refill cascade
        // is still in flight the sweep re-arms itself.
        if self.queue.board_is_settling() {
            self.queue
                .schedule(RESUME_CHECK_DELAY_SECONDS, SettleTask::ResumableSweep);
            return;
        }
        if self.is_resumable() {
            return;
        }
        info!("game_over");
        self.signals.emit(MatchSignal::GameOver);
    }
}

fn initial_spawn_delay_seconds(coord: GridCoord) -> f32 {
    // Deterministic per-cell stagger in [0.5, 1.5] so the opening board pops
    // in piecewise instead of all at once.
    let step = (coord.x * 7 + coord.y * 3).rem_euclid(11) as f32;
    INITIAL_SPAWN_MIN_SECONDS + INITIAL_SPAWN_STAGGER_SECONDS * step
}
