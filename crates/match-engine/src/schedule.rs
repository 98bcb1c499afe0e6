use crate::grid::GridCoord;
use crate::tiers::TierIndex;

/// A deferred continuation modelling animation settle time. Exactly one
/// logical thread of control fires these; there is no concurrency and no
/// cancellation — a scheduled task always runs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SettleTask {
    /// The merge terminal adopts the promoted tier once the other chain cells
    /// have visually arrived.
    UpgradeCell { coord: GridCoord, tier: TierIndex },
    /// A full cell drops into a lower empty slot during gap-fill.
    RelocateCell { from: GridCoord, to: GridCoord },
    /// A vacated slot receives a freshly generated base tier.
    RefillCell { coord: GridCoord },
    /// A cell's spawn/upgrade/refill animation finished; it becomes
    /// interactable again and the next gap-fill pass may run.
    ActivateCell { coord: GridCoord },
    /// Judge game-over once the board has settled.
    ResumableSweep,
}

impl SettleTask {
    /// Columns this task still owns; gap-fill must not touch them until the
    /// task has fired.
    pub fn touched_columns(&self) -> [Option<i32>; 2] {
        match self {
            Self::UpgradeCell { coord, .. }
            | Self::RefillCell { coord }
            | Self::ActivateCell { coord } => [Some(coord.x), None],
            Self::RelocateCell { from, to } => [Some(from.x), Some(to.x)],
            Self::ResumableSweep => [None, None],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct PendingSettle {
    fire_at_seconds: f32,
    sequence: u64,
    task: SettleTask,
}

/// Logical-clock task queue. `advance` moves the clock and returns every task
/// whose time has come, ordered by (fire time, schedule order).
#[derive(Debug, Default)]
pub struct SettleQueue {
    now_seconds: f32,
    next_sequence: u64,
    pending: Vec<PendingSettle>,
}

impl SettleQueue {
    pub fn now_seconds(&self) -> f32 {
        self.now_seconds
    }

    pub fn schedule(&mut self, delay_seconds: f32, task: SettleTask) {
        let sequence = self.next_sequence;
        self.next_sequence = self.next_sequence.wrapping_add(1);
        self.pending.push(PendingSettle {
            fire_at_seconds: self.now_seconds + delay_seconds.max(0.0),
            sequence,
            task,
        });
    }

    pub fn advance(&mut self, dt_seconds: f32) -> Vec<SettleTask> {
        self.now_seconds += dt_seconds.max(0.0);
        let now = self.now_seconds;

        let mut due: Vec<PendingSettle> = Vec::new();
        self.pending.retain(|entry| {
            if entry.fire_at_seconds <= now {
                due.push(*entry);
                false
            } else {
                true
            }
        });
        due.sort_by(|a, b| {
            a.fire_at_seconds
                .total_cmp(&b.fire_at_seconds)
                .then(a.sequence.cmp(&b.sequence))
        });
        due.into_iter().map(|entry| entry.task).collect()
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_idle(&self) -> bool {
        self.pending.is_empty()
    }

    /// True if any pending task still owns a cell in the given column.
    pub fn owns_column(&self, column: i32) -> bool {
        self.pending.iter().any(|entry| {
            entry
                .task
                .touched_columns()
                .iter()
                .any(|owned| *owned == Some(column))
        })
    }

    /// True if any pending task other than resumable sweeps exists — the
    /// board is still visually settling.
    pub fn board_is_settling(&self) -> bool {
        self.pending
            .iter()
            .any(|entry| !matches!(entry.task, SettleTask::ResumableSweep))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coord(x: i32, y: i32) -> GridCoord {
        GridCoord { x, y }
    }

    #[test]
    fn tasks_fire_in_time_then_schedule_order() {
        let mut queue = SettleQueue::default();
        queue.schedule(0.4, SettleTask::ActivateCell { coord: coord(0, 0) });
        queue.schedule(0.2, SettleTask::ActivateCell { coord: coord(1, 0) });
        queue.schedule(0.2, SettleTask::ActivateCell { coord: coord(2, 0) });

        assert!(queue.advance(0.1).is_empty());
        let fired = queue.advance(0.15);
        assert_eq!(
            fired,
            vec![
                SettleTask::ActivateCell { coord: coord(1, 0) },
                SettleTask::ActivateCell { coord: coord(2, 0) },
            ]
        );
        let fired = queue.advance(0.5);
        assert_eq!(fired, vec![SettleTask::ActivateCell { coord: coord(0, 0) }]);
        assert!(queue.is_idle());
    }

    #[test]
    fn owns_column_tracks_both_relocation_endpoints() {
        let mut queue = SettleQueue::default();
        queue.schedule(
            0.3,
            SettleTask::RelocateCell {
                from: coord(1, 0),
                to: coord(1, 3),
            },
        );
        assert!(queue.owns_column(1));
        assert!(!queue.owns_column(0));

        queue.advance(0.3);
        assert!(!queue.owns_column(1));
    }

    #[test]
    fn resumable_sweep_does_not_count_as_settling() {
        let mut queue = SettleQueue::default();
        queue.schedule(0.5, SettleTask::ResumableSweep);
        assert!(!queue.board_is_settling());
        assert!(!queue.is_idle());

        queue.schedule(0.1, SettleTask::RefillCell { coord: coord(0, 0) });
        assert!(queue.board_is_settling());
    }

    #[test]
    fn zero_delay_tasks_fire_on_the_next_advance() {
        let mut queue = SettleQueue::default();
        queue.schedule(0.0, SettleTask::ResumableSweep);
        assert_eq!(queue.advance(0.0), vec![SettleTask::ResumableSweep]);
    }
}
