/// One in-memory play session. Owns the match engine and an auto-player that
/// feeds it pointer gestures; presentation output is reduced to structured
/// logs. Restarting swaps in a fresh engine — nothing persists.
pub(crate) struct Session {
    engine: MatchEngine,
    phase: SessionPhase,
    stats: SessionStats,
    tick_seconds: f32,
}

impl Session {
    fn new(engine: MatchEngine, tick_seconds: f32) -> Self {
        Self {
            engine,
            phase: SessionPhase::Menu,
            stats: SessionStats::default(),
            tick_seconds,
        }
    }

    fn start(&mut self) {
        self.phase = SessionPhase::Playing;
        info!("game_start");
    }

    fn restart(&mut self, engine: MatchEngine) {
        self.engine = engine;
        self.stats = SessionStats::default();
        self.phase = SessionPhase::Playing;
        info!("game_restart");
    }

    fn tick(&mut self) {
        self.engine.advance(self.tick_seconds);
        self.pump_signals();
    }

    fn pump_signals(&mut self) {
        for signal in self.engine.drain_signals() {
            match signal {
                MatchSignal::ChainChanged { value, .. } => {
                    debug!(preview_value = value, "chain_changed");
                }
                MatchSignal::SelectionClosed => {
                    debug!("selection_closed");
                }
                MatchSignal::MergeResolved {
                    value,
                    score,
                    chain_len,
                    ..
                } => {
                    self.stats.record_merge(value, score);
                    info!(value, score, chain_len, total_score = self.stats.score, "merge");
                }
                MatchSignal::GameOver => {
                    self.phase = SessionPhase::GameOver;
                    info!(
                        score = self.stats.score,
                        merges = self.stats.merges_resolved,
                        "game_over"
                    );
                }
            }
        }
        let visuals = self.engine.drain_visuals();
        if !visuals.is_empty() {
            debug!(count = visuals.len(), "visual_requests");
        }
    }

    /// Ticks until every pending settle task (resumable sweeps included) has
    /// fired, so the next gesture starts from a fully settled board.
    fn wait_for_idle(&mut self) {
        for _ in 0..MAX_SETTLE_TICKS {
            if self.engine.settle_queue_is_idle() {
                return;
            }
            self.tick();
        }
        warn!(ticks = MAX_SETTLE_TICKS, "settle_queue_did_not_drain");
    }

    /// Longest chain a greedy walk can build: start anywhere, repeatedly step
    /// to an unvisited same-tier neighbour of the last cell. `None` when no
    /// two-cell chain exists, which is exactly the game-over condition.
    fn find_gesture(&self) -> Option<Vec<GridCoord>> {
        let grid = self.engine.grid();
        let mut best: Option<Vec<GridCoord>> = None;
        for cell in grid.cells() {
            if cell.is_empty || !cell.is_settled {
                continue;
            }
            let mut path = vec![cell.coord];
            loop {
                let last = *path.last().expect("path starts non-empty");
                let next = grid.neighbours(last).find(|candidate| {
                    let neighbour = grid
                        .cell(*candidate)
                        .expect("neighbours stay in bounds");
                    neighbour.tier == cell.tier
                        && !neighbour.is_empty
                        && neighbour.is_settled
                        && !path.contains(candidate)
                });
                match next {
                    Some(coord) => path.push(coord),
                    None => break,
                }
            }
            if path.len() >= 2 && best.as_ref().map_or(true, |b| path.len() > b.len()) {
                best = Some(path);
            }
        }
        best
    }

    fn play_gesture(&mut self, path: &[GridCoord]) {
        let Some((first, rest)) = path.split_first() else {
            return;
        };
        if self.engine.pointer_down(*first) != SelectOutcome::Started {
            self.engine.pointer_up();
            return;
        }
        for coord in rest {
            self.engine.pointer_enter(*coord);
        }
        self.engine.pointer_up();
        self.stats.gestures_played = self.stats.gestures_played.saturating_add(1);
        debug!(
            chain_len = path.len(),
            gesture = self.stats.gestures_played,
            "gesture_played"
        );
    }

    /// Auto-plays until the engine signals game-over or the gesture budget
    /// runs out.
    pub(crate) fn run_to_completion(&mut self, max_gestures: u32) {
        self.start();
        self.wait_for_idle();
        while self.phase == SessionPhase::Playing && self.stats.gestures_played < max_gestures {
            match self.find_gesture() {
                Some(path) => {
                    self.play_gesture(&path);
                    self.wait_for_idle();
                }
                None => {
                    self.engine.check_resumable();
                    self.pump_signals();
                    if self.phase != SessionPhase::GameOver {
                        break;
                    }
                }
            }
        }
        info!(
            gestures = self.stats.gestures_played,
            merges = self.stats.merges_resolved,
            score = self.stats.score,
            highest_value = self.stats.highest_value_reached,
            final_phase = ?self.phase,
            "session_finished"
        );
    }
}
