//! Board-to-worker assignment and load balancing.
//!
//! The scheduler is one owned structure; every mutation goes through
//! `&mut self`, which serializes bookkeeping by construction. It never
//! touches board contents: migration moves ownership records, and the
//! caller hands the actual state over at a safe suspension point.

use std::collections::HashMap;

/// Result of one rebalance cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RebalanceOutcome {
    /// Loads are within the 2x bound, or no migration would improve them.
    Balanced,
    /// A board changed workers.
    Migrated { board: u32, from: usize, to: usize },
    /// A beneficial migration exists but the board is not at a safe
    /// suspension point this cycle. Retried next cycle.
    Deferred,
}

pub struct WorkScheduler {
    loads: Vec<f64>,
    /// board -> worker. Exactly one worker per board at any instant.
    assignment: HashMap<u32, usize>,
    /// board -> remaining effort estimate.
    efforts: HashMap<u32, f64>,
}

impl WorkScheduler {
    pub fn new(worker_count: usize) -> Self {
        assert!(worker_count > 0, "scheduler needs at least one worker");
        Self {
            loads: vec![0.0; worker_count],
            assignment: HashMap::new(),
            efforts: HashMap::new(),
        }
    }

    pub fn worker_count(&self) -> usize {
        self.loads.len()
    }

    /// Place a board on the least-loaded worker. Returns the chosen worker.
    pub fn assign(&mut self, board: u32, effort: f64) -> usize {
        debug_assert!(!self.assignment.contains_key(&board));
        let worker = self.least_loaded();
        self.loads[worker] += effort;
        self.assignment.insert(board, worker);
        self.efforts.insert(board, effort);
        worker
    }

    /// Consume effort from a board as its worker makes progress.
    pub fn report_progress(&mut self, board: u32, effort_delta: f64) {
        let Some(&worker) = self.assignment.get(&board) else {
            return;
        };
        let effort = self.efforts.get_mut(&board).expect("effort tracked");
        let consumed = effort_delta.min(*effort);
        *effort -= consumed;
        self.loads[worker] = (self.loads[worker] - consumed).max(0.0);
    }

    /// Board reached a terminal state; drop it from the partition.
    pub fn complete(&mut self, board: u32) {
        if let Some(worker) = self.assignment.remove(&board) {
            let effort = self.efforts.remove(&board).unwrap_or(0.0);
            self.loads[worker] = (self.loads[worker] - effort).max(0.0);
        }
    }

    /// True once every board has completed.
    pub fn is_drained(&self) -> bool {
        self.assignment.is_empty()
    }

    pub fn worker_of(&self, board: u32) -> Option<usize> {
        self.assignment.get(&board).copied()
    }

    pub fn boards_for(&self, worker: usize) -> Vec<u32> {
        let mut boards: Vec<u32> = self
            .assignment
            .iter()
            .filter(|&(_, &w)| w == worker)
            .map(|(&b, _)| b)
            .collect();
        boards.sort_unstable();
        boards
    }

    pub fn load_of(&self, worker: usize) -> f64 {
        self.loads[worker]
    }

    /// Migrate one board from the most loaded worker to the least loaded,
    /// if the most loaded carries more than twice the least. Prefers the
    /// board with the largest remaining effort among those that both sit at
    /// a safe suspension point (`at_rest`) and strictly reduce the spread.
    pub fn rebalance(&mut self, at_rest: impl Fn(u32) -> bool) -> RebalanceOutcome {
        if self.loads.len() < 2 || self.assignment.is_empty() {
            return RebalanceOutcome::Balanced;
        }
        let from = self.most_loaded();
        let to = self.least_loaded();
        let high = self.loads[from];
        let low = self.loads[to];
        if low * 2.0 >= high {
            return RebalanceOutcome::Balanced;
        }

        let spread = high - low;
        let mut best: Option<(u32, f64)> = None;
        let mut movable_exists = false;
        for (&board, &worker) in &self.assignment {
            if worker != from {
                continue;
            }
            let effort = self.efforts.get(&board).copied().unwrap_or(0.0);
            // Only moves that strictly shrink the spread; anything else
            // flips the imbalance back and forth forever.
            if effort <= 0.0 || effort >= spread {
                continue;
            }
            movable_exists = true;
            if !at_rest(board) {
                continue;
            }
            if best.map_or(true, |(_, e)| effort > e) {
                best = Some((board, effort));
            }
        }

        match best {
            Some((board, effort)) => {
                self.assignment.insert(board, to);
                self.loads[from] = (self.loads[from] - effort).max(0.0);
                self.loads[to] += effort;
                log::debug!(
                    "migrated board {} from worker {} to worker {} (effort {:.0})",
                    board,
                    from,
                    to,
                    effort
                );
                RebalanceOutcome::Migrated { board, from, to }
            }
            None if movable_exists => RebalanceOutcome::Deferred,
            None => RebalanceOutcome::Balanced,
        }
    }

    fn least_loaded(&self) -> usize {
        self.extreme_worker(|a, b| a < b)
    }

    fn most_loaded(&self) -> usize {
        self.extreme_worker(|a, b| a > b)
    }

    fn extreme_worker(&self, better: impl Fn(f64, f64) -> bool) -> usize {
        let mut idx = 0;
        for i in 1..self.loads.len() {
            if better(self.loads[i], self.loads[idx]) {
                idx = i;
            }
        }
        idx
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assign_picks_least_loaded() {
        let mut s = WorkScheduler::new(3);
        assert_eq!(s.assign(0, 100.0), 0);
        assert_eq!(s.assign(1, 10.0), 1);
        assert_eq!(s.assign(2, 10.0), 2);
        // Workers 1 and 2 tie at 10; either is acceptable, never worker 0.
        let w = s.assign(3, 5.0);
        assert_ne!(w, 0);
    }

    #[test]
    fn progress_reduces_load_and_never_goes_negative() {
        let mut s = WorkScheduler::new(1);
        s.assign(0, 50.0);
        s.report_progress(0, 30.0);
        assert!((s.load_of(0) - 20.0).abs() < 1e-9);
        s.report_progress(0, 1000.0);
        assert_eq!(s.load_of(0), 0.0);
    }

    #[test]
    fn complete_removes_board_from_partition() {
        let mut s = WorkScheduler::new(2);
        s.assign(7, 40.0);
        assert_eq!(s.worker_of(7), Some(0));
        s.complete(7);
        assert_eq!(s.worker_of(7), None);
        assert!(s.is_drained());
        assert_eq!(s.load_of(0), 0.0);
    }
}
