//! Search budget tracking
//!
//! Reads the wall clock only every `clock_check_interval` nodes.

use crate::limits::SolverLimits;
use std::time::{Duration, Instant};

/// Why a search stopped before exhausting the tree
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LimitReached {
    Time,
    Nodes,
}

pub(crate) struct SearchBudget {
    start_time: Instant,
    time_limit: Option<Duration>,
    max_nodes: Option<u64>,
    check_interval: u64,
    nodes: u64,
}

impl SearchBudget {
    pub fn new(limits: &SolverLimits) -> Self {
        Self {
            start_time: Instant::now(),
            time_limit: limits.time_limit,
            max_nodes: limits.max_nodes,
            check_interval: limits.clock_check_interval.max(1),
            nodes: 0,
        }
    }

    /// Count one node and report whether a limit is now exceeded
    pub fn step(&mut self) -> Option<LimitReached> {
        self.nodes = self.nodes.wrapping_add(1);
        if let Some(max) = self.max_nodes {
            if self.nodes > max {
                return Some(LimitReached::Nodes);
            }
        }
        if self.nodes % self.check_interval == 0 {
            return self.check_clock();
        }
        None
    }

    pub fn check_clock(&self) -> Option<LimitReached> {
        match self.time_limit {
            Some(limit) if self.start_time.elapsed() >= limit => Some(LimitReached::Time),
            _ => None,
        }
    }

    pub fn nodes(&self) -> u64 {
        self.nodes
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }
}
