use std::time::Duration;

/// Search budgets for one solve
///
/// Exhausting a budget is not an error: the best design found so far is
/// returned, or the run is reported as not proven infeasible.
#[derive(Debug, Clone, PartialEq)]
pub struct SolverLimits {
    /// Soft wall-clock budget for a single solve
    /// Real usage: seconds for turbine dynamos, minutes for accelerators, Limit: none
    pub time_limit: Option<Duration>,

    /// Maximum number of search nodes
    /// Real usage: ~10^3-10^6, Limit: none
    pub max_nodes: Option<u64>,

    /// Maximum number of propagator runs at one node before branching anyway
    /// Real usage: ~10^2-10^4, Limit: 1,000,000 (100x+)
    pub max_propagations_per_node: usize,

    /// Number of nodes between two reads of the wall clock
    pub clock_check_interval: u64,
}

impl Default for SolverLimits {
    fn default() -> Self {
        Self {
            time_limit: None,
            max_nodes: None,
            max_propagations_per_node: 1_000_000,
            clock_check_interval: 256,
        }
    }
}

impl SolverLimits {
    /// Create a new SolverLimits with default values
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_time_limit(mut self, limit: Duration) -> Self {
        self.time_limit = Some(limit);
        self
    }

    pub fn with_max_nodes(mut self, nodes: u64) -> Self {
        self.max_nodes = Some(nodes);
        self
    }
}
