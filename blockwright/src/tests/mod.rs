mod support;


// Rule language tests
mod rule_equivalence;

// Solver tests
mod fixed_point;
mod search;

mod constraints;
mod linear;
mod metrics;
