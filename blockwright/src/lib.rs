//! # Blockwright
//!
//! **Component placement on fixed-shape grids**
//!
//! Blockwright chooses one catalog component for every cell of a grid so
//! that each component's placement rule, the geometry of the structure
//! and its physics constraints hold, optionally optimizing a metric.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use blockwright::{Designer, DesignResult, SearchBackend, SolverLimits, TurbineDynamoDesigner};
//! use std::time::Duration;
//!
//! fn main() -> DesignResult<()> {
//!     let designer = TurbineDynamoDesigner::new(5)?.with_symmetry(true, true);
//!     let limits = SolverLimits::new().with_time_limit(Duration::from_secs(10));
//!
//!     if let Some(design) = designer.design(&SearchBackend::new(), &limits)?.design() {
//!         println!("conductivity {:?}", design.objective);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Core Concepts
//!
//! ### Placement rules
//! Every component may carry a rule about its neighbors such as
//! `"one bearing || two magnesium coils"`. Rules are evaluated on concrete
//! grids and compiled into solver constraints from the same AST.
//!
//! ### Constraints and metrics
//! Structural constraints (casing shells, beam lines, magnet segments) and
//! metrics (heating, voltage, focus, conductivity) likewise come in pairs:
//! a pure check on a [`Grid`] of components and a compiled form over the
//! cell variables.
//!
//! ### Solver port
//! Models use a small primitive set ([`Model`]). The built-in
//! [`SearchBackend`] solves them; any other [`Backend`] can be plugged in.

pub mod catalog;
pub mod component;
pub mod constraints;
pub mod designer;
pub mod error;
pub mod fixed_point;
pub mod grid;
pub mod limits;
pub mod metrics;
pub mod rules;
pub mod solver;

pub use catalog::Catalog;
pub use component::{Component, ComponentKind};
pub use constraints::Constraint;
pub use designer::{
    ComponentLimits, DeceleratorDesigner, Design, DesignOutcome, Designer, GridDesigner,
    LinearAcceleratorDesigner, NucleosynthesisDesigner, SynchrotronDesigner,
    TurbineDynamoDesigner, TurbineRotorDesigner,
};
pub use error::DesignError;
pub use grid::Grid;
pub use limits::SolverLimits;
pub use metrics::{FocusParams, Layout, Metric, Particle};
pub use rules::{parse_rule, Neighbor, NeighborVar, PlacementRule};
pub use solver::{Backend, Model, SearchBackend, Sense, Solution, SolveStatus};

/// Result type for design operations
pub type DesignResult<T> = Result<T, DesignError>;

#[cfg(test)]
mod tests;
