//! Reef kind inference: a constraint solver over kind variables.
//!
//! This crate implements the kind-checking core of the Reef compiler.
//! Constraint generation walks the AST elsewhere and hands this solver an
//! ordered batch of constraints over kind variables; the solver unifies
//! them incrementally, detects contradictions and infinite kinds, and
//! assigns every variable a concrete kind or the default `Type`.
//!
//! # Architecture
//!
//! - [`kind`]: Core kind representation (Kind, KindVar, Provenance, Descriptor)
//! - [`constraint`]: Unsolved constraints as produced by generation
//! - [`unify`]: Equivalence-class store with transactional constraint
//!   application and the occurs check
//! - [`solve`]: Fixpoint reducer and the driver entry points
//!   (`step` / `verify` / `default_unconstrained_vars`)
//! - [`builtins`]: Kind axioms of the Reef prelude
//! - [`error`]: Kind errors with store snapshots
//! - [`diagnostics`]: Ariadne rendering of kind errors

pub mod builtins;
pub mod constraint;
pub mod diagnostics;
pub mod error;
pub mod kind;
pub mod solve;
pub mod unify;

pub use constraint::Constraint;
pub use error::KindError;
pub use kind::{Descriptor, Kind, KindVar, Provenance, VarSource};
pub use solve::{default_unconstrained_vars, step, verify, SolveState};
pub use unify::KindStore;
