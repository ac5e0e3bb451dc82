//! `percepta-runtime` – Execution control
//!
//! Owns the single-flight discipline around the recognition pipeline: the
//! sensor stream cache with its drop-if-busy write policy, the per-run
//! single-assignment slot for the externally-recognized cloud list, and the
//! goal executor that admits at most one detection run at a time.
//!
//! # Modules
//!
//! - [`cache`] – [`SensorStreamCache`][cache::SensorStreamCache]: the latest
//!   synchronized frame pair, guarded by the run-exclusivity lock.
//! - [`slot`] – [`SingleAssignSlot`][slot::SingleAssignSlot]: first writer
//!   wins, later writes observed and discarded.
//! - [`config`] – [`RecognitionConfig`][config::RecognitionConfig]: all
//!   pipeline tunables with their defaults.
//! - [`executor`] – [`GoalExecutor`][executor::GoalExecutor]: the
//!   `Idle → Admitted → Running → Idle` state machine.

pub mod cache;
pub mod config;
pub mod executor;
pub mod slot;

pub use cache::{FrameGuard, SensorStreamCache};
pub use config::RecognitionConfig;
pub use executor::{Collaborators, GoalExecutor};
pub use slot::SingleAssignSlot;
