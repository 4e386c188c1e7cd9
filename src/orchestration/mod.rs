//! # Staging Orchestration
//!
//! Turns a [`ChangesRegistry`](crate::registry::ChangesRegistry) into atomic units, stage by
//! stage.
//!
//! ## Architecture
//!
//! ```text
//! BatchImporter ── for each Stage ──▶ build_units ──▶ UnitCommitter::commit (in order)
//!                                        │
//!                  UnitScheduler ◀───────┘
//!                  ├── chunk_every        one unit per chunk, chunks in parallel
//!                  ├── single_multi       one unit, categories folded in order
//!                  └── concurrent_multis  one unit per category, in parallel
//!                          │
//!                  TaskGroup (semaphore-bounded, join budget, cancellation)
//! ```
//!
//! Every registry pop happens on the calling task before any work is dispatched; spawned
//! tasks only ever own their private slice of changes.

pub mod batch_importer;
pub mod chunk_scheduler;
pub mod concurrent_composer;
pub mod planned_stage;
pub mod serial_composer;
pub mod stage;
pub(crate) mod task_group;
pub mod unit_scheduler;

pub use batch_importer::{BatchImporter, BatchReport, StageReport, UnitCommitter};
pub use planned_stage::{PlannedStage, StageStep};
pub use stage::{validate_stage, Stage, StageResult};
pub use unit_scheduler::UnitScheduler;
