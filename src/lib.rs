#![allow(clippy::doc_markdown)] // Allow technical terms in docs
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Staged Import
//!
//! Staging layer for large batches of pending entity changes.
//!
//! ## Overview
//!
//! A batch arrives as one ordered changes list per entity category. This crate groups those
//! lists into atomic units that an external transactional store commits all-or-nothing,
//! while bounding how much work (and so how long a lock) any single unit represents.
//!
//! ## Architecture
//!
//! - A [`ChangesRegistry`] holds the pending lists and is consumed category by category.
//! - A [`Category`] carries the executor that stages a list into an atomic unit.
//! - The [`UnitScheduler`] chunks one category, folds several into one unit, or builds
//!   several units in parallel, always under a join budget with cancellation.
//! - A [`Stage`] decides which of those to apply for one phase of the batch.
//! - The [`BatchImporter`] runs stages in order and hands every unit to a [`UnitCommitter`].
//!
//! ## Module Organization
//!
//! - [`registry`] - Consumable registry of pending changes
//! - [`category`] - Category and executor contract
//! - [`unit`] - Atomic unit contract and the `Multi` accumulator
//! - [`orchestration`] - Scheduler, composers, stages and the batch importer
//! - [`options`] - Read-only options forwarded to executors
//! - [`config`] - Scheduler configuration
//! - [`error`] - Structured error handling
//! - [`logging`] - Structured logging setup
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use staged_import::{BatchImporter, ChangesRegistry, ImportOptions, PlannedStage, UnitScheduler};
//!
//! let importer = BatchImporter::new(committer, UnitScheduler::with_defaults())
//!     .with_stage(PlannedStage::new("addresses").chunked(Chain::Addresses, 1_000))
//!     .with_stage(PlannedStage::new("blocks").serial([Chain::Blocks, Chain::Transactions]));
//!
//! let registry = ChangesRegistry::new()
//!     .with_changes(Chain::Addresses, addresses)
//!     .with_changes(Chain::Blocks, blocks);
//!
//! let report = importer.run(registry, &ImportOptions::default()).await?;
//! ```

pub mod category;
pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod options;
pub mod orchestration;
pub mod registry;
pub mod test_helpers;
pub mod unit;

pub use category::Category;
pub use config::StagingConfig;
pub use error::{Result, StagingError, TaskLabel};
pub use options::{ImportOptions, Timestamps};
pub use orchestration::{
    validate_stage, BatchImporter, BatchReport, PlannedStage, Stage, StageReport, StageResult,
    StageStep, UnitCommitter, UnitScheduler,
};
pub use registry::ChangesRegistry;
pub use unit::{AtomicUnit, Multi, UnitError};
