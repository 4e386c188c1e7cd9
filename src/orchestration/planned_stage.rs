//! # Planned Stage
//!
//! A [`Stage`] assembled from an ordered list of steps instead of hand-written policy code.
//!
//! ```rust,ignore
//! let stage = PlannedStage::new("address_referencing")
//!     .chunked(Chain::Addresses, 1_000)
//!     .serial([Chain::Blocks, Chain::Transactions])
//!     .concurrent([Chain::Logs, Chain::TokenTransfers])
//!     .disable(Chain::TokenTransfers);
//! ```
//!
//! Steps run in declaration order and their units are concatenated in that order. Disabled
//! categories are dropped from every step, so their pending changes stay in the registry.

use super::stage::{Stage, StageResult};
use super::unit_scheduler::UnitScheduler;
use crate::category::Category;
use crate::error::Result;
use crate::options::ImportOptions;
use crate::registry::ChangesRegistry;
use async_trait::async_trait;
use std::collections::BTreeSet;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageStep<C> {
    /// One unit per chunk of at most `chunk_size` changes
    Chunked { category: C, chunk_size: usize },
    /// All categories folded into one unit, in order
    Serial(Vec<C>),
    /// One unit per non-empty category, built in parallel
    Concurrent(Vec<C>),
}

impl<C: Category> StageStep<C> {
    fn categories(&self) -> Vec<C> {
        match self {
            Self::Chunked { category, .. } => vec![*category],
            Self::Serial(categories) | Self::Concurrent(categories) => categories.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PlannedStage<C> {
    name: &'static str,
    steps: Vec<StageStep<C>>,
    disabled: BTreeSet<C>,
}

impl<C: Category> PlannedStage<C> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            steps: Vec::new(),
            disabled: BTreeSet::new(),
        }
    }

    pub fn step(mut self, step: StageStep<C>) -> Self {
        self.steps.push(step);
        self
    }

    pub fn chunked(self, category: C, chunk_size: usize) -> Self {
        self.step(StageStep::Chunked {
            category,
            chunk_size,
        })
    }

    pub fn serial(self, categories: impl IntoIterator<Item = C>) -> Self {
        self.step(StageStep::Serial(categories.into_iter().collect()))
    }

    pub fn concurrent(self, categories: impl IntoIterator<Item = C>) -> Self {
        self.step(StageStep::Concurrent(categories.into_iter().collect()))
    }

    /// Exclude `category` from this run, e.g. behind a feature flag.
    pub fn disable(mut self, category: C) -> Self {
        self.disabled.insert(category);
        self
    }

    /// Disable `category` only when `enabled` is false.
    pub fn enable_if(self, category: C, enabled: bool) -> Self {
        if enabled {
            self
        } else {
            self.disable(category)
        }
    }

    pub fn steps(&self) -> &[StageStep<C>] {
        &self.steps
    }

    fn is_active(&self, category: &C) -> bool {
        !self.disabled.contains(category)
    }

    fn active_only(&self, categories: &[C]) -> Vec<C> {
        categories
            .iter()
            .copied()
            .filter(|category| self.is_active(category))
            .collect()
    }
}

#[async_trait]
impl<C: Category> Stage<C> for PlannedStage<C> {
    fn name(&self) -> &'static str {
        self.name
    }

    fn all_categories(&self) -> Vec<C> {
        let mut seen = BTreeSet::new();
        self.steps
            .iter()
            .flat_map(StageStep::categories)
            .filter(|category| seen.insert(*category))
            .collect()
    }

    fn active_categories(&self) -> Vec<C> {
        self.active_only(&self.all_categories())
    }

    async fn build_units(
        &self,
        registry: ChangesRegistry<C>,
        options: &ImportOptions,
        scheduler: &UnitScheduler,
    ) -> Result<StageResult<C>> {
        let mut units = Vec::new();
        let mut remaining = registry;

        for step in &self.steps {
            match step {
                StageStep::Chunked {
                    category,
                    chunk_size,
                } => {
                    if !self.is_active(category) {
                        debug!(stage = self.name, category = %category, "Category disabled, skipping");
                        continue;
                    }
                    let (chunk_units, rest) = scheduler
                        .chunk_every(remaining, *category, *chunk_size, options)
                        .await?;
                    units.extend(chunk_units);
                    remaining = rest;
                }
                StageStep::Serial(categories) => {
                    let active = self.active_only(categories);
                    if active.is_empty() {
                        continue;
                    }
                    let (unit, rest) = scheduler.single_multi(&active, remaining, options).await?;
                    units.push(unit);
                    remaining = rest;
                }
                StageStep::Concurrent(categories) => {
                    let active = self.active_only(categories);
                    let (category_units, rest) = scheduler
                        .concurrent_multis(&active, remaining, options)
                        .await?;
                    units.extend(category_units);
                    remaining = rest;
                }
            }
        }

        Ok(StageResult::new(units, remaining))
    }
}
