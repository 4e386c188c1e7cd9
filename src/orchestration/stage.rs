//! # Stage Contract
//!
//! A stage is the policy for one phase of a batch: it decides which categories are chunked,
//! folded serially, or built concurrently, and hands the leftover registry to the next
//! stage. Stages never overlap; the next one starts after this one's units are committed.

use super::unit_scheduler::UnitScheduler;
use crate::category::Category;
use crate::error::{Result, StagingError};
use crate::options::ImportOptions;
use crate::registry::ChangesRegistry;
use async_trait::async_trait;

/// Units built by one stage plus the registry left for later stages.
pub struct StageResult<C: Category> {
    pub units: Vec<C::Unit>,
    pub residual: ChangesRegistry<C>,
}

impl<C: Category> StageResult<C> {
    pub fn new(units: Vec<C::Unit>, residual: ChangesRegistry<C>) -> Self {
        Self { units, residual }
    }

    pub fn into_parts(self) -> (Vec<C::Unit>, ChangesRegistry<C>) {
        (self.units, self.residual)
    }
}

#[async_trait]
pub trait Stage<C: Category>: Send + Sync {
    /// Name used in logs, reports and commit errors
    fn name(&self) -> &'static str;

    /// Every category this stage could ever handle, independent of configuration
    fn all_categories(&self) -> Vec<C>;

    /// Categories handled in the current run
    fn active_categories(&self) -> Vec<C> {
        self.all_categories()
    }

    /// Build this phase's atomic units from `registry`.
    async fn build_units(
        &self,
        registry: ChangesRegistry<C>,
        options: &ImportOptions,
        scheduler: &UnitScheduler,
    ) -> Result<StageResult<C>>;
}

/// Reject stages with empty category sets, or active categories outside `all_categories`.
pub fn validate_stage<C: Category>(stage: &dyn Stage<C>) -> Result<()> {
    let all = stage.all_categories();
    if all.is_empty() {
        return Err(StagingError::configuration(format!(
            "stage {} declares no categories",
            stage.name()
        )));
    }

    let active = stage.active_categories();
    if active.is_empty() {
        return Err(StagingError::configuration(format!(
            "stage {} has no active categories",
            stage.name()
        )));
    }

    if let Some(unknown) = active.iter().find(|category| !all.contains(category)) {
        return Err(StagingError::configuration(format!(
            "stage {} activates {unknown}, which is not among its categories",
            stage.name()
        )));
    }

    Ok(())
}
