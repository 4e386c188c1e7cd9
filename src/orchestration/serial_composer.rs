//! # Serial Composer
//!
//! Folds several categories, strictly in the given order, into one shared atomic unit. Use it
//! when later categories stage rows that depend on rows staged by earlier ones within the
//! same commit.

use super::unit_scheduler::UnitScheduler;
use crate::category::Category;
use crate::error::{Result, TaskLabel};
use crate::options::ImportOptions;
use crate::registry::ChangesRegistry;
use crate::unit::AtomicUnit;
use tracing::{debug, info, instrument};

impl UnitScheduler {
    /// Thread one unit through each category's executor in `categories` order.
    ///
    /// Every listed category is removed from the registry; absent ones leave the unit
    /// untouched. The fold has no join budget: it takes as long as its executors take.
    /// An executor error or panic fails the call with `RunnerCrash`, and scheduler shutdown
    /// fails it with `Cancelled`.
    #[instrument(skip_all, fields(categories = categories.len()))]
    pub async fn single_multi<C: Category>(
        &self,
        categories: &[C],
        registry: ChangesRegistry<C>,
        options: &ImportOptions,
    ) -> Result<(C::Unit, ChangesRegistry<C>)> {
        let mut unit = C::Unit::default();
        let mut remaining = registry;

        for &category in categories {
            let (changes, rest) = remaining.pop(&category);
            remaining = rest;

            let Some(changes) = changes else {
                debug!(category = %category, "No pending changes, unit unchanged");
                continue;
            };

            debug!(category = %category, change_count = changes.len(), "Folding category into unit");

            // One-task group so panics and shutdown surface as typed errors
            let mut tasks = self.task_group::<C::Unit>();
            let options = options.clone();
            tasks.spawn(TaskLabel::category(category), async move {
                category.execute(unit, changes, &options).await
            });

            unit = tasks.join_unbounded().await?.pop().unwrap_or_default();
        }

        info!(operations = unit.operation_count(), "Serial unit staged");
        Ok((unit, remaining))
    }
}
