//! # Concurrent Composer
//!
//! Builds one atomic unit per category, all categories in parallel. There is no atomicity
//! across categories, so only independent categories belong here.

use super::unit_scheduler::UnitScheduler;
use crate::category::Category;
use crate::error::{Result, TaskLabel};
use crate::options::ImportOptions;
use crate::registry::ChangesRegistry;
use tracing::{debug, info, instrument};

impl UnitScheduler {
    /// Pop every listed category, then build one unit per non-empty list concurrently.
    ///
    /// The residual registry has every listed category removed whether or not it had data.
    /// Empty or absent lists produce no unit. Unit order is unrelated to `categories` order.
    /// A crash or an elapsed budget in any category fails the whole call.
    #[instrument(skip_all, fields(categories = categories.len()))]
    pub async fn concurrent_multis<C: Category>(
        &self,
        categories: &[C],
        registry: ChangesRegistry<C>,
        options: &ImportOptions,
    ) -> Result<(Vec<C::Unit>, ChangesRegistry<C>)> {
        let (popped, remaining) = registry.pop_all(categories);
        let mut tasks = self.task_group::<C::Unit>();

        for (category, changes) in popped {
            let changes = match changes {
                Some(changes) if !changes.is_empty() => changes,
                _ => {
                    debug!(category = %category, "No pending changes, no unit");
                    continue;
                }
            };

            let options = options.clone();
            tasks.spawn(TaskLabel::category(category), async move {
                category.execute(C::Unit::default(), changes, &options).await
            });
        }

        let dispatched = tasks.len();
        debug!(dispatched, "Dispatched category tasks");

        let units = tasks.join(self.join_timeout()).await?;

        info!(units = units.len(), "Concurrent units staged");
        Ok((units, remaining))
    }
}
