//! # Batch Importer
//!
//! Runs an ordered sequence of stages over one registry. Each stage's units are handed to
//! the [`UnitCommitter`] one by one, in order, before the next stage starts building.
//!
//! Before anything runs, every stage is validated and every registry category must be active
//! in some stage; otherwise the batch is rejected with nothing built or committed. Once the
//! last stage has run, any category still in the registry is a configuration error.

use super::stage::{validate_stage, Stage};
use super::unit_scheduler::UnitScheduler;
use crate::category::Category;
use crate::constants::stage_operations;
use crate::error::{Result, StagingError};
use crate::logging::{log_error, log_stage_operation};
use crate::options::ImportOptions;
use crate::registry::ChangesRegistry;
use crate::unit::AtomicUnit;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, instrument, Instrument};
use uuid::Uuid;

/// External all-or-nothing commit facility.
#[async_trait]
pub trait UnitCommitter<U: Send + 'static>: Send + Sync {
    async fn commit(&self, stage: &str, unit: U) -> anyhow::Result<()>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageReport {
    pub stage: String,
    pub units_committed: usize,
    pub operations: usize,
    pub duration_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    pub batch_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub stages: Vec<StageReport>,
}

impl BatchReport {
    pub fn units_committed(&self) -> usize {
        self.stages.iter().map(|stage| stage.units_committed).sum()
    }

    pub fn operations(&self) -> usize {
        self.stages.iter().map(|stage| stage.operations).sum()
    }
}

pub struct BatchImporter<C: Category> {
    stages: Vec<Box<dyn Stage<C>>>,
    committer: Arc<dyn UnitCommitter<C::Unit>>,
    scheduler: UnitScheduler,
}

impl<C: Category> BatchImporter<C> {
    pub fn new(committer: Arc<dyn UnitCommitter<C::Unit>>, scheduler: UnitScheduler) -> Self {
        Self {
            stages: Vec::new(),
            committer,
            scheduler,
        }
    }

    /// Append a stage; stages run in the order they were added.
    pub fn with_stage(mut self, stage: impl Stage<C> + 'static) -> Self {
        self.stages.push(Box::new(stage));
        self
    }

    pub fn scheduler(&self) -> &UnitScheduler {
        &self.scheduler
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|stage| stage.name()).collect()
    }

    /// Check stage configuration and registry coverage without running anything.
    pub fn preflight(&self, registry: &ChangesRegistry<C>) -> Result<()> {
        if self.stages.is_empty() {
            return Err(StagingError::configuration("batch has no stages"));
        }

        let mut covered = BTreeSet::new();
        for stage in &self.stages {
            validate_stage(stage.as_ref())?;
            covered.extend(stage.active_categories());
        }

        let orphaned: Vec<String> = registry
            .categories()
            .filter(|category| !covered.contains(category))
            .map(|category| category.to_string())
            .collect();

        if !orphaned.is_empty() {
            return Err(StagingError::configuration(format!(
                "no active stage consumes: {}",
                orphaned.join(", ")
            )));
        }

        Ok(())
    }

    /// Stage and commit the whole registry, one stage at a time.
    #[instrument(skip_all, fields(categories = registry.len(), changes = registry.change_count()))]
    pub async fn run(
        &self,
        registry: ChangesRegistry<C>,
        options: &ImportOptions,
    ) -> Result<BatchReport> {
        self.preflight(&registry)?;

        let batch_id = Uuid::new_v4();
        let started_at = Utc::now();
        let mut reports = Vec::with_capacity(self.stages.len());
        let mut remaining = registry;

        info!(batch_id = %batch_id, stages = self.stages.len(), "Starting batch import");

        for stage in &self.stages {
            let span = tracing::info_span!("stage", batch_id = %batch_id, stage = stage.name());
            let (report, rest) = self
                .run_stage(&batch_id, stage.as_ref(), remaining, options)
                .instrument(span)
                .await?;
            reports.push(report);
            remaining = rest;
        }

        if !remaining.is_empty() {
            let leftover: Vec<String> = remaining.categories().map(|c| c.to_string()).collect();
            return Err(StagingError::configuration(format!(
                "categories left unconsumed after the last stage: {}",
                leftover.join(", ")
            )));
        }

        let report = BatchReport {
            batch_id,
            started_at,
            stages: reports,
        };
        info!(
            batch_id = %batch_id,
            units = report.units_committed(),
            operations = report.operations(),
            "Batch import completed"
        );
        Ok(report)
    }

    async fn run_stage(
        &self,
        batch_id: &Uuid,
        stage: &dyn Stage<C>,
        registry: ChangesRegistry<C>,
        options: &ImportOptions,
    ) -> Result<(StageReport, ChangesRegistry<C>)> {
        let batch_id = batch_id.to_string();
        let started = Instant::now();
        log_stage_operation(
            &batch_id,
            stage.name(),
            stage_operations::BUILD_STARTED,
            None,
            None,
        );

        let (units, remaining) = match stage.build_units(registry, options, &self.scheduler).await {
            Ok(result) => result.into_parts(),
            Err(e) => {
                log_error("batch_importer", stage.name(), &e.to_string(), Some(&batch_id));
                log_stage_operation(
                    &batch_id,
                    stage.name(),
                    stage_operations::FAILED,
                    None,
                    Some(&e.to_string()),
                );
                return Err(e);
            }
        };

        log_stage_operation(
            &batch_id,
            stage.name(),
            stage_operations::BUILD_COMPLETED,
            Some(units.len()),
            None,
        );

        let unit_count = units.len();
        let mut operations = 0;
        for (index, unit) in units.into_iter().enumerate() {
            operations += unit.operation_count();
            if let Err(e) = self.committer.commit(stage.name(), unit).await {
                let err = StagingError::commit(stage.name(), index, format!("{e:#}"));
                log_error("batch_importer", "commit", &err.to_string(), Some(&batch_id));
                return Err(err);
            }
        }

        log_stage_operation(
            &batch_id,
            stage.name(),
            stage_operations::COMMIT_COMPLETED,
            Some(unit_count),
            None,
        );

        let report = StageReport {
            stage: stage.name().to_string(),
            units_committed: unit_count,
            operations,
            duration_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
        };
        Ok((report, remaining))
    }
}
