//! # Import Options
//!
//! Read-only settings forwarded untouched to every executor call. The staging core never
//! looks inside; executors read the timestamps and their own per-category settings.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Row timestamps shared by every operation staged in one batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timestamps {
    pub inserted_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Timestamps {
    pub fn now() -> Self {
        let now = Utc::now();
        Self {
            inserted_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug)]
struct OptionsInner {
    timestamps: Timestamps,
    categories: HashMap<String, Value>,
}

/// Cloning shares the same underlying value.
#[derive(Clone)]
pub struct ImportOptions {
    inner: Arc<OptionsInner>,
}

impl ImportOptions {
    pub fn new(timestamps: Timestamps) -> Self {
        Self {
            inner: Arc::new(OptionsInner {
                timestamps,
                categories: HashMap::new(),
            }),
        }
    }

    pub fn builder() -> ImportOptionsBuilder {
        ImportOptionsBuilder::default()
    }

    pub fn timestamps(&self) -> Timestamps {
        self.inner.timestamps
    }

    /// Executor-specific settings stored under `category`
    pub fn for_category(&self, category: &str) -> Option<&Value> {
        self.inner.categories.get(category)
    }
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self::new(Timestamps::now())
    }
}

impl fmt::Debug for ImportOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImportOptions")
            .field("timestamps", &self.inner.timestamps)
            .field("categories", &self.inner.categories.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[derive(Debug, Default)]
pub struct ImportOptionsBuilder {
    timestamps: Option<Timestamps>,
    categories: HashMap<String, Value>,
}

impl ImportOptionsBuilder {
    pub fn timestamps(mut self, timestamps: Timestamps) -> Self {
        self.timestamps = Some(timestamps);
        self
    }

    pub fn category(mut self, category: impl fmt::Display, settings: Value) -> Self {
        self.categories.insert(category.to_string(), settings);
        self
    }

    pub fn build(self) -> ImportOptions {
        ImportOptions {
            inner: Arc::new(OptionsInner {
                timestamps: self.timestamps.unwrap_or_else(Timestamps::now),
                categories: self.categories,
            }),
        }
    }
}
