//! # Categories
//!
//! A category names one class of pending entity change and carries the executor that turns
//! a list of those changes into operations on an atomic unit. Implement [`Category`] on a
//! closed enum and dispatch inside `execute` with a `match`, so every executor is resolved at
//! compile time.
//!
//! ```rust
//! use async_trait::async_trait;
//! use staged_import::category::Category;
//! use staged_import::options::ImportOptions;
//! use staged_import::unit::Multi;
//! use std::fmt;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
//! enum Chain {
//!     Addresses,
//!     Blocks,
//! }
//!
//! impl fmt::Display for Chain {
//!     fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
//!         match self {
//!             Chain::Addresses => write!(f, "addresses"),
//!             Chain::Blocks => write!(f, "blocks"),
//!         }
//!     }
//! }
//!
//! #[async_trait]
//! impl Category for Chain {
//!     type Change = String;
//!     type Unit = Multi<String>;
//!
//!     async fn execute(
//!         &self,
//!         unit: Multi<String>,
//!         changes: Vec<String>,
//!         _options: &ImportOptions,
//!     ) -> anyhow::Result<Multi<String>> {
//!         let name = format!("insert_{self}");
//!         Ok(unit.push(name, changes.join(","))?)
//!     }
//! }
//! ```

use crate::options::ImportOptions;
use crate::unit::AtomicUnit;
use async_trait::async_trait;
use std::fmt;
use std::hash::Hash;

#[async_trait]
pub trait Category:
    Copy + Eq + Ord + Hash + fmt::Debug + fmt::Display + Send + Sync + 'static
{
    /// Payload of one pending mutation
    type Change: Send + 'static;

    /// Accumulator this category's executor populates
    type Unit: AtomicUnit;

    /// Stage `changes` into `unit` and return it.
    ///
    /// Called from independent concurrent tasks; must not rely on state shared with other
    /// in-flight calls. The returned unit keeps the order of `changes`.
    async fn execute(
        &self,
        unit: Self::Unit,
        changes: Vec<Self::Change>,
        options: &ImportOptions,
    ) -> anyhow::Result<Self::Unit>;
}
