//! # Registry Infrastructure
//!
//! The consumable registry of pending changes that every stage draws from.
//!
//! ```text
//! ChangesRegistry
//! ├── pop       (take one category, return the rest)
//! └── pop_all   (take a list of categories in order)
//! ```

pub mod changes_registry;

pub use changes_registry::ChangesRegistry;
