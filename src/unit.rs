//! # Atomic Units
//!
//! An atomic unit accumulates store operations that the external store applies
//! all-or-nothing. Units are threaded through executor calls by value, so whichever task or
//! fold is building one owns it exclusively until it hands it back.

use serde::Serialize;
use std::collections::HashSet;
use thiserror::Error;

/// Accumulator contract required by the scheduler.
///
/// `Default` must produce a fresh, empty unit; every concurrent path starts from one.
pub trait AtomicUnit: Default + Send + 'static {
    /// Number of staged operations, used for reporting.
    fn operation_count(&self) -> usize;
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UnitError {
    #[error("Operation {name:?} already exists in this unit")]
    DuplicateOperation { name: String },
}

/// Ordered list of uniquely named operations.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Multi<O> {
    operations: Vec<(String, O)>,
    #[serde(skip)]
    names: HashSet<String>,
}

impl<O> Multi<O> {
    pub fn new() -> Self {
        Self {
            operations: Vec::new(),
            names: HashSet::new(),
        }
    }

    /// Append `operation` under `name`, which must be unique within the unit.
    pub fn push(mut self, name: impl Into<String>, operation: O) -> Result<Self, UnitError> {
        let name = name.into();
        if !self.names.insert(name.clone()) {
            return Err(UnitError::DuplicateOperation { name });
        }
        self.operations.push((name, operation));
        Ok(self)
    }

    /// Append every operation of `other` after this unit's operations.
    pub fn append(self, other: Self) -> Result<Self, UnitError> {
        other
            .operations
            .into_iter()
            .try_fold(self, |multi, (name, operation)| multi.push(name, operation))
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.operations.iter().map(|(name, _)| name.as_str())
    }

    pub fn operations(&self) -> impl Iterator<Item = &O> {
        self.operations.iter().map(|(_, operation)| operation)
    }

    pub fn into_operations(self) -> Vec<(String, O)> {
        self.operations
    }
}

impl<O> Default for Multi<O> {
    fn default() -> Self {
        Self::new()
    }
}

impl<O: Send + 'static> AtomicUnit for Multi<O> {
    fn operation_count(&self) -> usize {
        self.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_preserves_order() {
        let multi = Multi::new()
            .push("insert_addresses", 1)
            .and_then(|m| m.push("insert_blocks", 2))
            .unwrap();

        assert_eq!(
            multi.names().collect::<Vec<_>>(),
            vec!["insert_addresses", "insert_blocks"]
        );
        assert_eq!(multi.operations().copied().collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(multi.operation_count(), 2);
    }

    #[test]
    fn test_duplicate_name_is_rejected() {
        let result = Multi::new()
            .push("insert_blocks", ())
            .and_then(|m| m.push("insert_blocks", ()));

        assert_eq!(
            result,
            Err(UnitError::DuplicateOperation {
                name: "insert_blocks".to_string()
            })
        );
    }

    #[test]
    fn test_append_keeps_both_orders() {
        let first = Multi::new().push("a", 'a').unwrap();
        let second = Multi::new()
            .push("b", 'b')
            .and_then(|m| m.push("c", 'c'))
            .unwrap();

        let joined = first.append(second).unwrap();
        assert_eq!(joined.names().collect::<Vec<_>>(), vec!["a", "b", "c"]);
        assert!(joined.contains("b"));
    }

    #[test]
    fn test_append_rejects_overlap() {
        let first = Multi::new().push("a", 1).unwrap();
        let second = Multi::new().push("a", 2).unwrap();
        assert!(first.append(second).is_err());
    }
}
