//! # Changes Registry
//!
//! Mapping from category to its pending changes list. Built once per batch and consumed
//! category by category: `pop` takes the registry by value and hands back a registry without
//! that key, so a list can only ever be taken once.

use crate::category::Category;
use std::collections::BTreeMap;
use std::fmt;

pub struct ChangesRegistry<C: Category> {
    entries: BTreeMap<C, Vec<C::Change>>,
}

impl<C: Category> ChangesRegistry<C> {
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Register `changes` under `category`, replacing any earlier list.
    pub fn with_changes(mut self, category: C, changes: Vec<C::Change>) -> Self {
        self.entries.insert(category, changes);
        self
    }

    /// Remove `category`, returning its list (if any) and the remaining registry.
    ///
    /// Popping an absent category is a no-op that returns the registry unchanged.
    pub fn pop(mut self, category: &C) -> (Option<Vec<C::Change>>, Self) {
        let changes = self.entries.remove(category);
        (changes, self)
    }

    /// Pop every category in `categories`, in order.
    ///
    /// Absent categories still appear in the result, paired with `None`.
    pub fn pop_all(self, categories: &[C]) -> (Vec<(C, Option<Vec<C::Change>>)>, Self) {
        categories.iter().fold(
            (Vec::with_capacity(categories.len()), self),
            |(mut popped, registry), category| {
                let (changes, remaining) = registry.pop(category);
                popped.push((*category, changes));
                (popped, remaining)
            },
        )
    }

    pub fn get(&self, category: &C) -> Option<&[C::Change]> {
        self.entries.get(category).map(Vec::as_slice)
    }

    pub fn contains(&self, category: &C) -> bool {
        self.entries.contains_key(category)
    }

    /// Registered categories in ascending order
    pub fn categories(&self) -> impl Iterator<Item = C> + '_ {
        self.entries.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total number of pending changes across every category
    pub fn change_count(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }
}

impl<C: Category> Default for ChangesRegistry<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Category> Clone for ChangesRegistry<C>
where
    C::Change: Clone,
{
    fn clone(&self) -> Self {
        Self {
            entries: self.entries.clone(),
        }
    }
}

impl<C: Category> PartialEq for ChangesRegistry<C>
where
    C::Change: PartialEq,
{
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl<C: Category> fmt::Debug for ChangesRegistry<C>
where
    C::Change: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.entries.iter()).finish()
    }
}

impl<C: Category> FromIterator<(C, Vec<C::Change>)> for ChangesRegistry<C> {
    fn from_iter<I: IntoIterator<Item = (C, Vec<C::Change>)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}
