use super::categories::TestCategory;
use proptest::prelude::*;
use proptest::sample::select;

/// Strategy for picking one test category
pub fn category_strategy() -> impl Strategy<Value = TestCategory> {
    select(vec![
        TestCategory::Addresses,
        TestCategory::Blocks,
        TestCategory::Transactions,
        TestCategory::Logs,
    ])
}

/// Strategy for changes lists with unique, ordered payloads
pub fn changes_strategy(max_len: usize) -> impl Strategy<Value = Vec<String>> {
    (0..=max_len).prop_map(|len| (0..len).map(|i| format!("c{i}")).collect())
}

/// Strategy for registries given as (category, changes) pairs; later duplicates win
pub fn registry_entries_strategy() -> impl Strategy<Value = Vec<(TestCategory, Vec<String>)>> {
    prop::collection::vec((category_strategy(), changes_strategy(12)), 0..6)
}

/// Strategy for valid chunk sizes
pub fn chunk_size_strategy() -> impl Strategy<Value = usize> {
    1usize..=8
}
