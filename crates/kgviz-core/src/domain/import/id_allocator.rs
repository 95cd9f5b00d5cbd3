//! Fresh id allocation for renamed entities
//!
//! Candidates are `base_1`, `base_2`, ... and the first one not already taken
//! wins. There is no upper bound on the counter; callers that want a cap must
//! impose it themselves.

use crate::domain::graph::GraphStore;
use crate::error::Result;

/// The `n`-th candidate derived from `base`
pub fn candidate(base: &str, n: u64) -> String {
    format!("{}_{}", base, n)
}

/// Return the first candidate for which `exists` is false
pub fn allocate<F>(base: &str, mut exists: F) -> String
where
    F: FnMut(&str) -> bool,
{
    let mut counter = 1u64;
    loop {
        let id = candidate(base, counter);
        if !exists(&id) {
            return id;
        }
        counter += 1;
    }
}

/// Allocate an entity id not yet used in `domain`, probing the store
pub async fn allocate_entity_id<S>(store: &mut S, base: &str, domain: &str) -> Result<String>
where
    S: GraphStore + ?Sized,
{
    let mut counter = 1u64;
    loop {
        let id = candidate(base, counter);
        if !store.entity_exists(&id, domain).await? {
            return Ok(id);
        }
        counter += 1;
    }
}
