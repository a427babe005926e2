//! Uniform random choice of one unposted group.
//!
//! The random source is injected. Eligible basenames are drawn in sorted
//! order, so a seeded RNG reproduces the same pick for the same directory
//! and ledger.

use crate::types::{GroupMap, PostGroup, PostedSet};
use rand::Rng;
use rand::seq::SliceRandom;

/// Outcome of a selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection<'a> {
    Chosen(&'a PostGroup),
    /// Every accepted group is already posted. A normal, successful outcome.
    NothingEligible,
}

/// Accepted basenames that aren't in the ledger, sorted.
pub fn eligible<'a>(accepted: &'a GroupMap, posted: &PostedSet) -> Vec<&'a str> {
    accepted
        .keys()
        .filter(|b| !posted.contains(b.as_str()))
        .map(String::as_str)
        .collect()
}

pub fn select<'a, R>(accepted: &'a GroupMap, posted: &PostedSet, rng: &mut R) -> Selection<'a>
where
    R: Rng + ?Sized,
{
    let candidates = eligible(accepted, posted);
    match candidates.choose(rng).and_then(|b| accepted.get(*b)) {
        Some(group) => Selection::Chosen(group),
        None => Selection::NothingEligible,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::collections::BTreeSet;

    fn groups(names: &[&str]) -> GroupMap {
        names
            .iter()
            .map(|n| (n.to_string(), PostGroup::new(*n)))
            .collect()
    }

    fn posted(names: &[&str]) -> PostedSet {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn nothing_eligible_when_all_posted() {
        let accepted = groups(&["solo"]);
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(
            select(&accepted, &posted(&["solo"]), &mut rng),
            Selection::NothingEligible
        );
    }

    #[test]
    fn nothing_eligible_when_empty() {
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(
            select(&GroupMap::new(), &PostedSet::new(), &mut rng),
            Selection::NothingEligible
        );
    }

    #[test]
    fn single_eligible_always_chosen() {
        let accepted = groups(&["a", "b", "c"]);
        let done = posted(&["a", "c"]);
        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            match select(&accepted, &done, &mut rng) {
                Selection::Chosen(g) => assert_eq!(g.basename, "b"),
                Selection::NothingEligible => panic!("b is eligible"),
            }
        }
    }

    #[test]
    fn never_returns_posted_basename() {
        let accepted = groups(&["a", "b", "c", "d", "e"]);
        let done = posted(&["b", "d"]);
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            if let Selection::Chosen(g) = select(&accepted, &done, &mut rng) {
                assert!(!done.contains(&g.basename));
            }
        }
    }

    #[test]
    fn every_eligible_group_gets_picked() {
        let accepted = groups(&["a", "b", "c", "d"]);
        let mut rng = StdRng::seed_from_u64(42);
        let mut seen = BTreeSet::new();
        for _ in 0..500 {
            if let Selection::Chosen(g) = select(&accepted, &PostedSet::new(), &mut rng) {
                seen.insert(g.basename.clone());
            }
        }
        assert_eq!(seen.len(), 4);
    }

    #[test]
    fn same_seed_same_pick() {
        let accepted = groups(&["a", "b", "c", "d", "e", "f"]);
        let pick = |seed| {
            let mut rng = StdRng::seed_from_u64(seed);
            match select(&accepted, &PostedSet::new(), &mut rng) {
                Selection::Chosen(g) => g.basename.clone(),
                Selection::NothingEligible => unreachable!(),
            }
        };
        assert_eq!(pick(99), pick(99));
    }

    #[test]
    fn eligible_is_sorted_difference() {
        let accepted = groups(&["c", "a", "b"]);
        assert_eq!(eligible(&accepted, &posted(&["b", "zzz"])), vec!["a", "c"]);
    }
}
