use crate::error::TallyError;
use crate::model::Candidate;
use itertools::Itertools;
use serde::ser::{Serialize, Serializer};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Vote totals for one round of counting.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VoteTally {
    votes_cast: f64,
    votes: BTreeMap<Candidate, f64>,
}

impl VoteTally {
    pub fn new() -> VoteTally {
        VoteTally::default()
    }

    /// Adds `weight` to the candidate's total. A zero weight still registers
    /// the candidate as standing in this round.
    pub fn cast_vote(&mut self, candidate: &Candidate, weight: f64) -> Result<(), TallyError> {
        if !weight.is_finite() || weight < 0.0 {
            return Err(TallyError::InvalidVote {
                uid: candidate.uid().to_string(),
                weight,
            });
        }

        self.votes_cast += weight;
        match self.votes.get_mut(candidate) {
            Some(votes) => *votes += weight,
            None => {
                self.votes.insert(candidate.clone(), weight);
            }
        }
        Ok(())
    }

    pub fn votes_cast(&self) -> f64 {
        self.votes_cast
    }

    pub fn votes_for(&self, candidate: &Candidate) -> f64 {
        self.votes.get(candidate).copied().unwrap_or(0.0)
    }

    pub fn candidates(&self) -> BTreeSet<Candidate> {
        self.votes.keys().cloned().collect()
    }

    pub fn contains(&self, candidate: &Candidate) -> bool {
        self.votes.contains_key(candidate)
    }

    pub fn is_empty(&self) -> bool {
        self.votes.is_empty()
    }

    pub fn candidates_at_or_above(
        &self,
        candidates: &BTreeSet<Candidate>,
        threshold: f64,
    ) -> BTreeSet<Candidate> {
        candidates
            .iter()
            .filter(|candidate| self.votes_for(candidate) >= threshold)
            .cloned()
            .collect()
    }

    /// Every candidate in `candidates` sharing the lowest total. Candidates
    /// this tally has never seen count as zero.
    pub fn candidates_with_fewest(&self, candidates: &BTreeSet<Candidate>) -> BTreeSet<Candidate> {
        let mut fewest = BTreeSet::new();
        let mut fewest_votes = f64::INFINITY;

        for candidate in candidates {
            let votes = self.votes_for(candidate);
            if votes < fewest_votes {
                fewest_votes = votes;
                fewest.clear();
            }
            if votes == fewest_votes {
                fewest.insert(candidate.clone());
            }
        }

        fewest
    }
}

#[derive(serde::Serialize)]
struct TallyRepr<'a> {
    votes_cast: f64,
    votes: BTreeMap<&'a str, f64>,
}

impl Serialize for VoteTally {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        TallyRepr {
            votes_cast: self.votes_cast,
            votes: self
                .votes
                .iter()
                .map(|(candidate, votes)| (candidate.uid(), *votes))
                .collect(),
        }
        .serialize(serializer)
    }
}

impl fmt::Display for VoteTally {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VoteTally for {} votes:", self.votes_cast)?;
        let by_votes = self
            .votes
            .iter()
            .sorted_by(|(_, a), (_, b)| b.total_cmp(a));
        for (candidate, votes) in by_votes {
            write!(f, "\n{}: {}", candidate, votes)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(uid: &str) -> Candidate {
        Candidate::new(uid, None)
    }

    fn set(uids: &[&str]) -> BTreeSet<Candidate> {
        uids.iter().map(|uid| candidate(uid)).collect()
    }

    fn sample_tally() -> VoteTally {
        let mut tally = VoteTally::new();
        tally.cast_vote(&candidate("a"), 3.0).unwrap();
        tally.cast_vote(&candidate("b"), 1.5).unwrap();
        tally.cast_vote(&candidate("c"), 1.5).unwrap();
        tally.cast_vote(&candidate("a"), 2.0).unwrap();
        tally
    }

    #[test]
    fn test_cast_accumulates() {
        let tally = sample_tally();
        assert_eq!(tally.votes_for(&candidate("a")), 5.0);
        assert_eq!(tally.votes_for(&candidate("z")), 0.0);
        assert_eq!(tally.votes_cast(), 8.0);
        assert_eq!(tally.candidates(), set(&["a", "b", "c"]));
    }

    #[test]
    fn test_invalid_votes_are_not_counted() {
        let mut tally = sample_tally();
        assert!(tally.cast_vote(&candidate("a"), -1.0).is_err());
        assert!(tally.cast_vote(&candidate("d"), f64::NAN).is_err());
        assert_eq!(tally.votes_cast(), 8.0);
        assert!(!tally.contains(&candidate("d")));
    }

    #[test]
    fn test_zero_vote_registers_candidate() {
        let mut tally = VoteTally::new();
        tally.cast_vote(&candidate("a"), 0.0).unwrap();
        assert!(tally.contains(&candidate("a")));
        assert_eq!(tally.votes_cast(), 0.0);
    }

    #[test]
    fn test_repeat_casts_keep_first_key() {
        let mut tally = VoteTally::new();
        let named = Candidate::new("a", Some("Alice".to_string()));
        tally.cast_vote(&named, 0.0).unwrap();
        tally.cast_vote(&candidate("a"), 1.0).unwrap();
        tally.cast_vote(&candidate("a"), 0.5).unwrap();

        assert_eq!(tally.votes_for(&named), 1.5);
        let stored = tally.candidates().into_iter().next().unwrap();
        assert_eq!(stored.name(), Some("Alice"));
    }

    #[test]
    fn test_candidates_at_or_above() {
        let tally = sample_tally();
        assert_eq!(
            tally.candidates_at_or_above(&tally.candidates(), 1.5),
            set(&["a", "b", "c"])
        );
        assert_eq!(
            tally.candidates_at_or_above(&set(&["b", "c"]), 2.0),
            BTreeSet::new()
        );
    }

    #[test]
    fn test_fewest_returns_whole_tie() {
        let tally = sample_tally();
        assert_eq!(
            tally.candidates_with_fewest(&tally.candidates()),
            set(&["b", "c"])
        );
        assert_eq!(tally.candidates_with_fewest(&set(&["a", "c"])), set(&["c"]));
        assert_eq!(tally.candidates_with_fewest(&set(&["a", "z"])), set(&["z"]));
        assert!(tally.candidates_with_fewest(&BTreeSet::new()).is_empty());
    }

    #[test]
    fn test_display_orders_by_votes() {
        let mut tally = VoteTally::new();
        tally.cast_vote(&candidate("a"), 1.0).unwrap();
        tally.cast_vote(&candidate("b"), 2.0).unwrap();
        assert_eq!(tally.to_string(), "VoteTally for 3 votes:\nb: 2\na: 1");
    }
}
