//! Rules for choosing whom to eliminate when several candidates share the
//! fewest votes.
//!
//! The engine applies them in order, stopping as soon as a single candidate
//! is left:
//!
//! 1. [`combined_below_next`]: if the tied group together still trails the
//!    next group up, the whole group goes at once.
//! 2. [`break_by_previous_rounds`]: fewest votes in earlier rounds, most
//!    recent first.
//! 3. [`break_by_projection`]: fewest votes when every ballot is pushed
//!    further down its ranking.
//! 4. [`TiebreakPermutation`]: a fixed ordering of uid characters.

use crate::model::{Ballot, Candidate};
use crate::reports::RoundResult;
use crate::tabulator::tally::VoteTally;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};
use tracing::{debug, warn};

/// Which rule settled an elimination tie.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TiebreakStage {
    CombinedBelowNext,
    PreviousRounds,
    ForwardProjection,
    Permutation,
}

/// True when the tied group's combined votes are strictly below those of
/// the lowest eligible candidate outside the group. A missing group counts
/// as zero votes.
pub fn combined_below_next(
    tally: &VoteTally,
    tied: &BTreeSet<Candidate>,
    eligible: &BTreeSet<Candidate>,
) -> bool {
    let combined: f64 = tied.iter().map(|c| tally.votes_for(c)).sum();

    let others: BTreeSet<Candidate> = eligible.difference(tied).cloned().collect();
    let next_highest = tally
        .candidates_with_fewest(&others)
        .iter()
        .next()
        .map(|c| tally.votes_for(c))
        .unwrap_or(0.0);

    combined < next_highest
}

/// Narrows the tie using earlier rounds, most recent first.
pub fn break_by_previous_rounds(
    tied: &BTreeSet<Candidate>,
    history: &[RoundResult],
) -> BTreeSet<Candidate> {
    let mut remaining = tied.clone();
    for round in history.iter().rev() {
        if remaining.len() <= 1 {
            break;
        }
        remaining = round.tally.candidates_with_fewest(&remaining);
        debug!(round = round.round, remaining = remaining.len(), "previous round tiebreak");
    }
    remaining
}

/// Narrows the tie by projecting later preferences.
///
/// Works on a private copy of `ballots`. Each pass pushes every ballot one
/// rank further, skips candidates `is_live` rejects, and re-tallies; ballots
/// with nothing left drop out. A ballot resting on No Confidence stays put
/// when No Confidence may not be eliminated, and drops out of the
/// projection.
pub fn break_by_projection<F>(
    tied: &BTreeSet<Candidate>,
    ballots: &[Ballot],
    is_live: F,
    can_eliminate_no_confidence: bool,
) -> BTreeSet<Candidate>
where
    F: Fn(&Candidate) -> bool,
{
    let mut remaining = tied.clone();
    let mut projected: Vec<Ballot> = ballots.to_vec();
    let mut depth = 0;

    while remaining.len() > 1 && !projected.is_empty() {
        depth += 1;
        let mut tally = VoteTally::new();

        projected.retain_mut(|ballot| {
            let held_by_no_confidence = !can_eliminate_no_confidence
                && ballot
                    .active_preference()
                    .map_or(false, Candidate::is_no_confidence);
            if !held_by_no_confidence && ballot.advance().is_err() {
                return false;
            }
            ballot.skip_while_dead(&is_live);

            match ballot.active_preference() {
                None => false,
                Some(candidate) if !can_eliminate_no_confidence && candidate.is_no_confidence() => {
                    false
                }
                Some(candidate) => {
                    if let Err(e) = tally.cast_vote(candidate, ballot.weight()) {
                        warn!("projected vote skipped: {}", e);
                    }
                    true
                }
            }
        });

        remaining = tally.candidates_with_fewest(&remaining);
        debug!(depth, remaining = remaining.len(), "forward tiebreak");
    }

    remaining
}

/// A permutation of characters used to order candidate uids when every
/// other tie-break rule fails.
///
/// Each uid maps to the positions of its characters in the permutation,
/// compared lexicographically. Characters missing from the permutation sort
/// after all present ones. When one key is a prefix of the other the
/// shorter uid comes first, and identical keys fall back to comparing the
/// uids themselves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TiebreakPermutation {
    permutation: String,
    positions: HashMap<char, usize>,
}

/// Printable ASCII, the alphabet shuffled for generated permutations.
pub fn printable_alphabet() -> impl Iterator<Item = char> {
    ' '..='~'
}

impl TiebreakPermutation {
    pub fn new(permutation: impl Into<String>) -> TiebreakPermutation {
        let permutation = permutation.into();
        let mut positions = HashMap::new();
        for (i, c) in permutation.chars().enumerate() {
            positions.entry(c).or_insert(i);
        }
        TiebreakPermutation {
            permutation,
            positions,
        }
    }

    /// Shuffles [`printable_alphabet`] with `rng`.
    pub fn generate<R: Rng + ?Sized>(rng: &mut R) -> TiebreakPermutation {
        let mut chars: Vec<char> = printable_alphabet().collect();
        chars.shuffle(rng);
        TiebreakPermutation::new(chars.into_iter().collect::<String>())
    }

    pub fn as_str(&self) -> &str {
        &self.permutation
    }

    pub fn sort_key(&self, uid: &str) -> Vec<usize> {
        let missing = self.positions.len();
        uid.chars()
            .map(|c| self.positions.get(&c).copied().unwrap_or(missing))
            .collect()
    }

    pub fn compare(&self, a: &Candidate, b: &Candidate) -> Ordering {
        self.sort_key(a.uid())
            .cmp(&self.sort_key(b.uid()))
            .then_with(|| a.uid().cmp(b.uid()))
    }

    /// The first candidate in permutation order that is not No Confidence.
    pub fn first_eliminable<'a, I>(&self, candidates: I) -> Option<&'a Candidate>
    where
        I: IntoIterator<Item = &'a Candidate>,
    {
        candidates
            .into_iter()
            .filter(|c| !c.is_no_confidence())
            .min_by(|a, b| self.compare(a, b))
    }
}
