use crate::error::BallotError;
use crate::model::Candidate;
use crate::tabulator::tally::VoteTally;
use crate::tabulator::tiebreak::TiebreakStage;
use itertools::Itertools;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;

/// Why a count stopped before filling every seat it could.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum HaltReason {
    NoConfidenceElected,
    /// A tie survived every rule and permutation tie-breaks were disabled.
    UnresolvedTie,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ElectionState {
    Running,
    HaltedByRule(HaltReason),
    Completed,
}

/// A snapshot of one round of counting.
#[derive(Debug, Clone, Serialize)]
pub struct RoundResult {
    pub round: usize,
    pub quota: f64,
    pub tally: VoteTally,
    pub elected: BTreeSet<Candidate>,
    pub eliminated: BTreeSet<Candidate>,
    /// The rule that settled a tie for fewest votes, if there was one.
    pub tiebreak: Option<TiebreakStage>,
    pub random_tiebreak_occurred: bool,
}

impl RoundResult {
    pub(crate) fn new(round: usize, quota: f64, tally: VoteTally) -> RoundResult {
        RoundResult {
            round,
            quota,
            tally,
            elected: BTreeSet::new(),
            eliminated: BTreeSet::new(),
            tiebreak: None,
            random_tiebreak_occurred: false,
        }
    }

    #[cfg(test)]
    pub(crate) fn for_test(round: usize, tally: VoteTally) -> RoundResult {
        RoundResult::new(round, 0.0, tally)
    }
}

/// A ranking that was left out of the count, with the reason.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RejectedBallot {
    pub index: usize,
    #[serde(serialize_with = "serialize_display")]
    pub error: BallotError,
}

fn serialize_display<S: serde::Serializer>(
    error: &BallotError,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_str(error)
}

/// Everything a count produced.
#[derive(Debug, Clone, Serialize)]
pub struct TabulationResults {
    pub seats: usize,
    pub ballot_count: usize,
    pub elected: BTreeSet<Candidate>,
    pub rounds: Vec<RoundResult>,
    /// The permutation the final tie-break used (or would have used), so the
    /// count can be replayed.
    pub tiebreak_permutation: String,
    pub state: ElectionState,
    pub rejected_ballots: Vec<RejectedBallot>,
}

/// Condensed view of a count for listings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultSummary {
    pub elected: Vec<String>,
    pub seats: usize,
    pub seats_filled: usize,
    pub total_rounds: usize,
    pub total_ballots: usize,
    pub state: ElectionState,
}

impl TabulationResults {
    /// True when the count filled every seat without halting.
    pub fn is_complete(&self) -> bool {
        self.state == ElectionState::Completed && self.elected.len() == self.seats
    }

    pub fn no_confidence_elected(&self) -> bool {
        self.elected.iter().any(Candidate::is_no_confidence)
    }

    pub fn summary(&self) -> ResultSummary {
        ResultSummary {
            elected: self.elected.iter().map(|c| c.uid().to_string()).collect(),
            seats: self.seats,
            seats_filled: self.elected.len(),
            total_rounds: self.rounds.len(),
            total_ballots: self.ballot_count,
            state: self.state,
        }
    }
}

impl fmt::Display for RoundResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Round {} with quota {:.3}:\n{}", self.round, self.quota, self.tally)?;
        if !self.elected.is_empty() {
            write!(f, "\nElected: {}", self.elected.iter().join(", "))?;
        }
        if !self.eliminated.is_empty() {
            write!(f, "\nEliminated: {}", self.eliminated.iter().join(", "))?;
        }
        if self.random_tiebreak_occurred {
            write!(f, "\nA random tiebreak occurred in this round")?;
        }
        Ok(())
    }
}

impl fmt::Display for TabulationResults {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Results for {} ballots, {} seat(s):",
            self.ballot_count, self.seats
        )?;
        if !self.elected.is_empty() {
            write!(f, "\nElected: {}", self.elected.iter().join(", "))?;
        }
        for round in &self.rounds {
            write!(f, "\n{}", round)?;
        }
        match self.state {
            ElectionState::HaltedByRule(HaltReason::NoConfidenceElected) => {
                write!(f, "\nHalted: No Confidence was elected")?
            }
            ElectionState::HaltedByRule(HaltReason::UnresolvedTie) => {
                write!(f, "\nHalted: a tie could not be broken")?
            }
            _ => {}
        }
        Ok(())
    }
}
