//! Single Transferable Vote count with a Droop quota.
//!
//! Every round re-tallies the live ballots, then does exactly one of:
//! fill the remaining seats when the field is small enough, elect everyone
//! at or above quota (scaling down their ballots by the surplus fraction),
//! or eliminate the candidate with the fewest votes.

pub mod options;
pub mod tally;
pub mod tiebreak;

use crate::error::{ElectionError, Result};
use crate::model::{Ballot, Candidate};
use crate::reports::{ElectionState, HaltReason, RejectedBallot, RoundResult, TabulationResults};
use options::TabulationOptions;
use rand::Rng;
use std::collections::BTreeSet;
use tally::VoteTally;
use tiebreak::{TiebreakPermutation, TiebreakStage};
use tracing::{debug, info, warn};

/// Votes needed to be elected outright.
pub fn droop_quota(votes_cast: f64, seats_vacant: usize) -> f64 {
    votes_cast / (seats_vacant as f64 + 1.0) + 1.0
}

/// An election ready to be counted. Holds its own copy of the ballots;
/// every count starts again from that copy.
#[derive(Debug, Clone)]
pub struct Election {
    ballots: Vec<Ballot>,
    seats: usize,
    options: TabulationOptions,
    rejected: Vec<RejectedBallot>,
}

impl Election {
    pub fn new<I>(ballots: I, seats: usize, options: TabulationOptions) -> Election
    where
        I: IntoIterator<Item = Ballot>,
    {
        Election {
            ballots: ballots.into_iter().collect(),
            seats,
            options,
            rejected: Vec::new(),
        }
    }

    /// Builds ballots from raw rankings. Invalid rankings are left out and
    /// reported in the results.
    pub fn from_rankings<I>(rankings: I, seats: usize, options: TabulationOptions) -> Election
    where
        I: IntoIterator<Item = Vec<Candidate>>,
    {
        let mut ballots = Vec::new();
        let mut rejected = Vec::new();

        for (index, ranking) in rankings.into_iter().enumerate() {
            match Ballot::new(ranking) {
                Ok(ballot) => ballots.push(ballot),
                Err(error) => {
                    warn!(index, "ballot rejected: {}", error);
                    rejected.push(RejectedBallot { index, error });
                }
            }
        }

        Election {
            ballots,
            seats,
            options,
            rejected,
        }
    }

    pub fn ballots(&self) -> &[Ballot] {
        &self.ballots
    }

    pub fn seats(&self) -> usize {
        self.seats
    }

    pub fn options(&self) -> &TabulationOptions {
        &self.options
    }

    pub fn rejected_ballots(&self) -> &[RejectedBallot] {
        &self.rejected
    }

    pub fn compute(&self) -> Result<TabulationResults> {
        self.compute_with_rng(&mut rand::thread_rng())
    }

    /// Runs the count. `rng` is only used to generate a tie-break
    /// permutation when the options do not fix one.
    pub fn compute_with_rng<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<TabulationResults> {
        let permutation = match &self.options.tiebreak_permutation {
            Some(permutation) => TiebreakPermutation::new(permutation.as_str()),
            None => TiebreakPermutation::generate(rng),
        };
        Count::new(self, permutation).run()
    }
}

/// Perform a Single Transferable Vote tabulation
pub fn tabulate_stv(
    ballots: &[Ballot],
    seats: usize,
    options: &TabulationOptions,
) -> Result<TabulationResults> {
    Election::new(ballots.iter().cloned(), seats, options.clone()).compute()
}

/// State of a single count in progress.
struct Count<'a> {
    election: &'a Election,
    permutation: TiebreakPermutation,
    active: Vec<Ballot>,
    exhausted: Vec<Ballot>,
    elected: BTreeSet<Candidate>,
    eliminated: BTreeSet<Candidate>,
    rounds: Vec<RoundResult>,
    state: ElectionState,
}

impl<'a> Count<'a> {
    fn new(election: &'a Election, permutation: TiebreakPermutation) -> Count<'a> {
        Count {
            election,
            permutation,
            active: election.ballots.clone(),
            exhausted: Vec::new(),
            elected: BTreeSet::new(),
            eliminated: BTreeSet::new(),
            rounds: Vec::new(),
            state: ElectionState::Running,
        }
    }

    fn options(&self) -> &'a TabulationOptions {
        &self.election.options
    }

    fn run(mut self) -> Result<TabulationResults> {
        let seats = self.election.seats;
        info!(ballots = self.active.len(), seats, "starting STV count");

        while self.state == ElectionState::Running && self.elected.len() < seats {
            self.state = self.count_round()?;
        }
        if self.state == ElectionState::Running {
            self.state = ElectionState::Completed;
        }

        info!(
            rounds = self.rounds.len(),
            elected = self.elected.len(),
            exhausted = self.exhausted.len(),
            state = ?self.state,
            "count finished"
        );

        Ok(TabulationResults {
            seats,
            ballot_count: self.election.ballots.len(),
            elected: self.elected,
            rounds: self.rounds,
            tiebreak_permutation: self.permutation.as_str().to_string(),
            state: self.state,
            rejected_ballots: self.election.rejected.clone(),
        })
    }

    fn count_round(&mut self) -> Result<ElectionState> {
        let round = self.rounds.len();
        let tally = self.resolve_and_tally();

        if tally.is_empty() {
            info!(round, "no ballots left to count");
            return Ok(ElectionState::Completed);
        }

        let seats_vacant = self.election.seats - self.elected.len();
        let quota = droop_quota(tally.votes_cast(), seats_vacant);
        debug!(round, quota, votes_cast = tally.votes_cast(), "round tallied");

        let mut record = RoundResult::new(round, quota, tally);
        let standing = record.tally.candidates();

        // Few enough candidates left to fill every seat, but never with
        // someone polling below No Confidence.
        if standing.len() <= seats_vacant {
            let floor = record.tally.votes_for(&Candidate::no_confidence());
            let to_elect = record.tally.candidates_at_or_above(&standing, floor);
            for candidate in &to_elect {
                info!(round, candidate = candidate.uid(), "elected to fill a remaining seat");
            }
            self.elected.extend(to_elect.iter().cloned());
            record.elected = to_elect;
            self.rounds.push(record);
            return Ok(ElectionState::Completed);
        }

        let winners = record.tally.candidates_at_or_above(&standing, quota);
        if !winners.is_empty() {
            for winner in &winners {
                let votes = record.tally.votes_for(winner);
                info!(round, candidate = winner.uid(), votes, "elected");
                if !winner.is_no_confidence() {
                    self.transfer_surplus(winner, votes, quota)?;
                }
            }
            let no_confidence_won = winners.iter().any(Candidate::is_no_confidence);
            self.elected.extend(winners.iter().cloned());
            record.elected = winners;
            self.rounds.push(record);

            if no_confidence_won {
                info!(round, "No Confidence elected, halting");
                return Ok(ElectionState::HaltedByRule(HaltReason::NoConfidenceElected));
            }
            return Ok(ElectionState::Running);
        }

        let state = self.eliminate(&mut record)?;
        self.rounds.push(record);
        Ok(state)
    }

    /// Moves every ballot past elected and eliminated candidates, retires the
    /// exhausted ones, and tallies the rest.
    fn resolve_and_tally(&mut self) -> VoteTally {
        let elected = &self.elected;
        let eliminated = &self.eliminated;
        let is_live = |c: &Candidate| !elected.contains(c) && !eliminated.contains(c);

        let mut tally = VoteTally::new();
        let mut still_active = Vec::with_capacity(self.active.len());

        for mut ballot in self.active.drain(..) {
            ballot.skip_while_dead(is_live);
            if ballot.is_exhausted() {
                self.exhausted.push(ballot);
                continue;
            }

            for candidate in ballot.ranking().iter().filter(|c| is_live(*c)) {
                if let Err(e) = tally.cast_vote(candidate, 0.0) {
                    warn!("candidate not registered: {}", e);
                }
            }
            if let Some(candidate) = ballot.active_preference() {
                if let Err(e) = tally.cast_vote(candidate, ballot.weight()) {
                    warn!("vote skipped: {}", e);
                }
            }
            still_active.push(ballot);
        }

        self.active = still_active;
        tally
    }

    /// Scales every ballot held by `winner` so that only the surplus moves
    /// on. A winner exactly on quota passes nothing on.
    fn transfer_surplus(&mut self, winner: &Candidate, votes: f64, quota: f64) -> Result<()> {
        let surplus = votes - quota;
        let multiplier = surplus / votes;
        debug!(candidate = winner.uid(), surplus, multiplier, "transferring surplus");

        for ballot in self
            .active
            .iter_mut()
            .filter(|ballot| ballot.active_preference() == Some(winner))
        {
            ballot.scale_weight(multiplier)?;
        }
        Ok(())
    }

    fn eliminate(&mut self, record: &mut RoundResult) -> Result<ElectionState> {
        let round = record.round;
        let options = self.options();

        let eligible: BTreeSet<Candidate> = record
            .tally
            .candidates()
            .into_iter()
            .filter(|c| options.can_eliminate_no_confidence || !c.is_no_confidence())
            .collect();
        if eligible.is_empty() {
            return Err(ElectionError::NoEligibleCandidates { round });
        }

        let mut to_eliminate = record.tally.candidates_with_fewest(&eligible);

        if to_eliminate.len() > 1 {
            debug!(round, tied = to_eliminate.len(), "tie for fewest votes");

            if tiebreak::combined_below_next(&record.tally, &to_eliminate, &eligible) {
                record.tiebreak = Some(TiebreakStage::CombinedBelowNext);
            } else {
                let resolved = self.break_tie(round, &to_eliminate, record)?;
                match resolved {
                    Some(loser) => to_eliminate = loser,
                    None => return Ok(ElectionState::HaltedByRule(HaltReason::UnresolvedTie)),
                }
            }
        }

        for candidate in &to_eliminate {
            info!(
                round,
                candidate = candidate.uid(),
                votes = record.tally.votes_for(candidate),
                "eliminated"
            );
        }
        self.eliminated.extend(to_eliminate.iter().cloned());
        record.eliminated = to_eliminate;
        Ok(ElectionState::Running)
    }

    /// Runs the tie-break cascade. Returns `None` when the tie survives and
    /// permutation tie-breaks are disabled.
    fn break_tie(
        &self,
        round: usize,
        tied: &BTreeSet<Candidate>,
        record: &mut RoundResult,
    ) -> Result<Option<BTreeSet<Candidate>>> {
        let remaining = tiebreak::break_by_previous_rounds(tied, &self.rounds);
        if remaining.len() == 1 {
            record.tiebreak = Some(TiebreakStage::PreviousRounds);
            return Ok(Some(remaining));
        }

        let elected = &self.elected;
        let eliminated = &self.eliminated;
        let remaining = tiebreak::break_by_projection(
            &remaining,
            &self.active,
            |c: &Candidate| !elected.contains(c) && !eliminated.contains(c),
            self.options().can_eliminate_no_confidence,
        );
        if remaining.len() == 1 {
            record.tiebreak = Some(TiebreakStage::ForwardProjection);
            return Ok(Some(remaining));
        }

        if !self.options().can_random_tiebreak {
            warn!(round, tied = remaining.len(), "unresolved tie, halting");
            return Ok(None);
        }

        let loser = self
            .permutation
            .first_eliminable(&remaining)
            .cloned()
            .ok_or(ElectionError::NoTiebreakCandidate { round })?;
        info!(round, candidate = loser.uid(), "tie broken by permutation");

        record.tiebreak = Some(TiebreakStage::Permutation);
        record.random_tiebreak_occurred = true;
        Ok(Some(BTreeSet::from([loser])))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(uid: &str) -> Candidate {
        Candidate::new(uid, None)
    }

    fn ballots(uids: &[&str], count: usize) -> Vec<Ballot> {
        let ranking: Vec<Candidate> = uids.iter().map(|uid| candidate(uid)).collect();
        vec![Ballot::new(ranking).unwrap(); count]
    }

    fn election(ballots: Vec<Ballot>, seats: usize) -> Election {
        Election::new(
            ballots,
            seats,
            TabulationOptions::default().with_tiebreak_permutation("abcdefghijklmnopqrstuvwxyz"),
        )
    }

    #[test]
    fn test_droop_quota() {
        assert_eq!(droop_quota(10.0, 1), 6.0);
        assert_eq!(droop_quota(15.0, 1), 8.5);
        assert_eq!(droop_quota(12.0, 2), 5.0);
    }

    #[test]
    fn test_resolve_conserves_votes() {
        let mut all = ballots(&["a", "b"], 4);
        all.extend(ballots(&["b"], 3));
        all.extend(ballots(&["c", "a"], 2));
        let election = election(all, 2);
        let mut count = Count::new(&election, TiebreakPermutation::new("abc"));

        count.eliminated.insert(candidate("c"));
        count.elected.insert(candidate("b"));
        count.active[0].scale_weight(0.5).unwrap();

        let tally = count.resolve_and_tally();
        let live_weight: f64 = count.active.iter().map(Ballot::weight).sum();
        assert!((tally.votes_cast() - live_weight).abs() < 1e-9);
        assert_eq!(tally.votes_for(&candidate("a")), 5.5);
        assert_eq!(count.active.len(), 6);
        assert_eq!(count.exhausted.len(), 3);
    }

    #[test]
    fn test_resolve_registers_later_preferences() {
        let election = election(ballots(&["a", "b"], 2), 1);
        let mut count = Count::new(&election, TiebreakPermutation::new("abc"));
        let tally = count.resolve_and_tally();
        assert!(tally.contains(&candidate("b")));
        assert_eq!(tally.votes_for(&candidate("b")), 0.0);
    }

    #[test]
    fn test_surplus_scales_winner_ballots_only() {
        let mut all = ballots(&["a", "b"], 6);
        all.extend(ballots(&["b"], 2));
        let election = election(all, 1);
        let mut count = Count::new(&election, TiebreakPermutation::new("abc"));
        count.transfer_surplus(&candidate("a"), 6.0, 4.0).unwrap();

        assert!((count.active[0].weight() - 1.0 / 3.0).abs() < 1e-12);
        assert_eq!(count.active[7].weight(), 1.0);
    }

    #[test]
    fn test_zero_seats_is_empty() {
        let results = election(ballots(&["a"], 3), 0).compute().unwrap();
        assert!(results.elected.is_empty());
        assert!(results.rounds.is_empty());
        assert_eq!(results.state, ElectionState::Completed);
    }

    #[test]
    fn test_no_ballots_completes_without_rounds() {
        let results = election(Vec::new(), 2).compute().unwrap();
        assert!(results.elected.is_empty());
        assert!(results.rounds.is_empty());
        assert!(!results.is_complete());
    }

    #[test]
    fn test_input_ballots_untouched() {
        let election = election(ballots(&["a", "b"], 5), 1);
        election.compute().unwrap();
        assert!(election
            .ballots()
            .iter()
            .all(|b| b.weight() == 1.0 && b.active_preference() == Some(&candidate("a"))));
    }

    #[test]
    fn test_from_rankings_rejects_duplicates() {
        let rankings = vec![
            vec![candidate("a"), candidate("b")],
            vec![candidate("a"), candidate("a")],
            vec![candidate("b")],
        ];
        let election = Election::from_rankings(rankings, 1, TabulationOptions::default());
        assert_eq!(election.ballots().len(), 2);
        assert_eq!(election.rejected_ballots().len(), 1);
        assert_eq!(election.rejected_ballots()[0].index, 1);

        let results = election.compute().unwrap();
        assert_eq!(results.rejected_ballots.len(), 1);
        assert_eq!(results.ballot_count, 2);
    }
}
