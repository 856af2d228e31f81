use crate::error::BallotError;
use crate::model::candidate::Candidate;
use std::collections::HashSet;
use std::fmt;

/// A ranking of candidates carrying a (possibly fractional) vote.
///
/// The cursor points at the most preferred candidate still in the running.
/// Only the tabulator moves it; a fresh ballot starts at the first rank.
#[derive(Debug, Clone, PartialEq)]
pub struct Ballot {
    ranking: Vec<Candidate>,
    weight: f64,
    cursor: usize,
}

impl Ballot {
    /// Builds a full-value ballot. Rankings that list a candidate twice are
    /// rejected.
    pub fn new(ranking: Vec<Candidate>) -> Result<Ballot, BallotError> {
        let mut seen = HashSet::new();
        for candidate in &ranking {
            if !seen.insert(candidate.uid()) {
                return Err(BallotError::DuplicateCandidate {
                    uid: candidate.uid().to_string(),
                });
            }
        }

        Ok(Ballot {
            ranking,
            weight: 1.0,
            cursor: 0,
        })
    }

    pub fn with_weight(mut self, weight: f64) -> Result<Ballot, BallotError> {
        if !weight.is_finite() || weight < 0.0 {
            return Err(BallotError::InvalidWeight(weight));
        }
        self.weight = weight;
        Ok(self)
    }

    pub fn ranking(&self) -> &[Candidate] {
        &self.ranking
    }

    pub fn weight(&self) -> f64 {
        self.weight
    }

    pub fn active_preference(&self) -> Option<&Candidate> {
        self.ranking.get(self.cursor)
    }

    /// Moves past the current preference.
    pub fn advance(&mut self) -> Result<(), BallotError> {
        if self.active_preference().is_none() {
            return Err(BallotError::NoActivePreference);
        }
        self.cursor += 1;
        Ok(())
    }

    /// Advances until the active preference satisfies `is_live`, or the
    /// ranking runs out.
    pub fn skip_while_dead<F>(&mut self, is_live: F)
    where
        F: Fn(&Candidate) -> bool,
    {
        while let Some(candidate) = self.ranking.get(self.cursor) {
            if is_live(candidate) {
                break;
            }
            self.cursor += 1;
        }
    }

    pub fn scale_weight(&mut self, multiplier: f64) -> Result<(), BallotError> {
        if !multiplier.is_finite() || multiplier < 0.0 {
            return Err(BallotError::InvalidMultiplier(multiplier));
        }
        self.weight *= multiplier;
        Ok(())
    }

    pub fn is_exhausted(&self) -> bool {
        self.active_preference().is_none() || self.weight <= 0.0
    }
}

impl fmt::Display for Ballot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Ballot worth {:.3}:", self.weight)?;
        for (rank, candidate) in self.ranking.iter().enumerate() {
            let marker = if rank < self.cursor {
                'X'
            } else if rank == self.cursor {
                '>'
            } else {
                ' '
            };
            write!(f, "\n{} {}", marker, candidate)?;
        }
        Ok(())
    }
}
