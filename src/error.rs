use thiserror::Error;

/// Problems with a single ballot. These are recoverable: the offending
/// operation is skipped and the count goes on without it.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BallotError {
    #[error("Candidate ranked more than once: {uid}")]
    DuplicateCandidate { uid: String },
    #[error("Ballot has no active candidates")]
    NoActivePreference,
    #[error("Invalid ballot weight: {0}")]
    InvalidWeight(f64),
    #[error("Invalid weight multiplier: {0}")]
    InvalidMultiplier(f64),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum TallyError {
    #[error("Cannot cast vote of {weight} for {uid}")]
    InvalidVote { uid: String, weight: f64 },
}

/// Broken invariants inside the count. Any of these aborts the tabulation.
#[derive(Debug, Error)]
pub enum ElectionError {
    #[error("No candidates eligible for elimination in round {round}")]
    NoEligibleCandidates { round: usize },
    #[error("Tie in round {round} contains no candidate that may be eliminated")]
    NoTiebreakCandidate { round: usize },
    #[error("Ballot error: {0}")]
    Ballot(#[from] BallotError),
}

pub type Result<T> = std::result::Result<T, ElectionError>;
