//! Single Transferable Vote tabulation with a Droop quota.
//!
//! Ballots are ranked lists of [`Candidate`]s. An [`Election`] counts them
//! round by round: candidates at or above quota are elected and their
//! surplus moves on at a reduced value, otherwise the candidate with the
//! fewest votes is eliminated, with ties settled by earlier rounds, later
//! preferences, and finally a character permutation of candidate uids.
//!
//! The optional No Confidence candidate ([`Candidate::no_confidence`]) ends
//! the count when elected and keeps weaker candidates out of remaining
//! seats.
//!
//! ```
//! use stv_tabulator::{Ballot, Candidate, Election, TabulationOptions};
//!
//! let a = Candidate::new("a", None);
//! let b = Candidate::new("b", None);
//! let mut ballots = vec![Ballot::new(vec![a.clone(), b.clone()]).unwrap(); 5];
//! ballots.extend(vec![Ballot::new(vec![b.clone(), a.clone()]).unwrap(); 10]);
//!
//! let results = Election::new(ballots, 1, TabulationOptions::default())
//!     .compute()
//!     .unwrap();
//! assert!(results.elected.contains(&b));
//! ```

pub mod error;
pub mod model;
pub mod reports;
pub mod tabulator;

pub use error::{BallotError, ElectionError, Result, TallyError};
pub use model::{Ballot, Candidate, CandidateType};
pub use reports::{ElectionState, HaltReason, ResultSummary, RoundResult, TabulationResults};
pub use tabulator::options::TabulationOptions;
pub use tabulator::tally::VoteTally;
pub use tabulator::tiebreak::{TiebreakPermutation, TiebreakStage};
pub use tabulator::{droop_quota, tabulate_stv, Election};
