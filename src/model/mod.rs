pub mod ballot;
pub mod candidate;

pub use ballot::Ballot;
pub use candidate::{Candidate, CandidateType, NO_CONFIDENCE_UID};
