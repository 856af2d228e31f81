use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Reserved uid of the No Confidence option.
pub const NO_CONFIDENCE_UID: &str = "NC";
const NO_CONFIDENCE_NAME: &str = "No Confidence";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CandidateType {
    Regular,
    /// Rejection of every candidate. Never receives surplus transfers and
    /// halts the count when elected.
    NoConfidence,
}

/// A choice that can appear on a ballot.
///
/// Equality, hashing and ordering only look at `uid`. The ordering is used to
/// keep candidate sets stable in reports; tie-breaks use
/// [`TiebreakPermutation`](crate::tabulator::tiebreak::TiebreakPermutation)
/// instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "CandidateRepr")]
pub struct Candidate {
    uid: String,
    name: Option<String>,
    candidate_type: CandidateType,
}

impl Candidate {
    /// Creates a candidate. The uid `"NC"` is reserved, so asking for it
    /// yields the No Confidence option.
    pub fn new(uid: impl Into<String>, name: Option<String>) -> Candidate {
        let uid = uid.into();
        if uid == NO_CONFIDENCE_UID {
            return Candidate::no_confidence();
        }
        Candidate {
            uid,
            name,
            candidate_type: CandidateType::Regular,
        }
    }

    pub fn no_confidence() -> Candidate {
        Candidate {
            uid: NO_CONFIDENCE_UID.to_string(),
            name: Some(NO_CONFIDENCE_NAME.to_string()),
            candidate_type: CandidateType::NoConfidence,
        }
    }

    pub fn uid(&self) -> &str {
        &self.uid
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn candidate_type(&self) -> CandidateType {
        self.candidate_type
    }

    pub fn is_no_confidence(&self) -> bool {
        self.candidate_type == CandidateType::NoConfidence
    }
}

/// Wire form of a candidate. The type is derived from the uid on the way in,
/// so a stored `candidate_type` can never disagree with it.
#[derive(Deserialize)]
struct CandidateRepr {
    uid: String,
    #[serde(default)]
    name: Option<String>,
}

impl From<CandidateRepr> for Candidate {
    fn from(repr: CandidateRepr) -> Candidate {
        Candidate::new(repr.uid, repr.name)
    }
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.uid == other.uid
    }
}

impl Eq for Candidate {}

impl Hash for Candidate {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.uid.hash(state);
    }
}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.uid.cmp(&other.uid)
    }
}

impl fmt::Display for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{} ({})", self.uid, name),
            None => write!(f, "{}", self.uid),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_equality_ignores_name() {
        let a = Candidate::new("gwashington", Some("George Washington".to_string()));
        let b = Candidate::new("gwashington", None);
        assert_eq!(a, b);

        let set: HashSet<Candidate> = vec![a, b].into_iter().collect();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_reserved_uid_is_no_confidence() {
        let nc = Candidate::new(NO_CONFIDENCE_UID, Some("Nobody".to_string()));
        assert!(nc.is_no_confidence());
        assert_eq!(nc, Candidate::no_confidence());
        assert_eq!(nc.name(), Some("No Confidence"));
        assert!(!Candidate::new("jadams", None).is_no_confidence());
    }

    #[test]
    fn test_display() {
        let a = Candidate::new("jadams", Some("John Adams".to_string()));
        assert_eq!(a.to_string(), "jadams (John Adams)");
        assert_eq!(Candidate::new("jadams", None).to_string(), "jadams");
    }

    #[test]
    fn test_deserialized_type_follows_uid() {
        let nc: Candidate =
            serde_json::from_str(r#"{"uid":"NC","name":null,"candidate_type":"Regular"}"#)
                .unwrap();
        assert!(nc.is_no_confidence());
        assert_eq!(nc.candidate_type(), CandidateType::NoConfidence);

        let x: Candidate =
            serde_json::from_str(r#"{"uid":"x","name":"X","candidate_type":"NoConfidence"}"#)
                .unwrap();
        assert!(!x.is_no_confidence());
        assert_eq!(x.name(), Some("X"));

        let bare: Candidate = serde_json::from_str(r#"{"uid":"jadams"}"#).unwrap();
        assert_eq!(bare, Candidate::new("jadams", None));
    }

    #[test]
    fn test_serialized_candidate_reads_back() {
        let nc = Candidate::no_confidence();
        let json = serde_json::to_string(&nc).unwrap();
        let back: Candidate = serde_json::from_str(&json).unwrap();
        assert!(back.is_no_confidence());
    }
}
