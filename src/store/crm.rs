use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Position of a candidate in the hiring pipeline
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CandidateStatus {
    #[default]
    New,
    Contacted,
    Interview,
    Offer,
    Hired,
    Rejected,
}

impl CandidateStatus {
    pub const ALL: [CandidateStatus; 6] = [
        CandidateStatus::New,
        CandidateStatus::Contacted,
        CandidateStatus::Interview,
        CandidateStatus::Offer,
        CandidateStatus::Hired,
        CandidateStatus::Rejected,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            CandidateStatus::New => "new",
            CandidateStatus::Contacted => "contacted",
            CandidateStatus::Interview => "interview",
            CandidateStatus::Offer => "offer",
            CandidateStatus::Hired => "hired",
            CandidateStatus::Rejected => "rejected",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, CandidateStatus::Hired | CandidateStatus::Rejected)
    }

    /// Order along the pipeline. Rejected sits outside it.
    fn stage(self) -> Option<u8> {
        match self {
            CandidateStatus::New => Some(0),
            CandidateStatus::Contacted => Some(1),
            CandidateStatus::Interview => Some(2),
            CandidateStatus::Offer => Some(3),
            CandidateStatus::Hired => Some(4),
            CandidateStatus::Rejected => None,
        }
    }

    /// Check whether moving from `self` to `to` is allowed.
    /// Forward moves (skipping is fine) and rejection from any open status.
    pub fn check_transition(self, to: CandidateStatus) -> Result<(), TransitionError> {
        if self == to {
            return Err(TransitionError::Unchanged(self));
        }
        if self.is_terminal() {
            return Err(TransitionError::Terminal(self));
        }
        match (self.stage(), to.stage()) {
            (_, None) => Ok(()),
            (Some(from), Some(next)) if next > from => Ok(()),
            _ => Err(TransitionError::Backwards { from: self, to }),
        }
    }
}

impl fmt::Display for CandidateStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CandidateStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == wanted)
            .ok_or_else(|| {
                format!(
                    "unknown status '{}' (expected one of: new, contacted, interview, offer, hired, rejected)",
                    s
                )
            })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionError {
    Unchanged(CandidateStatus),
    Terminal(CandidateStatus),
    Backwards {
        from: CandidateStatus,
        to: CandidateStatus,
    },
}

impl fmt::Display for TransitionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransitionError::Unchanged(status) => {
                write!(f, "Candidate is already '{}'", status)
            }
            TransitionError::Terminal(status) => {
                write!(f, "Candidate is '{}', which is final", status)
            }
            TransitionError::Backwards { from, to } => {
                write!(f, "Cannot move candidate back from '{}' to '{}'", from, to)
            }
        }
    }
}

impl std::error::Error for TransitionError {}

/// Delivery state of an invitation sent through hh.ru
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InvitationStatus {
    Sent,
    Delivered,
    Viewed,
    Responded,
    Rejected,
    Error,
}

impl InvitationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            InvitationStatus::Sent => "sent",
            InvitationStatus::Delivered => "delivered",
            InvitationStatus::Viewed => "viewed",
            InvitationStatus::Responded => "responded",
            InvitationStatus::Rejected => "rejected",
            InvitationStatus::Error => "error",
        }
    }

    /// Derive an invitation status from an hh.ru negotiation thread.
    /// Unknown states leave the invitation unchanged.
    pub fn from_negotiation(state: &str, has_updates: bool, messages: u32) -> Option<Self> {
        match state {
            "discard" | "discard_by_applicant" | "discard_by_employer" => {
                Some(InvitationStatus::Rejected)
            }
            "interview" | "hired" | "offer" => Some(InvitationStatus::Responded),
            "invitation" if messages > 1 => Some(InvitationStatus::Responded),
            "invitation" if has_updates => Some(InvitationStatus::Viewed),
            "invitation" => Some(InvitationStatus::Delivered),
            _ => None,
        }
    }
}

impl fmt::Display for InvitationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use CandidateStatus::*;

    #[test]
    fn test_forward_transitions() {
        assert!(New.check_transition(Contacted).is_ok());
        assert!(Contacted.check_transition(Interview).is_ok());
        assert!(Interview.check_transition(Offer).is_ok());
        assert!(Offer.check_transition(Hired).is_ok());
        // Skipping stages is allowed
        assert!(New.check_transition(Interview).is_ok());
    }

    #[test]
    fn test_reject_from_any_open_status() {
        for status in [New, Contacted, Interview, Offer] {
            assert!(status.check_transition(Rejected).is_ok());
        }
    }

    #[test]
    fn test_backwards_rejected() {
        assert_eq!(
            Interview.check_transition(Contacted),
            Err(TransitionError::Backwards {
                from: Interview,
                to: Contacted
            })
        );
    }

    #[test]
    fn test_terminal_statuses() {
        assert_eq!(
            Hired.check_transition(Rejected),
            Err(TransitionError::Terminal(Hired))
        );
        assert_eq!(
            Rejected.check_transition(New),
            Err(TransitionError::Terminal(Rejected))
        );
    }

    #[test]
    fn test_same_status() {
        assert_eq!(New.check_transition(New), Err(TransitionError::Unchanged(New)));
    }

    #[test]
    fn test_parse_status() {
        assert_eq!("Interview".parse::<CandidateStatus>(), Ok(Interview));
        assert!("maybe".parse::<CandidateStatus>().is_err());
    }

    #[test]
    fn test_serde_lowercase() {
        assert_eq!(serde_json::to_string(&Offer).unwrap(), "\"offer\"");
        assert_eq!(
            serde_json::to_string(&InvitationStatus::Responded).unwrap(),
            "\"responded\""
        );
    }

    #[test]
    fn test_invitation_from_negotiation() {
        assert_eq!(
            InvitationStatus::from_negotiation("invitation", false, 1),
            Some(InvitationStatus::Delivered)
        );
        assert_eq!(
            InvitationStatus::from_negotiation("invitation", true, 1),
            Some(InvitationStatus::Viewed)
        );
        assert_eq!(
            InvitationStatus::from_negotiation("invitation", false, 3),
            Some(InvitationStatus::Responded)
        );
        assert_eq!(
            InvitationStatus::from_negotiation("discard_by_applicant", false, 1),
            Some(InvitationStatus::Rejected)
        );
        assert_eq!(InvitationStatus::from_negotiation("response", false, 0), None);
    }
}
