use thiserror::Error;

use tally_protocol::{ALREADY_VOTED_MESSAGE, VOTING_CLOSED_MESSAGE};

/// Why a ballot was turned away. Neither case changes the session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IntakeError {
    #[error("voting is closed")]
    VotingClosed,

    #[error("device {device_id} already voted for {subject:?}")]
    AlreadyVoted { device_id: String, subject: String },
}

impl IntakeError {
    /// Message shown to the rejected participant.
    pub fn notice(&self) -> &'static str {
        match self {
            Self::VotingClosed => VOTING_CLOSED_MESSAGE,
            Self::AlreadyVoted { .. } => ALREADY_VOTED_MESSAGE,
        }
    }
}
