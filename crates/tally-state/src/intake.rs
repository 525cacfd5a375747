//! Ballot intake and the one-ballot-per-subject rule.
//!
//! The duplicate check is keyed on the *main* subject, so a device cannot
//! vote twice by spreading ballots over several participant labels of the
//! same subject. Check and append happen inside one `&mut Session` call and
//! cannot interleave with another submission.

use tally_protocol::{BallotItem, BallotItemKind, ChannelId, Vote, VoteSubmission, VotingMode};

use crate::error::IntakeError;
use crate::session::Session;

/// Who a submission came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Origin {
    pub device_id: String,
    pub channel_id: ChannelId,
    pub address: String,
}

impl Origin {
    pub fn new(device_id: impl Into<String>, channel_id: ChannelId, address: impl Into<String>) -> Self {
        Self {
            device_id: device_id.into(),
            channel_id,
            address: address.into(),
        }
    }
}

/// Display label a ballot item is grouped under in exports.
pub fn display_subject(mode: VotingMode, current_subject: &str, item: &BallotItem) -> String {
    match item.kind {
        BallotItemKind::Group if mode == VotingMode::Mixed => format!("{current_subject} (Group)"),
        BallotItemKind::Group => current_subject.to_string(),
        BallotItemKind::Participant => {
            format!("{current_subject} - {}", item.name.as_deref().unwrap_or_default())
        }
    }
}

impl Session {
    /// Whether `device_id` already has a ballot for `main_subject`.
    pub fn has_voted(&self, device_id: &str, main_subject: &str) -> bool {
        self.votes
            .iter()
            .any(|v| v.main_subject == main_subject && v.device_id == device_id)
    }

    /// Validate a submission and append one vote per item.
    ///
    /// Returns the number of votes appended. Scores are stored untouched;
    /// unusable values only count as `0` once aggregated.
    pub fn submit_vote(
        &mut self,
        origin: &Origin,
        submission: VoteSubmission,
    ) -> Result<usize, IntakeError> {
        if !self.is_voting_open {
            return Err(IntakeError::VotingClosed);
        }

        if self.has_voted(&origin.device_id, &self.current_subject) {
            return Err(IntakeError::AlreadyVoted {
                device_id: origin.device_id.clone(),
                subject: self.current_subject.clone(),
            });
        }

        let submitted_at = chrono::Utc::now();
        let accepted = submission.items.len();
        for item in submission.items {
            let subject = display_subject(self.voting_mode, &self.current_subject, &item);
            self.votes.push(Vote {
                main_subject: self.current_subject.clone(),
                subject,
                scores: item.scores,
                voter_channel_id: origin.channel_id,
                voter_address: origin.address.clone(),
                device_id: origin.device_id.clone(),
                submitted_at,
            });
        }

        tracing::debug!(
            device_id = %origin.device_id,
            subject = %self.current_subject,
            items = accepted,
            total_votes = self.votes.len(),
            "Ballot accepted"
        );
        Ok(accepted)
    }
}
