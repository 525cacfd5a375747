//! The session state machine.
//!
//! States are implicit in the field values. The only legal mutations are:
//! - `create_session`: new id, new rubric, empty vote log
//! - `update_status`: merge of the status fields present in the update
//! - `select_display_address`: bounds-checked display choice
//! - `set_display_addresses`: refresh of the advertised address list
//! - `submit_vote` (see [`crate::intake`]): append-only ballot intake
//!
//! `create_session` leaves the subject, the voting gate, the
//! participants and the mode as they were.

use rand::distributions::Alphanumeric;
use rand::Rng;

use tally_protocol::{
    Category, DisplayAddress, SessionSnapshot, StatusUpdate, Vote, VotingMode,
    DEFAULT_SESSION_NAME,
};

const SESSION_ID_LEN: usize = 12;

#[derive(Debug, Clone)]
pub struct Session {
    pub(crate) session_id: Option<String>,
    pub(crate) name: String,
    pub(crate) categories: Vec<Category>,
    pub(crate) current_subject: String,
    pub(crate) current_participants: Vec<String>,
    pub(crate) voting_mode: VotingMode,
    pub(crate) is_voting_open: bool,
    pub(crate) votes: Vec<Vote>,
    pub(crate) available_ips: Vec<DisplayAddress>,
    pub(crate) selected_ip_index: usize,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(DEFAULT_SESSION_NAME)
    }
}

impl Session {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            session_id: None,
            name: name.into(),
            categories: Vec::new(),
            current_subject: String::new(),
            current_participants: Vec::new(),
            voting_mode: VotingMode::default(),
            is_voting_open: false,
            votes: Vec::new(),
            available_ips: Vec::new(),
            selected_ip_index: 0,
        }
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn current_subject(&self) -> &str {
        &self.current_subject
    }

    pub fn current_participants(&self) -> &[String] {
        &self.current_participants
    }

    pub fn voting_mode(&self) -> VotingMode {
        self.voting_mode
    }

    pub fn is_voting_open(&self) -> bool {
        self.is_voting_open
    }

    pub fn votes(&self) -> &[Vote] {
        &self.votes
    }

    pub fn available_ips(&self) -> &[DisplayAddress] {
        &self.available_ips
    }

    pub fn selected_ip_index(&self) -> usize {
        self.selected_ip_index
    }

    /// Start a fresh session: new id, new rubric, empty vote log.
    ///
    /// Returns the new session id.
    pub fn create_session(&mut self, name: impl Into<String>, categories: Vec<Category>) -> &str {
        let mut id = generate_session_id();
        while self.session_id.as_deref() == Some(id.as_str()) {
            id = generate_session_id();
        }

        self.name = name.into();
        self.categories = categories;
        self.votes.clear();

        tracing::info!(
            session_id = %id,
            name = %self.name,
            categories = self.categories.len(),
            "Session created"
        );
        self.session_id.insert(id).as_str()
    }

    /// Merge the fields present in `update`; an explicit `null` resets a
    /// field to its default.
    pub fn update_status(&mut self, update: StatusUpdate) {
        if let Some(subject) = update.current_subject {
            self.current_subject = subject.unwrap_or_default();
        }
        if let Some(open) = update.is_voting_open {
            self.is_voting_open = open.unwrap_or_default();
        }
        if let Some(participants) = update.current_participants {
            self.current_participants = participants.unwrap_or_default();
        }
        if let Some(mode) = update.voting_mode {
            self.voting_mode = mode.unwrap_or_default();
        }

        tracing::debug!(
            subject = %self.current_subject,
            open = self.is_voting_open,
            mode = %self.voting_mode,
            participants = self.current_participants.len(),
            "Session status updated"
        );
    }

    /// Record the host's display choice. Out-of-range indices are ignored.
    ///
    /// Returns whether the index was applied.
    pub fn select_display_address(&mut self, index: i64) -> bool {
        match usize::try_from(index) {
            Ok(i) if i < self.available_ips.len() => {
                self.selected_ip_index = i;
                true
            }
            _ => false,
        }
    }

    /// Replace the advertised address list.
    ///
    /// A selection that no longer fits the new list falls back to `0`.
    pub fn set_display_addresses(&mut self, addresses: Vec<DisplayAddress>) {
        self.available_ips = addresses;
        if self.selected_ip_index >= self.available_ips.len() {
            self.selected_ip_index = 0;
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            session_id: self.session_id.clone(),
            name: self.name.clone(),
            categories: self.categories.clone(),
            current_subject: self.current_subject.clone(),
            current_participants: self.current_participants.clone(),
            voting_mode: self.voting_mode,
            is_voting_open: self.is_voting_open,
            votes: self.votes.clone(),
            available_ips: self.available_ips.clone(),
            selected_ip_index: self.selected_ip_index,
        }
    }
}

fn generate_session_id() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(SESSION_ID_LEN)
        .map(|b| char::from(b).to_ascii_lowercase())
        .collect()
}
