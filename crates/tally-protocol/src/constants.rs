/// Device identifier assigned to every loopback peer.
pub const LOCALHOST_DEVICE_ID: &str = "LOCALHOST";

/// Session title used until the host creates a session.
pub const DEFAULT_SESSION_NAME: &str = "Classroom Session";

/// Default HTTP port for the session server.
pub const DEFAULT_PORT: u16 = 3000;

/// Prefix a dual-stack listener puts in front of IPv4 peer addresses.
pub const IPV4_MAPPED_PREFIX: &str = "::ffff:";

pub const VOTING_CLOSED_MESSAGE: &str = "Voting is currently closed.";
pub const ALREADY_VOTED_MESSAGE: &str = "You have already voted for this subject!";
pub const SUPERSEDED_MESSAGE: &str = "New connection from this device detected.";
pub const MALFORMED_FRAME_MESSAGE: &str = "Unrecognized message.";

/// Label used in exports for the whole-group row of a subject.
pub const GROUP_SCORE_LABEL: &str = "Group Score";
/// Label used in exports for group-type ballots of a subject.
pub const GROUP_EVALUATION_LABEL: &str = "Group Evaluation";
