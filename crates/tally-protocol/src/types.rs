use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Raw scores of one ballot item, keyed by category id.
///
/// Values are kept exactly as submitted; numeric interpretation happens
/// at aggregation time through [`score_value`].
pub type Scores = serde_json::Map<String, serde_json::Value>;

/// A rubric column defined by the host when the session is created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
}

impl Category {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Policy governing how submitted ballot items are labeled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VotingMode {
    /// A single score for the whole group.
    #[default]
    Group,
    /// A group score plus one score per participant.
    Mixed,
    /// One score per participant only.
    Participants,
}

impl fmt::Display for VotingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Group => "group",
            Self::Mixed => "mixed",
            Self::Participants => "participants",
        };
        write!(f, "{s}")
    }
}

/// How a device identifier was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum IdType {
    Localhost,
    Mac,
    Ip,
}

impl fmt::Display for IdType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Localhost => "LOCALHOST",
            Self::Mac => "MAC",
            Self::Ip => "IP",
        };
        write!(f, "{s}")
    }
}

/// Best-effort stable identity of a connecting peer.
///
/// This is not authentication: spoofed addresses, routed peers and
/// randomized hardware addresses all defeat it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeviceIdentity {
    pub device_id: String,
    pub id_type: IdType,
}

impl DeviceIdentity {
    pub fn new(device_id: impl Into<String>, id_type: IdType) -> Self {
        Self {
            device_id: device_id.into(),
            id_type,
        }
    }
}

impl fmt::Display for DeviceIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.id_type, self.device_id)
    }
}

/// Identifier of one live transport channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChannelId(Uuid);

impl ChannelId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ChannelId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One normalized vote record in the session log.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vote {
    /// Subject open at submission time; the duplicate-vote key.
    pub main_subject: String,
    /// Derived display label; the export grouping key.
    pub subject: String,
    pub scores: Scores,
    pub voter_channel_id: ChannelId,
    pub voter_address: String,
    pub device_id: String,
    pub submitted_at: chrono::DateTime<chrono::Utc>,
}

/// An address advertised to the host for joining the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayAddress {
    pub name: String,
    pub address: String,
    pub url: String,
}

impl DisplayAddress {
    pub fn new(name: impl Into<String>, address: impl Into<String>, port: u16) -> Self {
        let address = address.into();
        Self {
            name: name.into(),
            url: format!("http://{address}:{port}"),
            address,
        }
    }
}

/// Full session state as pushed to every client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub session_id: Option<String>,
    pub name: String,
    pub categories: Vec<Category>,
    pub current_subject: String,
    pub current_participants: Vec<String>,
    pub voting_mode: VotingMode,
    pub is_voting_open: bool,
    pub votes: Vec<Vote>,
    pub available_ips: Vec<DisplayAddress>,
    pub selected_ip_index: usize,
}

/// Numeric reading of a raw score value.
///
/// Numbers are taken as-is, strings are parsed after trimming, and
/// anything else (missing, non-numeric, non-finite) counts as `0`.
pub fn score_value(value: Option<&serde_json::Value>) -> f64 {
    let parsed = match value {
        Some(serde_json::Value::Number(n)) => n.as_f64(),
        Some(serde_json::Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|v| v.is_finite()).unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_score_value_numbers_and_strings() {
        assert_eq!(score_value(Some(&json!(4))), 4.0);
        assert_eq!(score_value(Some(&json!(2.5))), 2.5);
        assert_eq!(score_value(Some(&json!(" 7 "))), 7.0);
    }

    #[test]
    fn test_score_value_garbage_is_zero() {
        assert_eq!(score_value(None), 0.0);
        assert_eq!(score_value(Some(&json!(null))), 0.0);
        assert_eq!(score_value(Some(&json!("excellent"))), 0.0);
        assert_eq!(score_value(Some(&json!([1, 2]))), 0.0);
        assert_eq!(score_value(Some(&json!("NaN"))), 0.0);
    }

    #[test]
    fn test_display_address_url() {
        let addr = DisplayAddress::new("eth0", "192.168.1.20", 3000);
        assert_eq!(addr.url, "http://192.168.1.20:3000");
    }

    #[test]
    fn test_id_type_wire_names() {
        assert_eq!(serde_json::to_value(IdType::Mac).unwrap(), json!("MAC"));
        assert_eq!(serde_json::to_value(IdType::Localhost).unwrap(), json!("LOCALHOST"));
    }
}
