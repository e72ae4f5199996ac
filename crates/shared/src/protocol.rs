use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{Amount, FileId, GroupId, PageSessionId, PostId, UserId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteUser {
    pub id: UserId,
    pub nick: String,
    #[serde(default)]
    pub ignored: bool,
}

impl RemoteUser {
    pub fn new(id: UserId, nick: impl Into<String>) -> Self {
        Self {
            id,
            nick: nick.into(),
            ignored: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrivateMessage {
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupMessage {
    pub group_id: GroupId,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum InboundPayload {
    Private(PrivateMessage),
    Group(GroupMessage),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupList {
    pub id: GroupId,
    pub name: String,
    pub version: u8,
    pub members: Vec<UserId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupInvite {
    pub id: GroupId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostSummary {
    pub id: PostId,
    pub from: UserId,
    pub author_nick: String,
    pub title: String,
    pub date: DateTime<Utc>,
    pub last_status_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostStatus {
    pub from: UserId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostListEntry {
    pub id: PostId,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteFile {
    pub id: FileId,
    pub filename: String,
    pub description: String,
    pub size: u64,
    pub cost: Amount,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMetadata {
    pub id: FileId,
    pub filename: String,
    pub chunk_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceStatus {
    Ok,
    BadRequest,
    NotFound,
    InternalError,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchedResource {
    pub session_id: PageSessionId,
    pub uid: UserId,
    pub path: Vec<String>,
    pub status: ResourceStatus,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OnboardState {
    pub stage: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub from: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryPage {
    pub entries: Vec<HistoryEntry>,
    pub as_of: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendProgress {
    pub sent: usize,
    pub total: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletBalance {
    pub total: Amount,
    pub confirmed: Amount,
    pub unconfirmed: Amount,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelBalance {
    pub max_inbound: Amount,
    pub max_outbound: Amount,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChannelEvent {
    Opened {
        channel_point: String,
        local_balance: Amount,
        remote_balance: Amount,
    },
    Closed {
        channel_point: String,
        settled_balance: Amount,
        time_locked_balance: Amount,
    },
    Active {
        channel_point: String,
    },
    Inactive {
        channel_point: String,
    },
    PendingOpen {
        channel_point: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_events_are_tagged_by_kind() {
        let event = ChannelEvent::PendingOpen {
            channel_point: "abcd:1".to_string(),
        };
        let json = serde_json::to_value(&event).expect("serialize");
        assert_eq!(json["type"], "pending_open");
        assert_eq!(json["channel_point"], "abcd:1");

        let back: ChannelEvent = serde_json::from_value(json).expect("deserialize");
        assert_eq!(back, event);
    }

    #[test]
    fn remote_user_defaults_to_not_ignored() {
        let raw = format!(r#"{{"id":{:?},"nick":"alice"}}"#, [3u8; 32]);
        let user: RemoteUser = serde_json::from_str(&raw).expect("deserialize");
        assert_eq!(user, RemoteUser::new(UserId([3; 32]), "alice"));
    }

    #[test]
    fn send_progress_omits_missing_error() {
        let progress = SendProgress {
            sent: 1,
            total: 3,
            error: None,
        };
        let json = serde_json::to_string(&progress).expect("serialize");
        assert_eq!(json, r#"{"sent":1,"total":3}"#);
    }
}
