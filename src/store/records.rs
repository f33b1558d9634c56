use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::model::{Letter, LetterId, Message, MessageFlags, QuoteRef, Sender};

/// On-disk shape of a letters file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreFile {
    pub letters: Vec<LetterRecord>,
    pub conversations: IndexMap<LetterId, Vec<MessageRecord>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SenderRecord {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_you: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LetterRecord {
    pub id: LetterId,
    pub sender: SenderRecord,
    #[serde(default)]
    pub preview: String,
    pub content: String,
    #[serde(default)]
    pub timestamp: String,
    pub date: String,
    #[serde(default)]
    pub is_unread: bool,
    #[serde(default)]
    pub has_attachments: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuoteRecord {
    pub message_id: String,
    pub excerpt: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageRecord {
    pub id: String,
    pub sender: SenderRecord,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview: Option<String>,
    pub date: String,
    #[serde(default)]
    pub is_unread: bool,
    #[serde(default)]
    pub has_attachments: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quote: Option<QuoteRecord>,
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl From<SenderRecord> for Sender {
    fn from(record: SenderRecord) -> Self {
        if record.is_you {
            Sender::You
        } else {
            Sender::Party {
                name: record.name,
                avatar: record.avatar,
            }
        }
    }
}

impl From<LetterRecord> for Letter {
    fn from(record: LetterRecord) -> Self {
        Letter {
            id: record.id,
            sender: record.sender.into(),
            content: record.content,
            preview: record.preview,
            timestamp: record.timestamp,
            date: record.date,
            flags: MessageFlags::from_parts(record.is_unread, record.has_attachments),
        }
    }
}

impl From<MessageRecord> for Message {
    fn from(record: MessageRecord) -> Self {
        Message {
            id: record.id.into(),
            sender: record.sender.into(),
            content: record.content,
            preview: record.preview,
            date: record.date,
            flags: MessageFlags::from_parts(record.is_unread, record.has_attachments),
            quote: record.quote.map(|quote| QuoteRef {
                message_id: quote.message_id.into(),
                excerpt: quote.excerpt,
            }),
        }
    }
}
