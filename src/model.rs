use std::fmt;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LetterId(String);

impl LetterId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LetterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for LetterId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for LetterId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Identifier of a single message, unique within its conversation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(String);

impl MessageId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The head message of a thread shares its id with the letter.
    pub fn is_head_of(&self, letter: &LetterId) -> bool {
        self.0 == letter.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MessageId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for MessageId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&LetterId> for MessageId {
    fn from(value: &LetterId) -> Self {
        Self(value.0.clone())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sender {
    Party {
        name: String,
        avatar: Option<String>,
    },
    /// The local user. Never carries an avatar.
    You,
}

impl Sender {
    pub fn party(name: impl Into<String>) -> Self {
        Sender::Party {
            name: name.into(),
            avatar: None,
        }
    }

    pub fn display_name(&self) -> &str {
        match self {
            Sender::Party { name, .. } => name,
            Sender::You => "You",
        }
    }

    pub fn avatar(&self) -> Option<&str> {
        match self {
            Sender::Party { avatar, .. } => avatar.as_deref(),
            Sender::You => None,
        }
    }

    pub fn is_you(&self) -> bool {
        matches!(self, Sender::You)
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct MessageFlags: u8 {
        const UNREAD = 1;
        const ATTACHMENTS = 1 << 1;
    }
}

impl MessageFlags {
    pub fn from_parts(unread: bool, attachments: bool) -> Self {
        let mut flags = MessageFlags::empty();
        flags.set(MessageFlags::UNREAD, unread);
        flags.set(MessageFlags::ATTACHMENTS, attachments);
        flags
    }
}

/// An excerpt of an earlier message that a message replies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuoteRef {
    pub message_id: MessageId,
    pub excerpt: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub id: MessageId,
    pub sender: Sender,
    pub content: String,
    /// Precomputed upstream; collapsed views show it verbatim or not at all.
    pub preview: Option<String>,
    pub date: String,
    pub flags: MessageFlags,
    pub quote: Option<QuoteRef>,
}

impl Message {
    pub fn new(
        id: impl Into<MessageId>,
        sender: Sender,
        content: impl Into<String>,
        date: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            sender,
            content: content.into(),
            preview: None,
            date: date.into(),
            flags: MessageFlags::empty(),
            quote: None,
        }
    }

    pub fn with_preview(mut self, preview: impl Into<String>) -> Self {
        self.preview = Some(preview.into());
        self
    }

    pub fn quoting(mut self, message_id: impl Into<MessageId>, excerpt: impl Into<String>) -> Self {
        self.quote = Some(QuoteRef {
            message_id: message_id.into(),
            excerpt: excerpt.into(),
        });
        self
    }

    pub fn is_unread(&self) -> bool {
        self.flags.contains(MessageFlags::UNREAD)
    }

    pub fn has_attachments(&self) -> bool {
        self.flags.contains(MessageFlags::ATTACHMENTS)
    }
}

/// Inbox entry anchoring a detail page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Letter {
    pub id: LetterId,
    pub sender: Sender,
    pub content: String,
    pub preview: String,
    pub timestamp: String,
    pub date: String,
    pub flags: MessageFlags,
}

impl Letter {
    pub fn is_unread(&self) -> bool {
        self.flags.contains(MessageFlags::UNREAD)
    }

    pub fn has_attachments(&self) -> bool {
        self.flags.contains(MessageFlags::ATTACHMENTS)
    }
}
