use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use indexmap::IndexMap;
use thiserror::Error;

use crate::config::StoreOptions;
use crate::model::{Letter, LetterId, Message, MessageFlags, Sender};

mod records;

pub use records::{LetterRecord, MessageRecord, QuoteRecord, SenderRecord, StoreFile};

/// Read-only source of letters and their threads.
pub trait LetterStore {
    fn get_letter(&self, id: &LetterId) -> Option<Letter>;

    /// Messages for the thread, oldest first. Empty when the thread is unknown.
    fn get_conversation(&self, id: &LetterId) -> Vec<Message>;

    fn letters(&self) -> Vec<Letter>;
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("reading letters file {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("parsing letters file {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("conversation {thread} contains message id {message} more than once")]
    DuplicateMessageId { thread: LetterId, message: String },
    #[error("message {message} in conversation {thread} quotes unknown message {quoted}")]
    UnknownQuote {
        thread: LetterId,
        message: String,
        quoted: String,
    },
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    letters: IndexMap<LetterId, Letter>,
    conversations: IndexMap<LetterId, Vec<Message>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_letter(&mut self, letter: Letter) {
        self.letters.insert(letter.id.clone(), letter);
    }

    pub fn insert_conversation(&mut self, id: LetterId, messages: Vec<Message>) {
        self.conversations.insert(id, messages);
    }

    pub fn from_file(path: &Path) -> Result<Self, StoreError> {
        let raw = fs::read_to_string(path).map_err(|source| StoreError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let file: StoreFile = serde_json::from_str(&raw).map_err(|source| StoreError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_records(file)
    }

    pub fn from_records(file: StoreFile) -> Result<Self, StoreError> {
        let mut store = Self::new();
        for record in file.letters {
            store.insert_letter(record.into());
        }
        for (thread, records) in file.conversations {
            validate_thread(&thread, &records)?;
            let messages = records.into_iter().map(Message::from).collect();
            store.insert_conversation(thread, messages);
        }
        Ok(store)
    }

    /// The built-in sample correspondence used when no letters file exists.
    pub fn sample() -> Self {
        let mut store = Self::new();
        seed_sample_letters(&mut store);
        store
    }
}

impl LetterStore for MemoryStore {
    fn get_letter(&self, id: &LetterId) -> Option<Letter> {
        self.letters.get(id).cloned()
    }

    fn get_conversation(&self, id: &LetterId) -> Vec<Message> {
        self.conversations.get(id).cloned().unwrap_or_default()
    }

    fn letters(&self) -> Vec<Letter> {
        self.letters.values().cloned().collect()
    }
}

fn validate_thread(thread: &LetterId, records: &[MessageRecord]) -> Result<(), StoreError> {
    let mut seen = HashSet::with_capacity(records.len());
    for record in records {
        if !seen.insert(record.id.as_str()) {
            return Err(StoreError::DuplicateMessageId {
                thread: thread.clone(),
                message: record.id.clone(),
            });
        }
    }
    for record in records {
        if let Some(quote) = &record.quote {
            if !seen.contains(quote.message_id.as_str()) {
                return Err(StoreError::UnknownQuote {
                    thread: thread.clone(),
                    message: record.id.clone(),
                    quoted: quote.message_id.clone(),
                });
            }
        }
    }
    Ok(())
}

pub fn init(options: &StoreOptions) -> Result<MemoryStore> {
    if options.path.exists() {
        let store = MemoryStore::from_file(&options.path)
            .with_context(|| format!("loading letters from {}", options.path.display()))?;
        tracing::info!(
            path = %options.path.display(),
            letters = store.letters.len(),
            "loaded letters file"
        );
        return Ok(store);
    }
    tracing::info!(
        path = %options.path.display(),
        "letters file not found, using sample correspondence"
    );
    Ok(MemoryStore::sample())
}

const EMILY_AVATAR: &str =
    "https://images.unsplash.com/photo-1494790108377-be9c29b29330?q=80&w=256&auto=format&fit=crop";

const KYOTO_LETTER: &str = "Dear Friend,

I wanted to tell you about my recent trip to Japan. The cherry blossoms were in full bloom and it reminded me of our conversation about traveling to see natural wonders.

The streets of Kyoto were lined with these magnificent trees, creating tunnels of soft pink petals that would occasionally float down in the gentle breeze. I spent hours sitting in parks, just watching the petals fall like snow.

I remembered how you once told me that you've always wanted to see the cherry blossoms in Japan. I think you would truly love it here. The attention to detail in everything from food presentation to garden design is remarkable.

I visited a traditional tea house where the ceremony was performed with such precision and grace. Each movement had meaning, each gesture a purpose. It made me think about how rarely we move with intention in our day-to-day lives.

Have you had any adventures lately? I'd love to hear about them in your next letter.

Warmly,
Emily";

fn seed_sample_letters(store: &mut MemoryStore) {
    let emily = || Sender::Party {
        name: "Emily Chen".into(),
        avatar: Some(EMILY_AVATAR.into()),
    };
    let letter_id = LetterId::from("1");

    store.insert_letter(Letter {
        id: letter_id.clone(),
        sender: emily(),
        content: KYOTO_LETTER.into(),
        preview: "I wanted to tell you about my recent trip to Japan. The cherry blossoms were in full bloom and it reminded me of our conversation about...".into(),
        timestamp: "2 hours ago".into(),
        date: "May 15, 2023".into(),
        flags: MessageFlags::UNREAD | MessageFlags::ATTACHMENTS,
    });

    let thread = vec![
        Message::new(
            "c1-1",
            Sender::You,
            "Dear Emily,

I hope this letter finds you well. I've been thinking about taking a trip abroad this year, and I'd love to hear your recommendations. I know you've traveled extensively through Asia, and I'm particularly interested in Japan.

What would you say are the must-see places? And is there a particular time of year that you'd recommend visiting?

Looking forward to your insights,
Me",
            "May 1, 2023",
        )
        .with_preview("I've been thinking about taking a trip abroad this year..."),
        Message::new(
            "c1-2",
            emily(),
            "Dear Friend,

I was so happy to receive your letter! Japan is one of my favorite places in the world, and I think you would absolutely love it.

If you're able to plan your trip for spring (late March to early April), you might be lucky enough to catch the cherry blossoms in bloom. It's a magical experience and worth planning around.

As for must-see places, I would recommend splitting your time between Tokyo and Kyoto. Tokyo is a fascinating blend of ultra-modern and traditional, while Kyoto offers a more serene experience with its temples and gardens.

Let me know if you decide to go! I'd be happy to share more specific recommendations.

Warmly,
Emily",
            "May 5, 2023",
        )
        .with_preview("Japan is one of my favorite places in the world...")
        .quoting("c1-1", "What would you say are the must-see places?"),
        Message::new(
            "c1-3",
            Sender::You,
            "Dear Emily,

Thank you for your suggestions! I've started researching flights for next spring. The cherry blossom season sounds absolutely magical.

I'm curious - what was your most memorable experience in Japan? Was there something unexpected that really stood out to you?

Best,
Me",
            "May 10, 2023",
        )
        .with_preview("Thank you for your suggestions! I've started researching flights...")
        .quoting(
            "c1-2",
            "you might be lucky enough to catch the cherry blossoms in bloom",
        ),
        Message::new("1", emily(), KYOTO_LETTER, "May 15, 2023")
            .with_preview("I wanted to tell you about my recent trip to Japan...")
            .quoting("c1-3", "what was your most memorable experience in Japan?"),
    ];
    store.insert_conversation(letter_id, thread);
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn letters_json(conversation: &str) -> String {
        format!(
            r#"{{
                "letters": [
                    {{ "id": "9", "sender": {{ "name": "Ada" }}, "content": "Hi", "date": "Jan 2, 2024" }}
                ],
                "conversations": {{ "9": {conversation} }}
            }}"#
        )
    }

    #[test]
    fn sample_thread_ends_with_the_letter_itself() {
        let store = MemoryStore::sample();
        let id = LetterId::from("1");
        let letter = store.get_letter(&id).expect("sample letter");
        let thread = store.get_conversation(&id);
        assert_eq!(thread.len(), 4);
        assert!(thread.last().expect("head").id.is_head_of(&letter.id));
        assert!(thread[0].sender.is_you());
    }

    #[test]
    fn unknown_thread_is_empty_not_an_error() {
        let store = MemoryStore::sample();
        assert!(store.get_letter(&LetterId::from("404")).is_none());
        assert!(store.get_conversation(&LetterId::from("404")).is_empty());
    }

    #[test]
    fn loads_letters_file_from_disk() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("letters.json");
        fs::write(
            &path,
            letters_json(
                r#"[
                    { "id": "9-a", "sender": { "name": "You", "is_you": true }, "content": "Hello", "date": "Jan 1, 2024" },
                    { "id": "9", "sender": { "name": "Ada" }, "content": "Hi", "date": "Jan 2, 2024" }
                ]"#,
            ),
        )?;
        let store = init(&StoreOptions { path })?;
        assert_eq!(store.letters().len(), 1);
        assert_eq!(store.get_conversation(&LetterId::from("9")).len(), 2);
        Ok(())
    }

    #[test]
    fn missing_file_falls_back_to_sample() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let store = init(&StoreOptions {
            path: dir.path().join("absent.json"),
        })?;
        assert!(store.get_letter(&LetterId::from("1")).is_some());
        Ok(())
    }

    #[test]
    fn rejects_duplicate_message_ids() -> anyhow::Result<()> {
        let file: StoreFile = serde_json::from_str(&letters_json(
            r#"[
                { "id": "dup", "sender": { "name": "Ada" }, "content": "a", "date": "d" },
                { "id": "dup", "sender": { "name": "Ada" }, "content": "b", "date": "d" }
            ]"#,
        ))?;
        let err = MemoryStore::from_records(file).expect_err("duplicate ids");
        assert!(matches!(err, StoreError::DuplicateMessageId { .. }));
        Ok(())
    }

    #[test]
    fn rejects_quotes_outside_the_thread() -> anyhow::Result<()> {
        let file: StoreFile = serde_json::from_str(&letters_json(
            r#"[
                { "id": "9", "sender": { "name": "Ada" }, "content": "a", "date": "d",
                  "quote": { "message_id": "elsewhere", "excerpt": "x" } }
            ]"#,
        ))?;
        let err = MemoryStore::from_records(file).expect_err("dangling quote");
        assert!(matches!(err, StoreError::UnknownQuote { .. }));
        Ok(())
    }

    #[test]
    fn malformed_file_reports_parse_error() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("letters.json");
        fs::write(&path, "{ not json")?;
        let err = MemoryStore::from_file(&path).expect_err("parse failure");
        assert!(matches!(err, StoreError::Parse { .. }));
        Ok(())
    }
}
