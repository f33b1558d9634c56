use std::collections::HashSet;

use regex::{Regex, RegexBuilder};

use crate::model::{Message, MessageId};

/// Case-insensitive matcher behind find-in-thread.
#[derive(Debug, Clone)]
pub struct FindPattern {
    regex: Regex,
}

impl FindPattern {
    /// Returns `None` when no usable token remains.
    pub fn new(tokens: &[String]) -> Option<Self> {
        let mut seen = HashSet::new();
        let mut terms: Vec<&str> = tokens
            .iter()
            .map(|token| token.trim())
            .filter(|token| !token.is_empty())
            .filter(|token| seen.insert(token.to_lowercase()))
            .collect();
        if terms.is_empty() {
            return None;
        }
        // longest first so "cherry" wins over "cher"
        terms.sort_by(|a, b| b.len().cmp(&a.len()));
        let pattern = terms
            .into_iter()
            .map(regex::escape)
            .collect::<Vec<_>>()
            .join("|");
        let regex = RegexBuilder::new(&pattern)
            .case_insensitive(true)
            .build()
            .ok()?;
        Some(Self { regex })
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }

    /// Splits `text` into runs, flagging the ones that matched.
    pub fn segments<'t>(&self, text: &'t str) -> Vec<(&'t str, bool)> {
        let mut segments = Vec::new();
        let mut last = 0;
        for found in self.regex.find_iter(text) {
            if found.start() > last {
                segments.push((&text[last..found.start()], false));
            }
            segments.push((found.as_str(), true));
            last = found.end();
        }
        if last < text.len() || segments.is_empty() {
            segments.push((&text[last..], false));
        }
        segments
    }

    /// Thread messages whose sender, body or quote excerpt match.
    pub fn matching_messages<'a>(&self, conversation: &'a [Message]) -> Vec<&'a MessageId> {
        conversation
            .iter()
            .filter(|message| {
                self.is_match(message.sender.display_name())
                    || self.is_match(&message.content)
                    || message
                        .quote
                        .as_ref()
                        .map_or(false, |quote| self.is_match(&quote.excerpt))
            })
            .map(|message| &message.id)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Sender;

    #[test]
    fn longer_terms_take_precedence() {
        let pattern = FindPattern::new(&["cher".into(), "cherry".into()]).expect("pattern");
        let segments = pattern.segments("cherry blossoms");
        assert_eq!(segments, vec![("cherry", true), (" blossoms", false)]);
    }

    #[test]
    fn blank_and_repeated_terms_collapse() {
        assert!(FindPattern::new(&["  ".into()]).is_none());
        let pattern =
            FindPattern::new(&["Kyoto".into(), "kyoto".into(), "".into()]).expect("pattern");
        assert_eq!(
            pattern.segments("in KYOTO"),
            vec![("in ", false), ("KYOTO", true)]
        );
    }

    #[test]
    fn unmatched_text_is_one_plain_segment() {
        let pattern = FindPattern::new(&["tea".into()]).expect("pattern");
        assert_eq!(pattern.segments("coffee"), vec![("coffee", false)]);
        assert_eq!(pattern.segments(""), vec![("", false)]);
    }

    #[test]
    fn matches_bodies_senders_and_excerpts() {
        let conversation = vec![
            Message::new("a", Sender::You, "Hello there", "May 1"),
            Message::new("b", Sender::party("Ada"), "Nothing here", "May 2"),
            Message::new("c", Sender::party("Bo"), "fine", "May 3").quoting("a", "Hello"),
        ];
        let pattern = FindPattern::new(&["hello".into()]).expect("pattern");
        let ids: Vec<_> = pattern
            .matching_messages(&conversation)
            .into_iter()
            .map(MessageId::as_str)
            .collect();
        assert_eq!(ids, vec!["a", "c"]);

        let pattern = FindPattern::new(&["ada".into()]).expect("pattern");
        assert_eq!(pattern.matching_messages(&conversation).len(), 1);
    }
}
