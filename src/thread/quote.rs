use std::time::{Duration, Instant};

use crate::model::{Message, MessageId};

/// Tracks the single message a quote jump landed on.
///
/// The reference is replaced on every successful activation. The highlight
/// window is cosmetic: once it closes the reference stays, only the flash
/// styling stops.
#[derive(Debug, Clone)]
pub struct QuoteNavigator {
    active: Option<MessageId>,
    highlight_for: Duration,
    highlight_until: Option<Instant>,
    scroll_pending: bool,
}

impl QuoteNavigator {
    pub fn new(highlight_for: Duration) -> Self {
        Self {
            active: None,
            highlight_for,
            highlight_until: None,
            scroll_pending: false,
        }
    }

    /// Activates `message_id` if the conversation contains it. Unknown ids
    /// leave the current reference untouched and return `None`.
    pub fn activate(
        &mut self,
        conversation: &[Message],
        message_id: &MessageId,
        now: Instant,
    ) -> Option<&MessageId> {
        if !conversation.iter().any(|message| &message.id == message_id) {
            tracing::debug!(%message_id, "ignoring quote jump to a message outside this thread");
            return None;
        }
        self.active = Some(message_id.clone());
        self.highlight_until = now.checked_add(self.highlight_for);
        self.scroll_pending = true;
        tracing::debug!(%message_id, "quote jump activated");
        self.active.as_ref()
    }

    pub fn active(&self) -> Option<&MessageId> {
        self.active.as_ref()
    }

    pub fn is_highlighted(&self, message_id: &MessageId, now: Instant) -> bool {
        match (&self.active, self.highlight_until) {
            (Some(active), Some(until)) => active == message_id && now < until,
            _ => false,
        }
    }

    /// Returns the pending scroll target once per activation.
    pub fn take_scroll_request(&mut self) -> Option<MessageId> {
        if !self.scroll_pending {
            return None;
        }
        self.scroll_pending = false;
        self.active.clone()
    }

    pub fn highlight_duration(&self) -> Duration {
        self.highlight_for
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Sender;

    fn thread() -> Vec<Message> {
        ["a", "b", "c"]
            .into_iter()
            .map(|id| Message::new(id, Sender::party("Ada"), "body", "today"))
            .collect()
    }

    #[test]
    fn every_message_in_the_thread_can_be_activated() {
        let conversation = thread();
        let now = Instant::now();
        for message in &conversation {
            let mut navigator = QuoteNavigator::new(Duration::from_secs(3));
            assert_eq!(
                navigator.activate(&conversation, &message.id, now),
                Some(&message.id)
            );
            assert_eq!(navigator.active(), Some(&message.id));
        }
    }

    #[test]
    fn latest_activation_wins() {
        let conversation = thread();
        let now = Instant::now();
        let mut navigator = QuoteNavigator::new(Duration::from_secs(3));
        navigator.activate(&conversation, &"a".into(), now);
        navigator.activate(&conversation, &"b".into(), now);
        assert_eq!(navigator.active(), Some(&"b".into()));
        assert!(!navigator.is_highlighted(&"a".into(), now));
        assert!(navigator.is_highlighted(&"b".into(), now));
    }

    #[test]
    fn unknown_id_keeps_previous_reference() {
        let conversation = thread();
        let now = Instant::now();
        let mut navigator = QuoteNavigator::new(Duration::from_secs(3));
        assert_eq!(navigator.activate(&conversation, &"zzz".into(), now), None);
        assert_eq!(navigator.active(), None);

        navigator.activate(&conversation, &"c".into(), now);
        navigator.take_scroll_request();
        assert_eq!(navigator.activate(&conversation, &"zzz".into(), now), None);
        assert_eq!(navigator.active(), Some(&"c".into()));
        assert_eq!(navigator.take_scroll_request(), None);
    }

    #[test]
    fn highlight_fades_but_reference_remains() {
        let conversation = thread();
        let start = Instant::now();
        let mut navigator = QuoteNavigator::new(Duration::from_millis(500));
        navigator.activate(&conversation, &"a".into(), start);
        assert!(navigator.is_highlighted(&"a".into(), start + Duration::from_millis(100)));
        assert!(!navigator.is_highlighted(&"a".into(), start + Duration::from_millis(600)));
        assert_eq!(navigator.active(), Some(&"a".into()));
    }

    #[test]
    fn scroll_request_is_handed_out_once() {
        let conversation = thread();
        let mut navigator = QuoteNavigator::new(Duration::from_secs(1));
        navigator.activate(&conversation, &"b".into(), Instant::now());
        assert_eq!(navigator.take_scroll_request(), Some("b".into()));
        assert_eq!(navigator.take_scroll_request(), None);
    }
}
