use std::time::{Duration, Instant};

use uuid::Uuid;

use crate::compose::{ComposePlacement, PlacementController, ReplyDraft};
use crate::model::{Letter, LetterId, Message, MessageId, Sender};
use crate::store::LetterStore;
use crate::thread::{ConversationHistory, HistoryOptions, HistoryState, QuoteNavigator};

mod ports;

pub use ports::{Navigator, Notifier, Route, TerminalViewport, Viewport};

const PREVIEW_CHARS: usize = 80;

#[derive(Debug, Clone, Copy)]
pub struct DetailOptions {
    pub history: HistoryOptions,
    pub highlight_for: Duration,
    pub placement: ComposePlacement,
}

impl Default for DetailOptions {
    fn default() -> Self {
        Self {
            history: HistoryOptions {
                expandable: true,
                start_expanded: false,
                show_compose_button: false,
            },
            highlight_for: Duration::from_secs(3),
            placement: ComposePlacement::Overlay,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Favorite {
    Marked,
    Unmarked,
}

impl Favorite {
    pub fn toggled(self) -> Self {
        match self {
            Favorite::Marked => Favorite::Unmarked,
            Favorite::Unmarked => Favorite::Marked,
        }
    }

    pub fn is_marked(self) -> bool {
        matches!(self, Favorite::Marked)
    }

    pub fn acknowledgment(self) -> (&'static str, &'static str) {
        match self {
            Favorite::Marked => ("Added to favorites", "Letter added to your favorites"),
            Favorite::Unmarked => (
                "Removed from favorites",
                "Letter removed from your favorites",
            ),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComposeAffordance {
    Inline,
    Floating,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotFound {
    pub requested: LetterId,
}

impl NotFound {
    pub const TITLE: &'static str = "Letter not found";
    pub const DESCRIPTION: &'static str =
        "The letter you're looking for doesn't exist or has been removed.";

    pub fn back_to_inbox(&self, navigator: &mut dyn Navigator) {
        navigator.go_to(Route::Dashboard);
    }
}

#[derive(Debug, Clone)]
pub enum DetailView {
    NotFound(NotFound),
    Loaded(Box<LetterDetail>),
}

impl DetailView {
    pub fn open<S>(store: &S, id: &LetterId, options: &DetailOptions) -> Self
    where
        S: LetterStore + ?Sized,
    {
        let Some(letter) = store.get_letter(id) else {
            tracing::info!(letter_id = %id, "letter not found");
            return DetailView::NotFound(NotFound {
                requested: id.clone(),
            });
        };
        let conversation = store.get_conversation(id);
        tracing::debug!(
            letter_id = %id,
            messages = conversation.len(),
            "opened letter detail"
        );
        DetailView::Loaded(Box::new(LetterDetail::new(letter, conversation, options)))
    }
}

/// A letter with its local copy of the thread and the page's transient state.
#[derive(Debug, Clone)]
pub struct LetterDetail {
    letter: Letter,
    conversation: Vec<Message>,
    favorite: Favorite,
    quotes: QuoteNavigator,
    history: HistoryState,
    placement: PlacementController,
    draft: Option<ReplyDraft>,
}

impl LetterDetail {
    pub fn new(letter: Letter, conversation: Vec<Message>, options: &DetailOptions) -> Self {
        Self {
            letter,
            conversation,
            favorite: Favorite::Unmarked,
            quotes: QuoteNavigator::new(options.highlight_for),
            history: HistoryState::new(options.history),
            placement: PlacementController::new(options.placement),
            draft: None,
        }
    }

    pub fn letter(&self) -> &Letter {
        &self.letter
    }

    pub fn conversation(&self) -> &[Message] {
        &self.conversation
    }

    pub fn favorite(&self) -> Favorite {
        self.favorite
    }

    /// A lone head message is not a history.
    pub fn shows_history(&self) -> bool {
        self.conversation.len() > 1
    }

    pub fn history(&self) -> Option<ConversationHistory<'_>> {
        if !self.shows_history() {
            return None;
        }
        Some(ConversationHistory::new(
            &self.conversation,
            self.active_message_id(),
            &self.history,
        ))
    }

    pub fn history_state_mut(&mut self) -> &mut HistoryState {
        &mut self.history
    }

    /// The quote-jump destination, or the letter's own head entry before any jump.
    pub fn active_message_id(&self) -> Option<&MessageId> {
        self.quotes.active().or_else(|| {
            self.conversation
                .iter()
                .map(|message| &message.id)
                .find(|id| id.is_head_of(&self.letter.id))
        })
    }

    pub fn toggle_favorite(&mut self, notifier: &mut dyn Notifier) -> Favorite {
        self.favorite = self.favorite.toggled();
        let (title, description) = self.favorite.acknowledgment();
        tracing::debug!(letter_id = %self.letter.id, favorite = self.favorite.is_marked(), "favorite toggled");
        notifier.notify(title, description);
        self.favorite
    }

    pub fn activate_quote(&mut self, message_id: &MessageId, now: Instant) -> Option<&MessageId> {
        let activated = self
            .quotes
            .activate(&self.conversation, message_id, now)
            .is_some();
        if !activated {
            return None;
        }
        self.history.select_message(&self.conversation, message_id);
        self.quotes.active()
    }

    pub fn active_quote(&self) -> Option<&MessageId> {
        self.quotes.active()
    }

    pub fn is_quote_highlighted(&self, message_id: &MessageId, now: Instant) -> bool {
        self.quotes.is_highlighted(message_id, now)
    }

    pub fn take_scroll_request(&mut self) -> Option<MessageId> {
        self.quotes.take_scroll_request()
    }

    /// Irreversibly removes the whole thread from this session and leaves the page.
    pub fn delete_conversation(self, notifier: &mut dyn Notifier, navigator: &mut dyn Navigator) {
        tracing::info!(
            letter_id = %self.letter.id,
            messages = self.conversation.len(),
            "conversation deleted"
        );
        notifier.notify(
            "Conversation deleted",
            "The entire conversation has been permanently removed.",
        );
        navigator.go_to(Route::Dashboard);
    }

    pub fn compose_affordance(&self, viewport: Option<&dyn Viewport>) -> ComposeAffordance {
        match viewport.map(|viewport| viewport.is_handheld()) {
            Some(true) => ComposeAffordance::Floating,
            Some(false) | None => ComposeAffordance::Inline,
        }
    }

    pub fn placement(&self) -> ComposePlacement {
        self.placement.current()
    }

    pub fn set_placement(&mut self, mode: ComposePlacement) -> bool {
        self.placement.set_mode(mode)
    }

    pub fn open_composer(&mut self) -> &mut ReplyDraft {
        let letter_id = self.letter.id.clone();
        let recipient = self.letter.sender.display_name().to_string();
        self.draft
            .get_or_insert_with(|| ReplyDraft::new(letter_id, recipient))
    }

    pub fn draft(&self) -> Option<&ReplyDraft> {
        self.draft.as_ref()
    }

    pub fn draft_mut(&mut self) -> Option<&mut ReplyDraft> {
        self.draft.as_mut()
    }

    pub fn discard_draft(&mut self) -> Option<ReplyDraft> {
        self.draft.take()
    }

    /// Appends the draft to the local thread. Blank drafts stay open and
    /// nothing is appended.
    pub fn send_reply(&mut self, date: impl Into<String>) -> Option<MessageId> {
        if self.draft.as_ref().map_or(true, ReplyDraft::is_blank) {
            return None;
        }
        let draft = self.draft.take()?;
        let body = draft.body().trim_end().to_string();
        let preview = reply_preview(&body);
        let id = MessageId::new(format!("reply-{}", Uuid::new_v4()));
        let message = Message::new(id.clone(), Sender::You, body, date).with_preview(preview);
        self.conversation.push(message);
        tracing::info!(letter_id = %self.letter.id, message_id = %id, "reply appended to thread");
        Some(id)
    }
}

fn reply_preview(body: &str) -> String {
    let first = body
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or_default();
    let mut preview: String = first.chars().take(PREVIEW_CHARS).collect();
    if first.chars().count() > PREVIEW_CHARS {
        preview.push('…');
    }
    preview
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::MessageFlags;
    use crate::store::MemoryStore;
    use crate::thread::HistoryEvent;
    use assert_matches::assert_matches;

    #[derive(Default)]
    struct RecordingNotifier {
        seen: Vec<(String, String)>,
    }

    impl Notifier for RecordingNotifier {
        fn notify(&mut self, title: &str, description: &str) {
            self.seen.push((title.to_string(), description.to_string()));
        }
    }

    #[derive(Default)]
    struct RecordingNavigator {
        routes: Vec<Route>,
    }

    impl Navigator for RecordingNavigator {
        fn go_to(&mut self, route: Route) {
            self.routes.push(route);
        }
    }

    struct FixedViewport(bool);

    impl Viewport for FixedViewport {
        fn is_handheld(&self) -> bool {
            self.0
        }
    }

    fn letter(id: &str) -> Letter {
        Letter {
            id: id.into(),
            sender: Sender::party("Emily Chen"),
            content: "Dear Friend,".into(),
            preview: "Dear Friend".into(),
            timestamp: "2 hours ago".into(),
            date: "May 15, 2023".into(),
            flags: MessageFlags::empty(),
        }
    }

    fn store_with_thread(len: usize) -> MemoryStore {
        let mut store = MemoryStore::new();
        store.insert_letter(letter("1"));
        let mut thread: Vec<Message> = (0..len.saturating_sub(1))
            .map(|i| Message::new(format!("c1-{i}"), Sender::You, "earlier", "May 1, 2023"))
            .collect();
        if len > 0 {
            thread.push(Message::new("1", Sender::party("Emily Chen"), "head", "May 15, 2023"));
        }
        store.insert_conversation("1".into(), thread);
        store
    }

    fn open_loaded(store: &MemoryStore) -> LetterDetail {
        match DetailView::open(store, &"1".into(), &DetailOptions::default()) {
            DetailView::Loaded(detail) => *detail,
            DetailView::NotFound(_) => panic!("letter should exist"),
        }
    }

    #[test]
    fn missing_letter_is_terminal_not_found() {
        let store = store_with_thread(3);
        let view = DetailView::open(&store, &"404".into(), &DetailOptions::default());
        assert_matches!(view, DetailView::NotFound(NotFound { requested }) if requested.as_str() == "404");
    }

    #[test]
    fn not_found_leads_back_to_inbox() {
        let mut navigator = RecordingNavigator::default();
        let missing = NotFound {
            requested: "404".into(),
        };
        missing.back_to_inbox(&mut navigator);
        assert_eq!(navigator.routes, vec![Route::Dashboard]);
    }

    #[test]
    fn short_threads_never_mount_history() {
        for len in [0, 1] {
            let detail = open_loaded(&store_with_thread(len));
            assert!(!detail.shows_history());
            assert!(detail.history().is_none());
        }
        let detail = open_loaded(&store_with_thread(2));
        assert!(detail.shows_history());
        assert_eq!(detail.history().map(|h| h.len()), Some(2));
    }

    #[test]
    fn activating_any_message_selects_only_it() {
        let store = store_with_thread(4);
        let ids: Vec<MessageId> = store
            .get_conversation(&"1".into())
            .into_iter()
            .map(|m| m.id)
            .collect();
        for id in &ids {
            let mut detail = open_loaded(&store);
            assert_eq!(detail.activate_quote(id, Instant::now()), Some(id));
            assert_eq!(detail.active_quote(), Some(id));
            let history = detail.history().expect("history");
            let active: Vec<_> = history
                .entries()
                .filter(|entry| entry.is_active)
                .map(|entry| entry.message.id.clone())
                .collect();
            assert_eq!(active, vec![id.clone()]);
        }
    }

    #[test]
    fn dangling_quote_changes_nothing() {
        let mut detail = open_loaded(&store_with_thread(3));
        let now = Instant::now();
        detail.activate_quote(&"c1-0".into(), now);
        assert_eq!(detail.activate_quote(&"nope".into(), now), None);
        assert_eq!(detail.active_quote(), Some(&"c1-0".into()));
    }

    #[test]
    fn head_entry_is_active_before_any_jump() {
        let detail = open_loaded(&store_with_thread(3));
        assert_eq!(detail.active_quote(), None);
        assert_eq!(detail.active_message_id(), Some(&"1".into()));
    }

    #[test]
    fn favorite_acknowledges_post_toggle_state() {
        let mut detail = open_loaded(&store_with_thread(2));
        let mut notifier = RecordingNotifier::default();
        assert_eq!(detail.toggle_favorite(&mut notifier), Favorite::Marked);
        assert_eq!(notifier.seen[0].0, "Added to favorites");
        assert_eq!(detail.toggle_favorite(&mut notifier), Favorite::Unmarked);
        assert_eq!(notifier.seen[1].0, "Removed from favorites");
        assert_eq!(detail.favorite(), Favorite::Unmarked);
        assert_eq!(notifier.seen.len(), 2);
    }

    #[test]
    fn delete_navigates_exactly_once_for_any_length() {
        for len in [1, 2, 5] {
            let detail = open_loaded(&store_with_thread(len));
            let mut notifier = RecordingNotifier::default();
            let mut navigator = RecordingNavigator::default();
            detail.delete_conversation(&mut notifier, &mut navigator);
            assert_eq!(navigator.routes, vec![Route::Dashboard]);
            assert_eq!(notifier.seen.len(), 1);
            assert_eq!(notifier.seen[0].0, "Conversation deleted");
        }
    }

    #[test]
    fn quote_jump_then_delete_scenario() {
        let store = store_with_thread(3);
        let mut detail = open_loaded(&store);
        let first = detail.conversation()[0].id.clone();
        detail.activate_quote(&first, Instant::now());
        assert_eq!(detail.active_quote(), Some(&first));

        let event = detail.history().map(|history| history.request_delete());
        assert_eq!(event, Some(HistoryEvent::DeleteConversation));

        let mut notifier = RecordingNotifier::default();
        let mut navigator = RecordingNavigator::default();
        detail.delete_conversation(&mut notifier, &mut navigator);
        assert_eq!(navigator.routes.len(), 1);
        assert_eq!(navigator.routes[0].to_string(), "/dashboard");
    }

    #[test]
    fn handheld_viewport_gets_floating_affordance() {
        let detail = open_loaded(&store_with_thread(2));
        assert_eq!(
            detail.compose_affordance(Some(&FixedViewport(true))),
            ComposeAffordance::Floating
        );
        assert_eq!(
            detail.compose_affordance(Some(&FixedViewport(false))),
            ComposeAffordance::Inline
        );
        assert_eq!(detail.compose_affordance(None), ComposeAffordance::Inline);
    }

    #[test]
    fn sent_reply_extends_local_copy_only() {
        let store = store_with_thread(1);
        let mut detail = open_loaded(&store);
        assert!(!detail.shows_history());

        assert_eq!(detail.send_reply("May 16, 2023"), None);
        let draft = detail.open_composer();
        assert_eq!(draft.recipient(), "Emily Chen");
        for ch in "Thank you!".chars() {
            draft.insert_char(ch);
        }
        let id = detail.send_reply("May 16, 2023").expect("reply id");

        assert!(detail.draft().is_none());
        assert!(detail.shows_history());
        let last = detail.conversation().last().expect("reply");
        assert_eq!(last.id, id);
        assert!(last.sender.is_you());
        assert_eq!(last.preview.as_deref(), Some("Thank you!"));
        assert_eq!(store.get_conversation(&"1".into()).len(), 1);
    }

    #[test]
    fn placement_is_held_by_the_detail() {
        let mut detail = open_loaded(&store_with_thread(2));
        assert_eq!(detail.placement(), ComposePlacement::Overlay);
        assert!(!detail.set_placement(ComposePlacement::Overlay));
        assert!(detail.set_placement(ComposePlacement::NewTab));
        assert_eq!(detail.placement(), ComposePlacement::NewTab);
    }
}
