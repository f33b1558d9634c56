use std::collections::HashSet;
use std::time::{Duration, Instant};

use time::OffsetDateTime;

use crate::detail::{DetailView, LetterDetail, Navigator, NotFound, Notifier, Route, TerminalViewport};
use crate::model::{Letter, LetterId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Inbox,
    Detail,
    NotFound,
    /// The composer detached from the thread (new-tab placement)
    ComposeTab,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusPane {
    Thread,
    Composer,
}

#[derive(Debug, Clone)]
pub struct Toast {
    pub title: String,
    pub description: String,
    pub shown_at: OffsetDateTime,
    expires_at: Instant,
}

#[derive(Debug, Clone)]
pub struct Toasts {
    items: Vec<Toast>,
    ttl: Duration,
}

impl Toasts {
    const MAX_VISIBLE: usize = 3;

    pub fn new(ttl: Duration) -> Self {
        Self {
            items: Vec::new(),
            ttl,
        }
    }

    pub fn items(&self) -> &[Toast] {
        &self.items
    }

    pub fn latest(&self) -> Option<&Toast> {
        self.items.last()
    }

    pub fn expire(&mut self, now: Instant) {
        self.items.retain(|toast| toast.expires_at > now);
    }
}

impl Notifier for Toasts {
    fn notify(&mut self, title: &str, description: &str) {
        tracing::info!(%title, %description, "notification");
        self.items.push(Toast {
            title: title.to_string(),
            description: description.to_string(),
            shown_at: OffsetDateTime::now_utc(),
            expires_at: Instant::now() + self.ttl,
        });
        if self.items.len() > Self::MAX_VISIBLE {
            let overflow = self.items.len() - Self::MAX_VISIBLE;
            self.items.drain(0..overflow);
        }
    }
}

/// Collects the route requested while an action runs; applied afterwards.
#[derive(Debug, Clone, Default)]
pub struct SessionNavigator {
    pending: Option<Route>,
}

impl SessionNavigator {
    pub fn take(&mut self) -> Option<Route> {
        self.pending.take()
    }
}

impl Navigator for SessionNavigator {
    fn go_to(&mut self, route: Route) {
        tracing::debug!(%route, "navigation requested");
        self.pending = Some(route);
    }
}

#[derive(Debug, Clone)]
pub struct ConfirmDeleteOverlay {
    pub letter_id: LetterId,
    pub sender: String,
    pub messages: usize,
}

#[derive(Debug, Clone)]
pub enum OverlayState {
    ConfirmDelete(ConfirmDeleteOverlay),
}

#[derive(Debug, Clone, Default)]
pub struct FindState {
    pub active: bool,
    pub query: String,
}

impl FindState {
    pub fn tokens(&self) -> Vec<String> {
        self.query
            .split_whitespace()
            .map(str::to_string)
            .collect()
    }
}

#[derive(Debug, Clone)]
pub struct AppState {
    pub screen: Screen,
    pub focus: FocusPane,
    pub letters: Vec<Letter>,
    pub selected: usize,
    pub deleted: HashSet<LetterId>,
    pub view: Option<DetailView>,
    pub overlay: Option<OverlayState>,
    pub find: FindState,
    pub toasts: Toasts,
    pub navigator: SessionNavigator,
    pub status_message: Option<String>,
    pub viewport: Option<TerminalViewport>,
}

impl AppState {
    pub fn new(letters: Vec<Letter>, toast_ttl: Duration) -> Self {
        Self {
            screen: Screen::Inbox,
            focus: FocusPane::Thread,
            letters,
            selected: 0,
            deleted: HashSet::new(),
            view: None,
            overlay: None,
            find: FindState::default(),
            toasts: Toasts::new(toast_ttl),
            navigator: SessionNavigator::default(),
            status_message: None,
            viewport: None,
        }
    }

    /// Inbox entries, minus threads deleted during this session.
    pub fn inbox(&self) -> Vec<&Letter> {
        self.letters
            .iter()
            .filter(|letter| !self.deleted.contains(&letter.id))
            .collect()
    }

    pub fn selected_letter(&self) -> Option<&Letter> {
        self.inbox().get(self.selected).copied()
    }

    pub fn move_selection(&mut self, delta: isize) {
        let len = self.inbox().len();
        if len == 0 {
            self.selected = 0;
            return;
        }
        let next = (self.selected as isize + delta).clamp(0, len as isize - 1);
        self.selected = next as usize;
    }

    pub fn normalize_selection(&mut self) {
        let len = self.inbox().len();
        if self.selected >= len {
            self.selected = len.saturating_sub(1);
        }
    }

    pub fn show_view(&mut self, view: DetailView) {
        self.screen = match &view {
            DetailView::Loaded(_) => Screen::Detail,
            DetailView::NotFound(_) => Screen::NotFound,
        };
        self.focus = FocusPane::Thread;
        self.overlay = None;
        self.find = FindState::default();
        self.view = Some(view);
    }

    pub fn show_inbox(&mut self) {
        self.view = None;
        self.overlay = None;
        self.focus = FocusPane::Thread;
        self.find = FindState::default();
        self.screen = Screen::Inbox;
        self.normalize_selection();
    }

    pub fn detail(&self) -> Option<&LetterDetail> {
        match self.view.as_ref()? {
            DetailView::Loaded(detail) => Some(detail),
            DetailView::NotFound(_) => None,
        }
    }

    pub fn detail_mut(&mut self) -> Option<&mut LetterDetail> {
        match self.view.as_mut()? {
            DetailView::Loaded(detail) => Some(detail),
            DetailView::NotFound(_) => None,
        }
    }

    pub fn not_found(&self) -> Option<&NotFound> {
        match self.view.as_ref()? {
            DetailView::NotFound(missing) => Some(missing),
            DetailView::Loaded(_) => None,
        }
    }

    pub fn is_handheld(&self) -> bool {
        use crate::detail::Viewport;
        self.viewport
            .as_ref()
            .map(|viewport| viewport.is_handheld())
            .unwrap_or(false)
    }

    pub fn set_status_message<S: Into<String>>(&mut self, message: Option<S>) {
        self.status_message = message.map(Into::into);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{LetterStore, MemoryStore};

    #[test]
    fn toasts_expire_and_cap() {
        let mut toasts = Toasts::new(Duration::from_millis(50));
        for idx in 0..5 {
            toasts.notify(&format!("t{idx}"), "d");
        }
        assert_eq!(toasts.items().len(), 3);
        assert_eq!(toasts.latest().map(|t| t.title.as_str()), Some("t4"));
        toasts.expire(Instant::now() + Duration::from_secs(1));
        assert!(toasts.items().is_empty());
    }

    #[test]
    fn navigator_keeps_last_route_once() {
        let mut navigator = SessionNavigator::default();
        navigator.go_to(Route::Dashboard);
        assert_eq!(navigator.take(), Some(Route::Dashboard));
        assert_eq!(navigator.take(), None);
    }

    #[test]
    fn deleted_threads_leave_the_inbox() {
        let store = MemoryStore::sample();
        let mut state = AppState::new(store.letters(), Duration::from_secs(1));
        assert_eq!(state.inbox().len(), 1);
        state.deleted.insert("1".into());
        assert!(state.inbox().is_empty());
        assert!(state.selected_letter().is_none());
        state.move_selection(1);
        assert_eq!(state.selected, 0);
    }

    #[test]
    fn find_tokens_split_on_whitespace() {
        let find = FindState {
            active: true,
            query: "  cherry   Kyoto ".into(),
        };
        assert_eq!(find.tokens(), vec!["cherry", "Kyoto"]);
    }
}
