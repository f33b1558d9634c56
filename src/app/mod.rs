use std::io::Stdout;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
    KeyModifiers,
};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::{Backend, CrosstermBackend};
use ratatui::Terminal;
use time::macros::format_description;
use time::OffsetDateTime;

use crate::compose::ComposePlacement;
use crate::config::themes::{Palette, ThemeRegistry};
use crate::config::AppConfig;
use crate::detail::{DetailOptions, DetailView, Navigator, Notifier, Route, TerminalViewport};
use crate::model::{LetterId, MessageId};
use crate::store::LetterStore;
use crate::thread::{HistoryEvent, HistoryOptions};
use crate::ui::{self, RenderState};

mod actions;
pub mod state;

use self::actions::{map_key, placement_function_key, Action};
pub use state::{AppState, ConfirmDeleteOverlay, FocusPane, OverlayState, Screen, Toasts};

pub struct App {
    pub config: Arc<AppConfig>,
    store: Box<dyn LetterStore>,
    state: AppState,
    render: RenderState,
    palette: Palette,
    should_quit: bool,
    tick_rate: Duration,
}

impl App {
    pub fn new(config: Arc<AppConfig>, store: Box<dyn LetterStore>) -> Self {
        let letters = store.letters();
        let state = AppState::new(letters, config.notifications.toast_duration());
        let palette = ThemeRegistry::default().palette(config.theme);
        Self {
            config,
            store,
            state,
            render: RenderState::default(),
            palette,
            should_quit: false,
            tick_rate: Duration::from_millis(250),
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn run(&mut self, initial: Option<LetterId>) -> Result<()> {
        let mut terminal = setup_terminal()?;
        self.classify_viewport(&terminal);
        if let Some(id) = initial {
            self.open_letter(&id);
        }
        let result = self.event_loop(&mut terminal);
        restore_terminal(&mut terminal)?;
        result
    }

    pub fn open_letter(&mut self, id: &LetterId) {
        let options = self.detail_options();
        let view = DetailView::open(self.store.as_ref(), id, &options);
        self.state.show_view(view);
        self.render.history.reset();
        if let Some(id) = self.active_entry() {
            self.render.history.keep_visible(id);
        }
    }

    fn active_entry(&self) -> Option<MessageId> {
        self.state
            .detail()
            .and_then(|detail| detail.active_message_id().cloned())
    }

    fn detail_options(&self) -> DetailOptions {
        let placement = if self.state.is_handheld() {
            self.config.compose.handheld_placement
        } else {
            self.config.compose.default_placement
        };
        DetailOptions {
            history: HistoryOptions {
                expandable: self.config.history.expandable,
                start_expanded: self.config.history.start_expanded,
                show_compose_button: false,
            },
            highlight_for: self.config.quotes.highlight_duration(),
            placement,
        }
    }

    fn classify_viewport<B: Backend>(&mut self, terminal: &Terminal<B>) {
        self.state.viewport = terminal.size().ok().map(|area| {
            TerminalViewport::new(area.width, self.config.viewport.handheld_max_columns)
        });
    }

    fn draw<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<()> {
        if let Some(detail) = self.state.detail_mut() {
            if let Some(target) = detail.take_scroll_request() {
                self.render.history.scroll_to(target);
            }
        }
        terminal
            .draw(|frame| ui::draw_app(frame, &self.state, &mut self.render, &self.palette))
            .context("rendering frame")?;
        Ok(())
    }

    fn event_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
        let mut last_tick = Instant::now();
        loop {
            self.classify_viewport(terminal);
            self.draw(terminal)?;

            if self.should_quit {
                break;
            }

            let timeout = self
                .tick_rate
                .checked_sub(last_tick.elapsed())
                .unwrap_or_else(|| Duration::from_millis(0));

            if event::poll(timeout).context("polling for terminal events")? {
                match event::read().context("reading terminal event")? {
                    Event::Key(key) => self.handle_key(key),
                    // resizes are picked up by the next viewport classification
                    _ => {}
                }
            }

            if last_tick.elapsed() >= self.tick_rate {
                self.state.toasts.expire(Instant::now());
                last_tick = Instant::now();
            }
        }
        Ok(())
    }

    fn handle_key(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }

        if !self.handle_overlay_key(key)
            && !self.handle_find_key(key)
            && !self.handle_composer_key(key)
        {
            if let Some(action) = map_key(self.state.screen, &key) {
                self.handle_action(action);
            }
        }
        self.apply_navigation();
    }

    fn apply_navigation(&mut self) {
        match self.state.navigator.take() {
            Some(Route::Dashboard) => self.state.show_inbox(),
            Some(Route::Letter(id)) => self.open_letter(&id),
            None => {}
        }
    }

    fn handle_action(&mut self, action: Action) {
        match action {
            Action::Quit => self.should_quit = true,
            Action::SelectNext => self.state.move_selection(1),
            Action::SelectPrevious => self.state.move_selection(-1),
            Action::OpenSelected => {
                if let Some(id) = self.state.selected_letter().map(|letter| letter.id.clone()) {
                    self.state.navigator.go_to(Route::Letter(id));
                }
            }
            Action::Back => self.handle_back(),
            Action::ToggleFavorite => {
                if let Some(DetailView::Loaded(detail)) = self.state.view.as_mut() {
                    detail.toggle_favorite(&mut self.state.toasts);
                }
            }
            Action::Compose => self.handle_compose(),
            Action::SetPlacement(mode) => self.handle_set_placement(mode),
            Action::ToggleExpanded => self.handle_toggle_expanded(),
            Action::HistoryNext => self.move_history_selection(1),
            Action::HistoryPrevious => self.move_history_selection(-1),
            Action::FollowQuote => self.handle_follow_quote(),
            Action::DeleteConversation => self.handle_delete_request(),
            Action::StartFind => {
                self.state.find.active = true;
                self.state.find.query.clear();
                self.state
                    .set_status_message(Some("Find in thread: type terms • Enter keep • Esc clear"));
            }
            Action::SwitchTab => self.handle_switch_tab(),
        }
    }

    fn handle_back(&mut self) {
        match self.state.view.as_ref() {
            Some(DetailView::NotFound(missing)) => {
                missing.back_to_inbox(&mut self.state.navigator);
            }
            Some(DetailView::Loaded(_)) => self.state.navigator.go_to(Route::Dashboard),
            None => {}
        }
    }

    fn handle_compose(&mut self) {
        let Some(detail) = self.state.detail_mut() else {
            return;
        };
        let recipient = detail.open_composer().recipient().to_string();
        match detail.placement() {
            ComposePlacement::NewTab => self.state.screen = Screen::ComposeTab,
            ComposePlacement::Overlay | ComposePlacement::SideBySide => {
                self.state.focus = FocusPane::Composer;
            }
        }
        self.state.set_status_message(Some(format!(
            "Replying to {recipient}: Ctrl-s send • Esc discard • F1-F3 placement"
        )));
    }

    fn handle_set_placement(&mut self, mode: ComposePlacement) {
        let Some(detail) = self.state.detail_mut() else {
            return;
        };
        if !detail.set_placement(mode) {
            return;
        }
        let composing = detail.draft().is_some();
        if composing {
            match mode {
                ComposePlacement::NewTab => self.state.screen = Screen::ComposeTab,
                ComposePlacement::Overlay | ComposePlacement::SideBySide => {
                    self.state.screen = Screen::Detail;
                    self.state.focus = FocusPane::Composer;
                }
            }
        }
        self.state
            .set_status_message(Some(format!("{}: {}", mode.label(), mode.hint())));
    }

    fn handle_switch_tab(&mut self) {
        let Some(detail) = self.state.detail() else {
            return;
        };
        let composing = detail.draft().is_some();
        let placement = detail.placement();
        match (self.state.screen, placement) {
            (Screen::ComposeTab, _) => {
                self.state.screen = Screen::Detail;
                self.state.focus = FocusPane::Thread;
            }
            (Screen::Detail, ComposePlacement::NewTab) if composing => {
                self.state.screen = Screen::ComposeTab;
            }
            (Screen::Detail, ComposePlacement::SideBySide) if composing => {
                self.state.focus = FocusPane::Composer;
            }
            _ => {}
        }
    }

    fn handle_toggle_expanded(&mut self) {
        let Some(detail) = self.state.detail_mut() else {
            return;
        };
        if !detail.shows_history() {
            return;
        }
        if !detail.history_state_mut().toggle_expanded() {
            return;
        }
        if let Some(id) = self.active_entry() {
            self.render.history.keep_visible(id);
        }
    }

    fn move_history_selection(&mut self, delta: isize) {
        let Some(detail) = self.state.detail_mut() else {
            return;
        };
        if !detail.shows_history() {
            return;
        }
        let len = detail.conversation().len();
        detail.history_state_mut().move_selection(delta, len);
        let selected = detail
            .history()
            .and_then(|history| history.selected_message().map(|m| m.id.clone()));
        if let Some(id) = selected {
            self.render.history.keep_visible(id);
        }
    }

    fn handle_follow_quote(&mut self) {
        let Some(detail) = self.state.detail_mut() else {
            return;
        };
        let event = detail
            .history()
            .and_then(|history| history.follow_selected_quote());
        match event {
            Some(HistoryEvent::ScrollToQuote(id)) => {
                if detail.activate_quote(&id, Instant::now()).is_none() {
                    tracing::debug!(message_id = %id, "quote target missing from thread");
                }
            }
            Some(HistoryEvent::DeleteConversation | HistoryEvent::Compose) | None => {
                self.state
                    .set_status_message(Some("Selected message does not quote another letter"));
            }
        }
    }

    fn handle_delete_request(&mut self) {
        let Some(detail) = self.state.detail() else {
            return;
        };
        let event = detail
            .history()
            .map(|history| history.request_delete())
            .unwrap_or(HistoryEvent::DeleteConversation);
        if event != HistoryEvent::DeleteConversation {
            return;
        }
        let overlay = ConfirmDeleteOverlay {
            letter_id: detail.letter().id.clone(),
            sender: detail.letter().sender.display_name().to_string(),
            messages: detail.conversation().len(),
        };
        self.state.overlay = Some(OverlayState::ConfirmDelete(overlay));
        self.state
            .set_status_message(Some("Delete conversation: Enter confirm • Esc cancel"));
    }

    fn confirm_delete(&mut self) {
        self.state.overlay = None;
        let Some(DetailView::Loaded(detail)) = self.state.view.take() else {
            return;
        };
        let letter_id = detail.letter().id.clone();
        detail.delete_conversation(&mut self.state.toasts, &mut self.state.navigator);
        self.state.deleted.insert(letter_id);
        self.state.set_status_message(None::<String>);
    }

    fn handle_overlay_key(&mut self, key: KeyEvent) -> bool {
        match self.state.overlay {
            Some(OverlayState::ConfirmDelete(_)) => {
                match key.code {
                    KeyCode::Esc => {
                        self.state.overlay = None;
                        self.state.set_status_message(Some("Delete canceled"));
                    }
                    KeyCode::Enter => self.confirm_delete(),
                    _ => {}
                }
                true
            }
            None => false,
        }
    }

    fn handle_find_key(&mut self, key: KeyEvent) -> bool {
        if !self.state.find.active {
            return false;
        }
        match key.code {
            KeyCode::Esc => {
                self.state.find.active = false;
                self.state.find.query.clear();
                self.state.set_status_message(Some("Find cleared"));
            }
            KeyCode::Enter => {
                self.state.find.active = false;
                self.state.set_status_message(None::<String>);
            }
            KeyCode::Backspace => {
                self.state.find.query.pop();
            }
            KeyCode::Char(ch)
                if !key.modifiers.intersects(
                    KeyModifiers::CONTROL | KeyModifiers::ALT | KeyModifiers::SUPER,
                ) =>
            {
                if self.state.find.query.len() < 120 {
                    self.state.find.query.push(ch);
                }
            }
            _ => {}
        }
        true
    }

    fn composer_has_focus(&self) -> bool {
        let Some(detail) = self.state.detail() else {
            return false;
        };
        if detail.draft().is_none() {
            return false;
        }
        match self.state.screen {
            Screen::ComposeTab => true,
            Screen::Detail => {
                detail.placement() != ComposePlacement::NewTab
                    && self.state.focus == FocusPane::Composer
            }
            Screen::Inbox | Screen::NotFound => false,
        }
    }

    fn handle_composer_key(&mut self, key: KeyEvent) -> bool {
        if !self.composer_has_focus() {
            return false;
        }
        if let Some(mode) = placement_function_key(&key) {
            self.handle_set_placement(mode);
            return true;
        }
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            match key.code {
                KeyCode::Char('s') => {
                    self.send_reply();
                    return true;
                }
                KeyCode::Char('z') => {
                    if let Some(draft) = self.state.detail_mut().and_then(|d| d.draft_mut()) {
                        draft.undo();
                    }
                    return true;
                }
                KeyCode::Char('y') => {
                    if let Some(draft) = self.state.detail_mut().and_then(|d| d.draft_mut()) {
                        draft.redo();
                    }
                    return true;
                }
                KeyCode::Char('c') => return false,
                _ => return true,
            }
        }

        match key.code {
            KeyCode::Esc => {
                self.close_composer();
                return true;
            }
            KeyCode::Tab => {
                match self.state.screen {
                    Screen::ComposeTab => self.handle_switch_tab(),
                    _ => self.state.focus = FocusPane::Thread,
                }
                return true;
            }
            _ => {}
        }

        let Some(draft) = self.state.detail_mut().and_then(|d| d.draft_mut()) else {
            return false;
        };
        match key.code {
            KeyCode::Enter => draft.insert_newline(),
            KeyCode::Backspace => {
                draft.backspace();
            }
            KeyCode::Delete => {
                draft.delete();
            }
            KeyCode::Left => {
                draft.move_left();
            }
            KeyCode::Right => {
                draft.move_right();
            }
            KeyCode::Home => {
                draft.move_home();
            }
            KeyCode::End => {
                draft.move_end();
            }
            KeyCode::Char(ch)
                if !key.modifiers.intersects(KeyModifiers::ALT | KeyModifiers::SUPER) =>
            {
                draft.insert_char(ch)
            }
            _ => {}
        }
        true
    }

    fn close_composer(&mut self) {
        let discarded = self
            .state
            .detail_mut()
            .and_then(|detail| detail.discard_draft());
        if self.state.screen == Screen::ComposeTab {
            self.state.screen = Screen::Detail;
        }
        self.state.focus = FocusPane::Thread;
        let message = match discarded {
            Some(draft) if !draft.is_blank() => "Draft discarded",
            _ => "Composer closed",
        };
        self.state.set_status_message(Some(message));
    }

    fn send_reply(&mut self) {
        let date = format_reply_date(OffsetDateTime::now_utc());
        let Some(detail) = self.state.detail_mut() else {
            return;
        };
        match detail.send_reply(date) {
            Some(id) => {
                if self.state.screen == Screen::ComposeTab {
                    self.state.screen = Screen::Detail;
                }
                self.state.focus = FocusPane::Thread;
                self.render.history.keep_visible(id);
                self.state.set_status_message(None::<String>);
                self.state
                    .toasts
                    .notify("Reply added", "Your reply was added to the conversation.");
            }
            None => {
                self.state
                    .set_status_message(Some("Reply is empty; type something first"));
            }
        }
    }
}

fn format_reply_date(now: OffsetDateTime) -> String {
    now.format(format_description!(
        "[month repr:short] [day padding:none], [year]"
    ))
    .unwrap_or_else(|_| now.date().to_string())
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode().context("enabling raw mode")?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)
        .context("switching to alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("creating terminal backend")?;
    terminal.hide_cursor().context("hiding cursor")?;
    Ok(terminal)
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    terminal.show_cursor().ok();
    disable_raw_mode().context("disabling raw mode")?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )
    .context("restoring screen state")?;
    Ok(())
}
