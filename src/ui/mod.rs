use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap};
use ratatui::Frame;
use time::{macros::format_description, OffsetDateTime};
use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

use crate::app::state::{AppState, FocusPane, OverlayState, Screen, Toast};
use crate::config::themes::Palette;
use crate::detail::NotFound;
use crate::highlight::FindPattern;

mod detail;
mod history;

pub use history::HistoryScroll;

/// Widget state that survives between frames.
#[derive(Debug, Default)]
pub struct RenderState {
    pub inbox: ListState,
    pub history: HistoryScroll,
}

pub fn draw_app(frame: &mut Frame, state: &AppState, render: &mut RenderState, palette: &Palette) {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(2)])
        .split(frame.size());

    match state.screen {
        Screen::Inbox => draw_inbox(frame, vertical[0], state, &mut render.inbox, palette),
        Screen::NotFound => draw_not_found(frame, vertical[0], state, palette),
        Screen::Detail | Screen::ComposeTab => {
            if let Some(detail) = state.detail() {
                detail::draw_detail(
                    frame,
                    vertical[0],
                    state,
                    detail,
                    &mut render.history,
                    palette,
                );
            }
        }
    }

    let status = Paragraph::new(build_status_line(state)).style(Style::default().fg(Color::Gray));
    frame.render_widget(status, vertical[1]);

    render_overlay(frame, state, palette);
    render_toasts(frame, state.toasts.items(), palette);
}

fn draw_inbox(
    frame: &mut Frame,
    area: Rect,
    state: &AppState,
    list_state: &mut ListState,
    palette: &Palette,
) {
    let inbox = state.inbox();
    let mut items = Vec::with_capacity(inbox.len());
    for letter in &inbox {
        let mut title = Vec::new();
        if letter.is_unread() {
            title.push(Span::styled("● ", Style::default().fg(palette.accent)));
        } else {
            title.push(Span::raw("  "));
        }
        title.push(Span::styled(
            letter.sender.display_name().to_string(),
            Style::default().add_modifier(Modifier::BOLD),
        ));
        title.push(Span::styled(
            format!("  {}", letter.timestamp),
            Style::default().fg(palette.muted),
        ));
        if letter.has_attachments() {
            title.push(Span::styled(
                " [attachments]",
                Style::default().fg(palette.muted),
            ));
        }
        let preview = Line::from(Span::styled(
            format!("  {}", letter.preview),
            Style::default().fg(palette.muted),
        ));
        items.push(ListItem::new(vec![Line::from(title), preview]));
    }
    if items.is_empty() {
        items.push(ListItem::new("No letters. Deleted conversations stay hidden until restart."));
        list_state.select(None);
    } else {
        list_state.select(Some(state.selected.min(inbox.len() - 1)));
    }

    let list = List::new(items)
        .block(
            Block::default()
                .title(format!("Inbox ({})", inbox.len()))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(palette.accent)),
        )
        .highlight_style(
            Style::default()
                .bg(palette.accent)
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("▸ ");
    frame.render_stateful_widget(list, area, list_state);
}

fn draw_not_found(frame: &mut Frame, area: Rect, state: &AppState, palette: &Palette) {
    let requested = state
        .not_found()
        .map(|missing| missing.requested.to_string())
        .unwrap_or_default();
    let panel = centered_rect(60, 40, area);
    frame.render_widget(Clear, panel);
    let paragraph = Paragraph::new(vec![
        Line::from(Span::styled(
            NotFound::TITLE,
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(NotFound::DESCRIPTION),
        Line::from(""),
        Line::from(Span::styled(
            "Press b or Esc to return to the inbox",
            Style::default().fg(palette.muted),
        )),
    ])
    .block(
        Block::default()
            .title(format!("/letter/{requested}"))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(palette.danger)),
    )
    .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, panel);
}

fn build_status_line(state: &AppState) -> Text<'static> {
    let mut spans = Vec::new();
    match state.screen {
        Screen::Inbox => {
            let inbox = state.inbox();
            let unread = inbox.iter().filter(|letter| letter.is_unread()).count();
            spans.push(Span::raw(format!("Letters: {} ", inbox.len())));
            spans.push(Span::raw(" | Unread: "));
            spans.push(Span::styled(
                unread.to_string(),
                Style::default().add_modifier(Modifier::BOLD),
            ));
        }
        Screen::NotFound => spans.push(Span::raw("Letter not found")),
        Screen::Detail | Screen::ComposeTab => {
            if let Some(detail) = state.detail() {
                spans.push(Span::raw(format!(
                    "Letter {} | Messages: {} | Placement: ",
                    detail.letter().id,
                    detail.conversation().len()
                )));
                spans.push(Span::styled(
                    detail.placement().label(),
                    Style::default().add_modifier(Modifier::BOLD),
                ));
                let focus = match state.focus {
                    FocusPane::Thread => "Thread",
                    FocusPane::Composer => "Composer",
                };
                spans.push(Span::raw(" | Focus: "));
                spans.push(Span::styled(
                    focus,
                    Style::default().add_modifier(Modifier::BOLD),
                ));
                if state.find.active || !state.find.query.is_empty() {
                    let matches = FindPattern::new(&state.find.tokens())
                        .map(|pattern| pattern.matching_messages(detail.conversation()).len())
                        .unwrap_or(0);
                    let cursor = if state.find.active { "▌" } else { "" };
                    spans.push(Span::raw(" | Find: "));
                    spans.push(Span::styled(
                        format!("{}{cursor} ({matches} matching)", state.find.query),
                        Style::default().fg(Color::Yellow),
                    ));
                }
            }
        }
    }

    if let Some(message) = &state.status_message {
        spans.push(Span::raw(" | "));
        spans.push(Span::styled(
            message.clone(),
            Style::default().fg(Color::Cyan),
        ));
    }

    let keys = match state.screen {
        Screen::Inbox => "j/k move • Enter open • q quit",
        Screen::NotFound => "b/Esc back to inbox • q quit",
        Screen::Detail => {
            "f favorite • c compose • 1/2/3 placement • e expand • j/k move • Enter follow quote • d delete • / find • b back"
        }
        Screen::ComposeTab => "Tab letter • Ctrl-s send • Esc discard • F1-F3 placement",
    };
    Text::from(vec![
        Line::from(spans),
        Line::from(vec![
            Span::styled(
                "Keys: ",
                Style::default()
                    .fg(Color::Gray)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(keys, Style::default().fg(Color::DarkGray)),
        ]),
    ])
}

fn render_overlay(frame: &mut Frame, state: &AppState, palette: &Palette) {
    match &state.overlay {
        Some(OverlayState::ConfirmDelete(confirm)) => {
            let area = centered_rect(60, 30, frame.size());
            frame.render_widget(Clear, area);
            let paragraph = Paragraph::new(vec![
                Line::from(Span::styled(
                    "Delete conversation",
                    Style::default().add_modifier(Modifier::BOLD),
                )),
                Line::from(""),
                Line::from(format!(
                    "Permanently remove all {} letters with {}?",
                    confirm.messages, confirm.sender
                )),
                Line::from(Span::styled(
                    "This cannot be undone.",
                    Style::default().fg(palette.danger),
                )),
                Line::from(""),
                Line::from(Span::styled(
                    "Enter to confirm • Esc to cancel",
                    Style::default().fg(Color::Gray),
                )),
            ])
            .block(
                Block::default()
                    .title(format!("Confirm Delete ({})", confirm.letter_id))
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(palette.danger)),
            )
            .wrap(Wrap { trim: false });
            frame.render_widget(paragraph, area);
        }
        None => {}
    }
}

fn render_toasts(frame: &mut Frame, toasts: &[Toast], palette: &Palette) {
    let area = frame.size();
    let width = 44.min(area.width);
    let mut y = area.y;
    for toast in toasts.iter().rev() {
        let height = 4;
        if y + height > area.y + area.height {
            break;
        }
        let rect = Rect {
            x: area.x + area.width - width,
            y,
            width,
            height,
        };
        frame.render_widget(Clear, rect);
        let paragraph = Paragraph::new(vec![
            Line::from(Span::styled(
                toast.title.clone(),
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(
                toast.description.clone(),
                Style::default().fg(palette.muted),
            )),
        ])
        .block(
            Block::default()
                .title(format_time_short(toast.shown_at))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(palette.accent)),
        );
        frame.render_widget(paragraph, rect);
        y += height;
    }
}

fn format_time_short(dt: OffsetDateTime) -> String {
    dt.format(&format_description!("[hour]:[minute]:[second]"))
        .unwrap_or_else(|_| dt.unix_timestamp().to_string())
}

fn highlight_line(
    text: &str,
    pattern: Option<&FindPattern>,
    highlight_style: Style,
    base_style: Style,
) -> Vec<Span<'static>> {
    match pattern {
        Some(pattern) => pattern
            .segments(text)
            .into_iter()
            .map(|(segment, matched)| {
                let style = if matched { highlight_style } else { base_style };
                Span::styled(segment.to_string(), style)
            })
            .collect(),
        None => vec![Span::styled(text.to_string(), base_style)],
    }
}

/// Greedy word wrap by display width. Words wider than a row are split
/// on grapheme boundaries.
fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut rows = Vec::new();
    for paragraph in text.split('\n') {
        let mut row = String::new();
        let mut row_width = 0;
        for word in paragraph.split_whitespace() {
            let word_width = UnicodeWidthStr::width(word);
            if row_width > 0 && row_width + 1 + word_width > width {
                rows.push(std::mem::take(&mut row));
                row_width = 0;
            }
            if word_width > width {
                for grapheme in word.graphemes(true) {
                    let glyph = UnicodeWidthStr::width(grapheme);
                    if row_width > 0 && row_width + glyph > width {
                        rows.push(std::mem::take(&mut row));
                        row_width = 0;
                    }
                    row.push_str(grapheme);
                    row_width += glyph;
                }
                continue;
            }
            if row_width > 0 {
                row.push(' ');
                row_width += 1;
            }
            row.push_str(word);
            row_width += word_width;
        }
        rows.push(row);
    }
    rows
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    use super::*;
    use crate::app::state::ConfirmDeleteOverlay;
    use crate::compose::ComposePlacement;
    use crate::config::themes::ThemeRegistry;
    use crate::config::ThemeName;
    use crate::detail::{DetailOptions, DetailView, Notifier, TerminalViewport};
    use crate::store::{LetterStore, MemoryStore};

    fn render(state: &AppState) -> String {
        let backend = TestBackend::new(120, 40);
        let mut terminal = Terminal::new(backend).expect("terminal");
        let palette = ThemeRegistry::default().palette(ThemeName::Dark);
        let mut render = RenderState::default();
        terminal
            .draw(|frame| draw_app(frame, state, &mut render, &palette))
            .expect("draw");
        let buffer = terminal.backend().buffer();
        let width = usize::from(buffer.area.width);
        buffer
            .content
            .chunks(width)
            .map(|row| row.iter().map(|cell| cell.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn detail_state(placement: ComposePlacement) -> AppState {
        let store = MemoryStore::sample();
        let mut state = AppState::new(store.letters(), Duration::from_secs(5));
        let options = DetailOptions {
            placement,
            ..DetailOptions::default()
        };
        state.show_view(DetailView::open(&store, &"1".into(), &options));
        state
    }

    #[test]
    fn inbox_lists_sender_and_preview() {
        let store = MemoryStore::sample();
        let state = AppState::new(store.letters(), Duration::from_secs(5));
        let screen = render(&state);
        assert!(screen.contains("Inbox (1)"));
        assert!(screen.contains("Emily Chen"));
        assert!(screen.contains("recent trip to Japan"));
    }

    #[test]
    fn detail_shows_selector_and_history() {
        let state = detail_state(ComposePlacement::SideBySide);
        let screen = render(&state);
        assert!(screen.contains("Letter from Emily Chen"));
        assert!(screen.contains("1 Overlay"));
        assert!(screen.contains("2 Side by Side"));
        assert!(screen.contains("3 New Tab"));
        assert!(screen.contains("Show draft and conversation side by side"));
        assert!(screen.contains("Conversation (4 letters)"));
        assert!(screen.contains("● current"));
        assert!(screen.contains("[c] Compose reply"));
    }

    #[test]
    fn side_by_side_composer_sits_next_to_thread() {
        let mut state = detail_state(ComposePlacement::SideBySide);
        if let Some(detail) = state.detail_mut() {
            detail.open_composer();
        }
        let screen = render(&state);
        assert!(screen.contains("Reply to Emily Chen · Side by Side"));
        assert!(screen.contains("Conversation (4 letters)"));
    }

    #[test]
    fn new_tab_composer_replaces_thread() {
        let mut state = detail_state(ComposePlacement::NewTab);
        if let Some(detail) = state.detail_mut() {
            detail.open_composer();
        }
        state.screen = Screen::ComposeTab;
        let screen = render(&state);
        assert!(screen.contains("Reply to Emily Chen · New Tab · letter 1"));
        assert!(!screen.contains("Conversation (4 letters)"));
    }

    #[test]
    fn handheld_terminal_gets_floating_reply_badge() {
        let mut state = detail_state(ComposePlacement::Overlay);
        state.viewport = Some(TerminalViewport::new(60, 80));
        let screen = render(&state);
        assert!(screen.contains("✎ c Reply"));
        assert!(!screen.contains("[c] Compose reply"));

        state.viewport = Some(TerminalViewport::new(120, 80));
        let screen = render(&state);
        assert!(!screen.contains("✎ c Reply"));
        assert!(screen.contains("[c] Compose reply"));
    }

    #[test]
    fn not_found_panel_offers_the_way_back() {
        let store = MemoryStore::sample();
        let mut state = AppState::new(store.letters(), Duration::from_secs(5));
        state.show_view(DetailView::open(&store, &"404".into(), &DetailOptions::default()));
        let screen = render(&state);
        assert!(screen.contains(NotFound::TITLE));
        assert!(screen.contains("return to the inbox"));
    }

    #[test]
    fn delete_confirmation_and_toasts_draw_on_top() {
        let mut state = detail_state(ComposePlacement::Overlay);
        state.overlay = Some(OverlayState::ConfirmDelete(ConfirmDeleteOverlay {
            letter_id: "1".into(),
            sender: "Emily Chen".into(),
            messages: 4,
        }));
        state.toasts.notify("Added to favorites", "Letter added to your favorites");
        let screen = render(&state);
        assert!(screen.contains("Permanently remove all 4 letters with Emily Chen?"));
        assert!(screen.contains("Added to favorites"));
    }

    #[test]
    fn wrap_respects_width_and_breaks_long_words() {
        assert_eq!(wrap_text("one two three", 7), vec!["one two", "three"]);
        assert_eq!(wrap_text("abcdefgh", 3), vec!["abc", "def", "gh"]);
        assert_eq!(wrap_text("a\n\nb", 10), vec!["a", "", "b"]);
    }
}
