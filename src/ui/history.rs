use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

use crate::config::themes::Palette;
use crate::highlight::FindPattern;
use crate::model::MessageId;
use crate::thread::{ConversationHistory, HistoryEntry};

use super::{highlight_line, wrap_text};

const GUTTER: &str = "┃ ";
const GUTTER_WIDTH: u16 = 2;

#[derive(Debug, Clone, PartialEq, Eq)]
enum ScrollTarget {
    /// Pin the entry to the top of the pane (quote jumps).
    Top(MessageId),
    /// Scroll only as far as needed to show the entry header.
    Visible(MessageId),
}

/// Scroll position of the history pane, kept across frames.
#[derive(Debug, Clone, Default)]
pub struct HistoryScroll {
    offset: u16,
    target: Option<ScrollTarget>,
}

impl HistoryScroll {
    pub fn offset(&self) -> u16 {
        self.offset
    }

    pub fn reset(&mut self) {
        self.offset = 0;
        self.target = None;
    }

    pub fn scroll_to(&mut self, id: MessageId) {
        self.target = Some(ScrollTarget::Top(id));
    }

    pub fn keep_visible(&mut self, id: MessageId) {
        self.target = Some(ScrollTarget::Visible(id));
    }

    fn resolve(&mut self, layout: &HistoryLayout, height: u16) {
        let height = usize::from(height.max(1));
        let mut offset = usize::from(self.offset);
        match self.target.take() {
            Some(ScrollTarget::Top(id)) => {
                if let Some(range) = layout.range_of(&id) {
                    offset = range.start;
                }
            }
            Some(ScrollTarget::Visible(id)) => {
                if let Some(range) = layout.range_of(&id) {
                    if range.start < offset {
                        offset = range.start;
                    } else if range.end > offset + height {
                        offset = (range.end - height).min(range.start);
                    }
                }
            }
            None => {}
        }
        let max_offset = layout.lines.len().saturating_sub(height);
        self.offset = u16::try_from(offset.min(max_offset)).unwrap_or(u16::MAX);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct EntryRows {
    id: MessageId,
    start: usize,
    end: usize,
}

/// Pre-wrapped history lines plus the row span of every entry.
#[derive(Debug, Clone, Default)]
pub struct HistoryLayout {
    pub lines: Vec<Line<'static>>,
    rows: Vec<EntryRows>,
}

impl HistoryLayout {
    pub fn range_of(&self, id: &MessageId) -> Option<std::ops::Range<usize>> {
        self.rows
            .iter()
            .find(|rows| &rows.id == id)
            .map(|rows| rows.start..rows.end)
    }
}

pub struct HistoryStyle<'a> {
    pub palette: &'a Palette,
    pub pattern: Option<&'a FindPattern>,
    /// Entry whose quote-jump highlight is still running
    pub flashing: Option<&'a MessageId>,
}

pub fn layout_history(
    history: &ConversationHistory<'_>,
    width: u16,
    style: &HistoryStyle<'_>,
) -> HistoryLayout {
    let text_width = usize::from(width.saturating_sub(GUTTER_WIDTH).max(1));
    let mut layout = HistoryLayout::default();
    for entry in history.entries() {
        let start = layout.lines.len();
        push_entry(&mut layout.lines, &entry, text_width, style);
        layout.rows.push(EntryRows {
            id: entry.message.id.clone(),
            start,
            end: layout.lines.len(),
        });
        layout.lines.push(Line::from(""));
    }
    layout
}

fn push_entry(
    lines: &mut Vec<Line<'static>>,
    entry: &HistoryEntry<'_>,
    width: usize,
    style: &HistoryStyle<'_>,
) {
    let palette = style.palette;
    let message = entry.message;
    let flashing = style.flashing == Some(&message.id);
    let gutter = if entry.is_active {
        Span::styled(GUTTER, Style::default().fg(palette.active))
    } else {
        Span::raw("  ")
    };

    let mut header = vec![gutter.clone()];
    let marker = if entry.is_selected { "▸ " } else { "  " };
    header.push(Span::styled(
        marker,
        Style::default()
            .fg(palette.accent)
            .add_modifier(Modifier::BOLD),
    ));
    let sender_style = if message.sender.is_you() {
        Style::default().fg(palette.you).add_modifier(Modifier::BOLD)
    } else {
        Style::default().add_modifier(Modifier::BOLD)
    };
    header.push(Span::styled(
        message.sender.display_name().to_string(),
        sender_style,
    ));
    header.push(Span::styled(
        format!(" · {}", message.date),
        Style::default().fg(palette.muted),
    ));
    if message.is_unread() {
        header.push(Span::styled(" [unread]", Style::default().fg(palette.accent)));
    }
    if message.has_attachments() {
        header.push(Span::styled(
            " [attachments]",
            Style::default().fg(palette.muted),
        ));
    }
    if entry.is_active {
        header.push(Span::styled(
            " ● current",
            Style::default()
                .fg(palette.active)
                .add_modifier(Modifier::BOLD),
        ));
    }
    let mut header = Line::from(header);
    if flashing {
        header.style = Style::default().bg(palette.quote_flash).fg(Color::Black);
    }
    lines.push(header);

    if let Some(quote) = &message.quote {
        let source = entry
            .quoted
            .map(|quoted| format!("{} · {}", quoted.sender.display_name(), quoted.date))
            .unwrap_or_else(|| "an earlier letter".to_string());
        let link = format!("↪ quoting {source}: \"{}\"", quote.excerpt);
        let link_style = Style::default()
            .fg(palette.accent)
            .add_modifier(Modifier::ITALIC);
        for row in wrap_text(&link, width) {
            lines.push(body_line(gutter.clone(), &row, style, link_style));
        }
    }

    let text_style = if entry.collapsed {
        Style::default().fg(palette.muted)
    } else {
        Style::default()
    };
    let body = if entry.collapsed {
        message.preview.as_deref().unwrap_or("…")
    } else {
        message.content.as_str()
    };
    for row in wrap_text(body, width) {
        lines.push(body_line(gutter.clone(), &row, style, text_style));
    }
}

fn body_line(
    gutter: Span<'static>,
    text: &str,
    style: &HistoryStyle<'_>,
    base: Style,
) -> Line<'static> {
    let find_style = Style::default()
        .fg(style.palette.favorite)
        .add_modifier(Modifier::BOLD | Modifier::UNDERLINED);
    let mut spans = vec![gutter];
    spans.extend(highlight_line(text, style.pattern, find_style, base));
    Line::from(spans)
}

pub fn draw_history(
    frame: &mut Frame,
    area: Rect,
    history: &ConversationHistory<'_>,
    style: &HistoryStyle<'_>,
    scroll: &mut HistoryScroll,
) {
    let state = history.state();
    let mut title = format!("Conversation ({} letters)", history.len());
    if state.options().expandable {
        let toggle = if state.is_collapsed() {
            " · e expand"
        } else {
            " · e collapse"
        };
        title.push_str(toggle);
    }
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(style.palette.muted));
    let inner = block.inner(area);
    let layout = layout_history(history, inner.width, style);
    scroll.resolve(&layout, inner.height);
    let paragraph = Paragraph::new(layout.lines)
        .block(block)
        .scroll((scroll.offset(), 0));
    frame.render_widget(paragraph, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::themes::ThemeRegistry;
    use crate::config::ThemeName;
    use crate::model::{Message, Sender};
    use crate::thread::{HistoryOptions, HistoryState};
    use unicode_width::UnicodeWidthStr;

    fn row_width(line: &Line<'_>) -> usize {
        line.spans
            .iter()
            .skip(1)
            .map(|span| UnicodeWidthStr::width(span.content.as_ref()))
            .sum()
    }

    fn long_thread() -> Vec<Message> {
        (0..6)
            .map(|i| {
                let body = format!("letter {i} ").repeat(12);
                Message::new(format!("m{i}"), Sender::party("Ada"), body, "May 1")
                    .with_preview(format!("preview {i}"))
            })
            .collect()
    }

    fn layout(conversation: &[Message], state: &HistoryState, width: u16) -> HistoryLayout {
        let palette = ThemeRegistry::default().palette(ThemeName::Dark);
        let style = HistoryStyle {
            palette: &palette,
            pattern: None,
            flashing: None,
        };
        let history = ConversationHistory::new(conversation, None, state);
        layout_history(&history, width, &style)
    }

    #[test]
    fn expanded_rows_fit_the_pane_width() {
        let conversation = long_thread();
        let mut state = HistoryState::new(HistoryOptions::default());
        state.toggle_expanded();
        let layout = layout(&conversation, &state, 30);
        assert!(layout.lines.iter().all(|line| row_width(line) <= 28));
        let first = layout.range_of(&"m0".into()).expect("rows");
        assert!(first.len() > 2);
    }

    #[test]
    fn collapsed_entries_show_header_and_preview_only() {
        let conversation = long_thread();
        let state = HistoryState::new(HistoryOptions::default());
        let layout = layout(&conversation, &state, 60);
        assert_eq!(layout.range_of(&"m3".into()), Some(9..11));
        let preview = &layout.lines[10];
        assert!(preview.spans.iter().any(|span| span.content == "preview 3"));
    }

    #[test]
    fn quote_jump_pins_entry_to_top() {
        let conversation = long_thread();
        let state = HistoryState::new(HistoryOptions::default());
        let layout = layout(&conversation, &state, 60);
        let mut scroll = HistoryScroll::default();
        scroll.scroll_to("m2".into());
        scroll.resolve(&layout, 5);
        assert_eq!(scroll.offset(), 6);

        scroll.keep_visible("m0".into());
        scroll.resolve(&layout, 5);
        assert_eq!(scroll.offset(), 0);

        scroll.scroll_to("missing".into());
        scroll.resolve(&layout, 5);
        assert_eq!(scroll.offset(), 0);
    }

    #[test]
    fn offset_never_runs_past_the_end() {
        let conversation = long_thread();
        let state = HistoryState::new(HistoryOptions::default());
        let layout = layout(&conversation, &state, 60);
        let mut scroll = HistoryScroll::default();
        scroll.scroll_to("m5".into());
        scroll.resolve(&layout, 10);
        assert_eq!(usize::from(scroll.offset()), layout.lines.len() - 10);
    }
}
