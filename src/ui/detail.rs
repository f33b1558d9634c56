use std::time::Instant;

use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use ratatui::Frame;
use strum::IntoEnumIterator;
use unicode_width::UnicodeWidthStr;

use crate::app::state::{AppState, FocusPane, Screen};
use crate::compose::{ComposePlacement, ReplyDraft};
use crate::config::themes::Palette;
use crate::detail::{ComposeAffordance, LetterDetail, Viewport};
use crate::highlight::FindPattern;

use super::history::{draw_history, HistoryScroll, HistoryStyle};
use super::{centered_rect, highlight_line, wrap_text};

pub(super) fn draw_detail(
    frame: &mut Frame,
    area: Rect,
    state: &AppState,
    detail: &LetterDetail,
    scroll: &mut HistoryScroll,
    palette: &Palette,
) {
    let pattern = FindPattern::new(&state.find.tokens());
    let mut area = area;
    let placement = detail.placement();

    if let (ComposePlacement::NewTab, Some(draft)) = (placement, detail.draft()) {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(1), Constraint::Min(3)])
            .split(area);
        draw_tab_strip(frame, rows[0], state.screen, draft, palette);
        area = rows[1];
        if state.screen == Screen::ComposeTab {
            draw_composer(frame, area, draft, placement, true, palette);
            return;
        }
    }

    match (placement, detail.draft()) {
        (ComposePlacement::SideBySide, Some(draft)) => {
            let columns = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
                .split(area);
            draw_thread(frame, columns[0], state, detail, pattern.as_ref(), scroll, palette);
            let focused = state.focus == FocusPane::Composer;
            draw_composer(frame, columns[1], draft, placement, focused, palette);
        }
        (ComposePlacement::Overlay, Some(draft)) => {
            draw_thread(frame, area, state, detail, pattern.as_ref(), scroll, palette);
            let popup = centered_rect(70, 50, area);
            frame.render_widget(Clear, popup);
            let focused = state.focus == FocusPane::Composer;
            draw_composer(frame, popup, draft, placement, focused, palette);
        }
        _ => draw_thread(frame, area, state, detail, pattern.as_ref(), scroll, palette),
    }
}

fn draw_tab_strip(
    frame: &mut Frame,
    area: Rect,
    screen: Screen,
    draft: &ReplyDraft,
    palette: &Palette,
) {
    let selected = Style::default()
        .fg(Color::Black)
        .bg(palette.accent)
        .add_modifier(Modifier::BOLD);
    let idle = Style::default().fg(palette.muted);
    let (letter_style, reply_style) = if screen == Screen::ComposeTab {
        (idle, selected)
    } else {
        (selected, idle)
    };
    let line = Line::from(vec![
        Span::styled(" Letter ", letter_style),
        Span::raw(" "),
        Span::styled(format!(" Reply to {} ", draft.recipient()), reply_style),
        Span::styled("  Tab switches", idle),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

fn draw_thread(
    frame: &mut Frame,
    area: Rect,
    state: &AppState,
    detail: &LetterDetail,
    pattern: Option<&FindPattern>,
    scroll: &mut HistoryScroll,
    palette: &Palette,
) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(5), Constraint::Min(3)])
        .split(area);

    let affordance = detail.compose_affordance(state.viewport.as_ref().map(|v| v as &dyn Viewport));
    let header = Paragraph::new(header_lines(detail, affordance, palette)).block(
        Block::default()
            .title(format!("Letter from {}", detail.letter().sender.display_name()))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(palette.accent)),
    );
    frame.render_widget(header, rows[0]);

    let now = Instant::now();
    match detail.history() {
        Some(history) => {
            let flashing = detail
                .active_quote()
                .filter(|id| detail.is_quote_highlighted(id, now));
            let style = HistoryStyle {
                palette,
                pattern,
                flashing,
            };
            draw_history(frame, rows[1], &history, &style, scroll);
        }
        None => {
            let block = Block::default()
                .title("Letter")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(palette.muted));
            let inner = block.inner(rows[1]);
            let find_style = Style::default()
                .fg(palette.favorite)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED);
            let lines: Vec<Line> = wrap_text(&detail.letter().content, usize::from(inner.width))
                .iter()
                .map(|row| Line::from(highlight_line(row, pattern, find_style, Style::default())))
                .collect();
            frame.render_widget(Paragraph::new(lines).block(block), rows[1]);
        }
    }

    if affordance == ComposeAffordance::Floating && detail.draft().is_none() {
        draw_floating_compose(frame, area, palette);
    }
}

fn header_lines(
    detail: &LetterDetail,
    affordance: ComposeAffordance,
    palette: &Palette,
) -> Vec<Line<'static>> {
    let letter = detail.letter();
    let star = if detail.favorite().is_marked() {
        Span::styled(
            "★ ",
            Style::default()
                .fg(palette.favorite)
                .add_modifier(Modifier::BOLD),
        )
    } else {
        Span::styled("☆ ", Style::default().fg(palette.muted))
    };
    let title = Line::from(vec![
        star,
        Span::styled(
            letter.sender.display_name().to_string(),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!("  {} · {}", letter.date, letter.timestamp),
            Style::default().fg(palette.muted),
        ),
    ]);

    let mut meta = Vec::new();
    if letter.is_unread() {
        meta.push(Span::styled("[unread] ", Style::default().fg(palette.accent)));
    }
    if letter.has_attachments() {
        meta.push(Span::styled(
            "[attachments] ",
            Style::default().fg(palette.muted),
        ));
    }
    if affordance == ComposeAffordance::Inline {
        meta.push(Span::styled(
            "[c] Compose reply",
            Style::default()
                .fg(palette.accent)
                .add_modifier(Modifier::BOLD),
        ));
    }

    vec![title, Line::from(meta), placement_selector(detail.placement(), palette)]
}

fn placement_selector(current: ComposePlacement, palette: &Palette) -> Line<'static> {
    let mut spans = vec![Span::styled(
        "Compose in: ",
        Style::default().fg(palette.muted),
    )];
    for mode in ComposePlacement::iter() {
        let style = if mode == current {
            Style::default()
                .fg(Color::Black)
                .bg(palette.accent)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(palette.muted)
        };
        spans.push(Span::styled(
            format!(" {} {} ", mode.shortcut(), mode.label()),
            style,
        ));
        spans.push(Span::raw(" "));
    }
    spans.push(Span::styled(
        current.hint(),
        Style::default()
            .fg(palette.muted)
            .add_modifier(Modifier::ITALIC),
    ));
    Line::from(spans)
}

fn draw_floating_compose(frame: &mut Frame, area: Rect, palette: &Palette) {
    let width = 13.min(area.width);
    let height = 3.min(area.height);
    let badge = Rect {
        x: area.x + area.width.saturating_sub(width + 1),
        y: area.y + area.height.saturating_sub(height),
        width,
        height,
    };
    frame.render_widget(Clear, badge);
    let paragraph = Paragraph::new(Line::from(Span::styled(
        " ✎ c Reply",
        Style::default()
            .fg(palette.accent)
            .add_modifier(Modifier::BOLD),
    )))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(palette.accent)),
    );
    frame.render_widget(paragraph, badge);
}

pub(super) fn draw_composer(
    frame: &mut Frame,
    area: Rect,
    draft: &ReplyDraft,
    placement: ComposePlacement,
    focused: bool,
    palette: &Palette,
) {
    let border = if focused { palette.accent } else { palette.muted };
    let block = Block::default()
        .title(format!(
            "Reply to {} · {} · letter {}",
            draft.recipient(),
            placement.label(),
            draft.letter_id()
        ))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border));
    let inner = block.inner(area);
    frame.render_widget(block, area);
    if inner.height == 0 || inner.width == 0 {
        return;
    }

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(1)])
        .split(inner);

    let (line, _) = draft.cursor_position();
    let visible = usize::from(rows[0].height.max(1));
    let scroll = line.saturating_sub(visible - 1);

    let body = if draft.body().is_empty() {
        Paragraph::new(Line::from(Span::styled(
            "Write your reply…",
            Style::default()
                .fg(palette.muted)
                .add_modifier(Modifier::ITALIC),
        )))
    } else {
        let lines: Vec<Line> = draft.body().split('\n').map(Line::from).collect();
        Paragraph::new(lines).scroll((u16::try_from(scroll).unwrap_or(u16::MAX), 0))
    };
    frame.render_widget(body, rows[0]);

    frame.render_widget(
        Paragraph::new(Line::from(Span::styled(
            "Ctrl-s send • Esc discard • Ctrl-z/y undo/redo • F1-F3 placement",
            Style::default().fg(Color::DarkGray),
        ))),
        rows[1],
    );

    if focused {
        let body = draft.body();
        let cursor = draft.cursor().min(body.len());
        let line_start = body[..cursor].rfind('\n').map_or(0, |idx| idx + 1);
        let col = UnicodeWidthStr::width(&body[line_start..cursor]);
        let max_col = usize::from(rows[0].width.saturating_sub(1));
        let x = rows[0].x + u16::try_from(col.min(max_col)).unwrap_or(0);
        let y = rows[0].y + u16::try_from(line - scroll).unwrap_or(0);
        frame.set_cursor(x, y);
    }
}
