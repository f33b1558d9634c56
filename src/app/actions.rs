use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::compose::ComposePlacement;

use super::state::Screen;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Quit,
    SelectNext,
    SelectPrevious,
    OpenSelected,
    Back,
    ToggleFavorite,
    Compose,
    SetPlacement(ComposePlacement),
    ToggleExpanded,
    HistoryNext,
    HistoryPrevious,
    FollowQuote,
    DeleteConversation,
    StartFind,
    SwitchTab,
}

fn plain(key: &KeyEvent) -> bool {
    !key.modifiers
        .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT | KeyModifiers::SUPER)
}

/// Placement keys that also work while typing in the composer.
pub fn placement_function_key(key: &KeyEvent) -> Option<ComposePlacement> {
    match key.code {
        KeyCode::F(1) => Some(ComposePlacement::Overlay),
        KeyCode::F(2) => Some(ComposePlacement::SideBySide),
        KeyCode::F(3) => Some(ComposePlacement::NewTab),
        _ => None,
    }
}

pub fn map_key(screen: Screen, key: &KeyEvent) -> Option<Action> {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return Some(Action::Quit);
    }
    if let Some(mode) = placement_function_key(key) {
        return matches!(screen, Screen::Detail | Screen::ComposeTab)
            .then_some(Action::SetPlacement(mode));
    }
    match screen {
        Screen::Inbox => match key.code {
            KeyCode::Char('q') if plain(key) => Some(Action::Quit),
            KeyCode::Char('j') | KeyCode::Down => Some(Action::SelectNext),
            KeyCode::Char('k') | KeyCode::Up => Some(Action::SelectPrevious),
            KeyCode::Enter => Some(Action::OpenSelected),
            _ => None,
        },
        Screen::NotFound => match key.code {
            KeyCode::Char('q') if plain(key) => Some(Action::Quit),
            KeyCode::Char('b') | KeyCode::Esc | KeyCode::Enter => Some(Action::Back),
            _ => None,
        },
        Screen::Detail => match key.code {
            KeyCode::Char('q') if plain(key) => Some(Action::Quit),
            KeyCode::Char('b') | KeyCode::Esc => Some(Action::Back),
            KeyCode::Char('f') if plain(key) => Some(Action::ToggleFavorite),
            KeyCode::Char('c') if plain(key) => Some(Action::Compose),
            KeyCode::Char('e') if plain(key) => Some(Action::ToggleExpanded),
            KeyCode::Char('j') | KeyCode::Down => Some(Action::HistoryNext),
            KeyCode::Char('k') | KeyCode::Up => Some(Action::HistoryPrevious),
            KeyCode::Enter => Some(Action::FollowQuote),
            KeyCode::Char('d') if plain(key) => Some(Action::DeleteConversation),
            KeyCode::Char('/') if plain(key) => Some(Action::StartFind),
            KeyCode::Tab => Some(Action::SwitchTab),
            KeyCode::Char(ch) if plain(key) => {
                ComposePlacement::from_shortcut(ch).map(Action::SetPlacement)
            }
            _ => None,
        },
        Screen::ComposeTab => match key.code {
            KeyCode::Tab => Some(Action::SwitchTab),
            _ => None,
        },
    }
}
