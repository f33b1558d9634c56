use std::fmt;

use crate::model::LetterId;

/// Fire-and-forget user acknowledgments.
pub trait Notifier {
    fn notify(&mut self, title: &str, description: &str);
}

pub trait Navigator {
    fn go_to(&mut self, route: Route);
}

/// Answers whether the current display counts as handheld.
pub trait Viewport {
    fn is_handheld(&self) -> bool;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Dashboard,
    Letter(LetterId),
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Route::Dashboard => f.write_str("/dashboard"),
            Route::Letter(id) => write!(f, "/letter/{id}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TerminalViewport {
    pub columns: u16,
    pub handheld_max_columns: u16,
}

impl TerminalViewport {
    pub fn new(columns: u16, handheld_max_columns: u16) -> Self {
        Self {
            columns,
            handheld_max_columns,
        }
    }
}

impl Viewport for TerminalViewport {
    fn is_handheld(&self) -> bool {
        self.columns < self.handheld_max_columns
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn routes_render_as_paths() {
        assert_eq!(Route::Dashboard.to_string(), "/dashboard");
        assert_eq!(Route::Letter("1".into()).to_string(), "/letter/1");
    }

    #[test]
    fn narrow_terminals_are_handheld() {
        assert!(TerminalViewport::new(60, 80).is_handheld());
        assert!(!TerminalViewport::new(80, 80).is_handheld());
        assert!(!TerminalViewport::new(200, 80).is_handheld());
    }
}
