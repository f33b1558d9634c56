use std::fmt::Write as _;
use std::sync::Arc;

use anyhow::{bail, Result};
use clap::Args;

use crate::app::App;
use crate::config::AppConfig;
use crate::detail::{DetailOptions, DetailView, LetterDetail};
use crate::model::{Letter, LetterId};
use crate::store::{LetterStore, MemoryStore};
use crate::thread::HistoryOptions;

#[derive(Args, Debug, Clone, Default)]
pub struct TuiArgs {
    /// Open this letter instead of the inbox
    #[arg(long)]
    pub letter: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct ShowArgs {
    /// Letter identifier
    pub id: String,
    /// Print previews instead of full history entries
    #[arg(long)]
    pub collapsed: bool,
}

pub fn run_tui(config: Arc<AppConfig>, store: MemoryStore, args: TuiArgs) -> Result<()> {
    if !atty::is(atty::Stream::Stdout) {
        bail!("the interactive viewer needs a terminal; use `lettertui list` or `lettertui show` instead");
    }
    let mut app = App::new(config, Box::new(store));
    app.run(args.letter.map(LetterId::from))
}

pub fn list_letters(store: &dyn LetterStore) -> Result<()> {
    print!("{}", format_inbox(&store.letters())?);
    Ok(())
}

pub fn show_letter(config: &AppConfig, store: &dyn LetterStore, args: &ShowArgs) -> Result<()> {
    print!("{}", render_letter(config, store, args)?);
    Ok(())
}

fn format_inbox(letters: &[Letter]) -> Result<String> {
    let mut out = String::new();
    if letters.is_empty() {
        writeln!(out, "No letters.")?;
        return Ok(out);
    }
    for letter in letters {
        let marker = if letter.is_unread() { '*' } else { ' ' };
        let attachments = if letter.has_attachments() {
            " [attachments]"
        } else {
            ""
        };
        writeln!(
            out,
            "{marker} {:<6} {:<24} {}{attachments}",
            letter.id,
            letter.sender.display_name(),
            letter.timestamp
        )?;
        writeln!(out, "         {}", letter.preview)?;
    }
    Ok(out)
}

fn render_letter(config: &AppConfig, store: &dyn LetterStore, args: &ShowArgs) -> Result<String> {
    let options = DetailOptions {
        history: HistoryOptions {
            expandable: true,
            start_expanded: !args.collapsed,
            show_compose_button: false,
        },
        highlight_for: config.quotes.highlight_duration(),
        placement: config.compose.default_placement,
    };
    let id = LetterId::from(args.id.as_str());
    match DetailView::open(store, &id, &options) {
        DetailView::NotFound(missing) => bail!("letter {} not found", missing.requested),
        DetailView::Loaded(detail) => format_detail(&detail),
    }
}

fn format_detail(detail: &LetterDetail) -> Result<String> {
    let letter = detail.letter();
    let mut out = String::new();
    writeln!(out, "From: {}", letter.sender.display_name())?;
    writeln!(out, "Date: {} ({})", letter.date, letter.timestamp)?;
    let mut flags = Vec::new();
    if letter.is_unread() {
        flags.push("unread");
    }
    if letter.has_attachments() {
        flags.push("attachments");
    }
    if !flags.is_empty() {
        writeln!(out, "Flags: {}", flags.join(", "))?;
    }
    writeln!(out)?;

    let Some(history) = detail.history() else {
        writeln!(out, "{}", letter.content)?;
        return Ok(out);
    };

    writeln!(out, "Conversation ({} letters)", history.len())?;
    for entry in history.entries() {
        let message = entry.message;
        let current = if entry.is_active { " (current)" } else { "" };
        writeln!(out)?;
        writeln!(
            out,
            "[{}] {} · {}{current}",
            message.id,
            message.sender.display_name(),
            message.date
        )?;
        if let Some(quote) = &message.quote {
            let source = entry
                .quoted
                .map(|quoted| format!("{} · {}", quoted.sender.display_name(), quoted.date))
                .unwrap_or_else(|| "an earlier letter".to_string());
            writeln!(out, "  ↪ quoting {source}: \"{}\"", quote.excerpt)?;
        }
        if entry.collapsed {
            writeln!(out, "  {}", message.preview.as_deref().unwrap_or("…"))?;
        } else {
            for line in message.content.lines() {
                writeln!(out, "  {line}")?;
            }
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn show(id: &str, collapsed: bool) -> Result<String> {
        let store = MemoryStore::sample();
        let args = ShowArgs {
            id: id.into(),
            collapsed,
        };
        render_letter(&AppConfig::default(), &store, &args)
    }

    #[test]
    fn inbox_lists_each_letter_with_preview() -> Result<()> {
        let store = MemoryStore::sample();
        let out = format_inbox(&store.letters())?;
        assert!(out.starts_with("* 1"));
        assert!(out.contains("Emily Chen"));
        assert!(out.contains("[attachments]"));
        assert!(out.contains("recent trip to Japan"));
        assert_eq!(format_inbox(&[])?, "No letters.\n");
        Ok(())
    }

    #[test]
    fn collapsed_show_prints_previews_and_quote_links() -> Result<()> {
        let out = show("1", true)?;
        assert!(out.contains("Conversation (4 letters)"));
        assert!(out.contains("  Japan is one of my favorite places in the world..."));
        assert!(out.contains("↪ quoting You · May 1, 2023"));
        assert!(out.contains("[1] Emily Chen · May 15, 2023 (current)"));
        assert!(!out.contains("Looking forward to your insights"));
        Ok(())
    }

    #[test]
    fn expanded_show_prints_full_bodies() -> Result<()> {
        let out = show("1", false)?;
        assert!(out.contains("  Looking forward to your insights,"));
        Ok(())
    }

    #[test]
    fn unknown_letter_is_an_error() {
        let err = show("404", false).expect_err("missing letter");
        assert_eq!(err.to_string(), "letter 404 not found");
    }
}
