//! Terminal output styling.
//!
//! Uses the anstream/anstyle pair: anstream auto-detects color support
//! (`NO_COLOR`, `CLICOLOR_FORCE`, TTY-ness) and anstyle composes the styles
//! applied on top of it.

use anstyle::{AnsiColor, Color, Style};

/// Auto-detecting println that respects NO_COLOR, CLICOLOR_FORCE, and terminal capabilities.
pub use anstream::println;
/// Auto-detecting eprintln, see [`println`].
pub use anstream::eprintln;

pub const ERROR: Style = Style::new().fg_color(Some(Color::Ansi(AnsiColor::Red)));
pub const ERROR_BOLD: Style = Style::new()
    .bold()
    .fg_color(Some(Color::Ansi(AnsiColor::Red)));
pub const WARNING: Style = Style::new().fg_color(Some(Color::Ansi(AnsiColor::Yellow)));
pub const HINT: Style = Style::new().dimmed();
pub const HINT_BOLD: Style = Style::new().bold().dimmed();
pub const SUCCESS: Style = Style::new().fg_color(Some(Color::Ansi(AnsiColor::Green)));

pub const ERROR_EMOJI: &str = "❌";
pub const WARNING_EMOJI: &str = "🟡";
pub const HINT_EMOJI: &str = "💡";
pub const SUCCESS_EMOJI: &str = "✅";
pub const PROMPT_EMOJI: &str = "❓";

/// A piece of text with an optional style.
#[derive(Clone, Debug)]
pub struct StyledString {
    pub text: String,
    pub style: Option<Style>,
}

impl StyledString {
    pub fn raw(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            style: None,
        }
    }

    pub fn styled(text: impl Into<String>, style: Style) -> Self {
        Self {
            text: text.into(),
            style: Some(style),
        }
    }

    pub fn render(&self) -> String {
        match &self.style {
            Some(style) => format!("{}{}{}", style.render(), self.text, style.render_reset()),
            None => self.text.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_string_renders_unstyled() {
        let s = StyledString::raw("hello");
        assert_eq!(s.render(), "hello");
    }

    #[test]
    fn styled_string_wraps_in_escapes() {
        let s = StyledString::styled("hi", ERROR);
        let rendered = s.render();
        assert!(rendered.contains("hi"));
        assert_ne!(rendered, "hi");
    }
}
