//! Terminal formatting
//!
//! Colors come from `colored`. Whether they are emitted is decided once, up
//! front, by a `RenderConfig` handed to whoever renders.

use colored::{ColoredString, Colorize};
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::finding::{Severity, StatusLine};

/// When to emit colors
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorMode {
    /// Follow `NO_COLOR` and `TERM`
    #[default]
    Auto,
    Always,
    Never,
}

impl std::str::FromStr for ColorMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "auto" => Ok(ColorMode::Auto),
            "always" => Ok(ColorMode::Always),
            "never" => Ok(ColorMode::Never),
            other => Err(format!(
                "invalid color mode {:?}, expected auto, always or never",
                other
            )),
        }
    }
}

impl std::fmt::Display for ColorMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let word = match self {
            ColorMode::Auto => "auto",
            ColorMode::Always => "always",
            ColorMode::Never => "never",
        };
        f.write_str(word)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RenderConfig {
    pub color_enabled: bool,
}

impl RenderConfig {
    pub fn plain() -> Self {
        Self {
            color_enabled: false,
        }
    }

    pub fn colored() -> Self {
        Self {
            color_enabled: true,
        }
    }

    /// Colors unless `NO_COLOR` is set or `TERM` is `dumb`
    pub fn from_env() -> Self {
        let no_color = std::env::var_os("NO_COLOR").is_some();
        let term = std::env::var("TERM").ok();
        Self::from_env_values(no_color, term.as_deref())
    }

    fn from_env_values(no_color: bool, term: Option<&str>) -> Self {
        Self {
            color_enabled: !no_color && term != Some("dumb"),
        }
    }

    pub fn from_mode(mode: ColorMode) -> Self {
        match mode {
            ColorMode::Auto => Self::from_env(),
            ColorMode::Always => Self::colored(),
            ColorMode::Never => Self::plain(),
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Color {
    Red,
    Green,
    Yellow,
    Blue,
    Magenta,
    Cyan,
    Gray,
}

impl Color {
    fn apply(self, text: &str) -> ColoredString {
        match self {
            Color::Red => text.red(),
            Color::Green => text.green(),
            Color::Yellow => text.yellow(),
            Color::Blue => text.blue(),
            Color::Magenta => text.magenta(),
            Color::Cyan => text.cyan(),
            Color::Gray => text.bright_black(),
        }
    }

    pub fn for_severity(severity: Option<Severity>) -> Self {
        match severity {
            Some(Severity::Error) => Color::Red,
            Some(Severity::Warning) => Color::Yellow,
            None => Color::Green,
        }
    }
}

pub fn paint(text: &str, color: Color, config: RenderConfig) -> String {
    if !config.color_enabled || text.is_empty() {
        return text.to_string();
    }
    // `RenderConfig` already made the call; skip colored's own tty detection
    colored::control::set_override(true);
    color.apply(text).to_string()
}

pub fn strip_ansi(text: &str) -> String {
    strip_ansi_escapes::strip_str(text)
}

/// Render a status line with only the status token colored.
///
/// `severity` of `None` renders the status as healthy.
pub fn status_line(line: &StatusLine, severity: Option<Severity>, config: RenderConfig) -> String {
    let mut out = format!(
        "{} {} {} {}",
        line.kind,
        line.key,
        line.verb(),
        paint(&line.status, Color::for_severity(severity), config)
    );
    if let Some(detail) = &line.detail {
        out.push_str(": ");
        out.push_str(detail);
    }
    out
}

struct Rule {
    pattern: Regex,
    color: fn(&str) -> Color,
}

impl Rule {
    fn new(pattern: &str, color: fn(&str) -> Color) -> Self {
        Self {
            pattern: Regex::new(pattern).expect("valid highlight regex"),
            color,
        }
    }
}

fn klog_level_color(header: &str) -> Color {
    match header.chars().next() {
        Some('I') => Color::Blue,
        Some('W') => Color::Yellow,
        _ => Color::Red,
    }
}

/// Colors interesting tokens of controller log lines.
///
/// Rules are applied in order and a later rule wins wherever its match
/// overlaps an earlier one. Input is stripped of escape sequences first, so
/// highlighting already highlighted text gives the same result.
pub struct LogHighlighter {
    rules: Vec<Rule>,
    config: RenderConfig,
}

impl LogHighlighter {
    pub fn new(config: RenderConfig) -> Self {
        let rules = vec![
            Rule::new(r"\b\d+\b", |_| Color::Cyan),
            Rule::new(r"\b[IWEF]\d{4}\b", klog_level_color),
            Rule::new(r#""[^"]*""#, |_| Color::Green),
            Rule::new(r"\b\d{2}:\d{2}:\d{2}\.\d+\b", |_| Color::Gray),
        ];
        Self { rules, config }
    }

    pub fn highlight(&self, line: &str) -> String {
        let plain = strip_ansi(line);
        if !self.config.color_enabled {
            return plain;
        }

        let mut colors: Vec<Option<Color>> = vec![None; plain.len()];
        for rule in &self.rules {
            for m in rule.pattern.find_iter(&plain) {
                let color = (rule.color)(m.as_str());
                colors[m.range()].fill(Some(color));
            }
        }

        // Emit one painted segment per run of equally colored bytes. Runs
        // start and end on match boundaries, which are char boundaries.
        let mut out = String::with_capacity(plain.len() * 2);
        let mut start = 0;
        for end in 1..=plain.len() {
            if end == plain.len() || colors[end] != colors[start] {
                let segment = &plain[start..end];
                match colors[start] {
                    Some(color) => out.push_str(&paint(segment, color, self.config)),
                    None => out.push_str(segment),
                }
                start = end;
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LINE: &str = r#"E0612 10:15:42.123456 1 controller.go:324] "Reconciler error" "name"="demo-cp-1" "error"="workflow failed""#;

    #[test]
    fn test_render_config_from_env_values() {
        assert!(RenderConfig::from_env_values(false, Some("xterm-256color")).color_enabled);
        assert!(RenderConfig::from_env_values(false, None).color_enabled);
        assert!(!RenderConfig::from_env_values(true, Some("xterm")).color_enabled);
        assert!(!RenderConfig::from_env_values(false, Some("dumb")).color_enabled);
    }

    #[test]
    fn test_color_mode_parse() {
        assert_eq!("Always".parse::<ColorMode>(), Ok(ColorMode::Always));
        assert_eq!("never".parse::<ColorMode>(), Ok(ColorMode::Never));
        assert!("sometimes".parse::<ColorMode>().is_err());
        assert!(!RenderConfig::from_mode(ColorMode::Never).color_enabled);
    }

    #[test]
    fn test_status_line_colors_only_the_status() {
        let line =
            StatusLine::object("Machine", "ns", "m", "not ready").with_detail(Some("waiting"));
        assert_eq!(
            status_line(&line, Some(Severity::Error), RenderConfig::colored()),
            "Machine ns/m is \x1b[31mnot ready\x1b[0m: waiting"
        );
        assert_eq!(
            status_line(&line, Some(Severity::Warning), RenderConfig::plain()),
            "Machine ns/m is not ready: waiting"
        );
    }

    #[test]
    fn test_paint_follows_render_config() {
        assert_eq!(
            paint("10:15:42.1", Color::Gray, RenderConfig::colored()),
            "\x1b[90m10:15:42.1\x1b[0m"
        );
        assert_eq!(paint("healthy", Color::Green, RenderConfig::plain()), "healthy");
        assert_eq!(paint("", Color::Red, RenderConfig::colored()), "");
    }

    #[test]
    fn test_highlight_plain_strips_escapes() {
        let highlighter = LogHighlighter::new(RenderConfig::plain());
        assert_eq!(highlighter.highlight("\x1b[31mred\x1b[0m 42"), "red 42");
    }

    #[test]
    fn test_highlight_colors_tokens() {
        let highlighter = LogHighlighter::new(RenderConfig::colored());
        let out = highlighter.highlight(LINE);

        assert!(out.starts_with(concat!(
            "\x1b[31mE0612\x1b[0m ",
            "\x1b[90m10:15:42.123456\x1b[0m ",
            "\x1b[36m1\x1b[0m"
        )));
        assert!(out.contains("\x1b[32m\"demo-cp-1\"\x1b[0m"));
        assert_eq!(strip_ansi(&out), LINE);
    }

    #[test]
    fn test_quoted_numbers_are_not_recolored() {
        let highlighter = LogHighlighter::new(RenderConfig::colored());
        assert_eq!(
            highlighter.highlight(r#"retry "3" times"#),
            "retry \x1b[32m\"3\"\x1b[0m times"
        );
    }

    #[test]
    fn test_highlight_is_idempotent() {
        let highlighter = LogHighlighter::new(RenderConfig::colored());
        for line in [LINE, "plain", "", "I0101 ok 7", r#"a "b" 1 c"#] {
            let once = highlighter.highlight(line);
            assert_eq!(highlighter.highlight(&once), once);
        }
    }
}
