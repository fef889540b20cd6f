//! Terminal practice widget.
//!
//! Reads commands from stdin: a plain line becomes the practice sentence, a
//! number hovers the word at that position, `:out` ends the hover,
//! `:topic NAME` switches the dictionary topic and `:quit` exits.

use crate::resolver::WordResolver;
use crate::tooltip::{
    ElementRect, Hover, Overlay, Position, Scroll, TooltipId, TooltipManager, WordElement,
};
use anyhow::{Context, Result};
use colored::{ColoredString, Colorize};
use std::collections::HashMap;
use std::io::{self, Write};
use std::sync::Arc;
use terminal_size::{terminal_size, Width};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info};

/// Columns the sentence is indented by on screen.
const SENTENCE_INDENT: usize = 2;

/// A parsed line of user input.
#[derive(Debug, Clone, PartialEq)]
enum Command {
    /// Replace the practice sentence.
    Sentence(String),
    /// Hover the word at this 1-based position.
    Hover(usize),
    /// End the current hover.
    Out,
    /// Switch dictionary topic.
    Topic(String),
    Help,
    Quit,
    Empty,
    Unknown(String),
}

fn parse_command(line: &str) -> Command {
    let line = line.trim();
    if line.is_empty() {
        return Command::Empty;
    }
    if let Ok(index) = line.parse::<usize>() {
        return Command::Hover(index);
    }
    if let Some(rest) = line.strip_prefix(':') {
        let mut parts = rest.splitn(2, char::is_whitespace);
        let name = parts.next().unwrap_or_default();
        let arg = parts.next().map(str::trim).unwrap_or_default();
        return match (name, arg) {
            ("out", _) => Command::Out,
            ("quit" | "q", _) => Command::Quit,
            ("help" | "h", _) => Command::Help,
            ("topic", topic) if !topic.is_empty() => Command::Topic(topic.to_string()),
            _ => Command::Unknown(line.to_string()),
        };
    }
    Command::Sentence(line.to_string())
}

/// Splits a sentence on spaces and records each word's on-screen cell.
fn layout_sentence(sentence: &str, row: f64) -> Vec<WordElement> {
    let mut elements = Vec::new();
    let mut column = SENTENCE_INDENT;
    for token in sentence.split(' ') {
        let width = token.chars().count();
        if width > 0 {
            elements.push(WordElement {
                text: token.to_string(),
                rect: ElementRect {
                    left: column as f64,
                    top: row,
                    width: width as f64,
                    height: 1.0,
                },
            });
        }
        column += width + 1;
    }
    elements
}

/// Renders tooltips as indented lines below the prompt.
///
/// Terminal output can't be placed above the prompt, so only the column of
/// the tooltip position is honoured. Every show or update appends a fresh
/// line; earlier output is never rewritten.
pub struct TerminalOverlay {
    columns: HashMap<TooltipId, usize>,
    out: Box<dyn Write + Send>,
}

impl TerminalOverlay {
    pub fn new(out: Box<dyn Write + Send>) -> Self {
        Self {
            columns: HashMap::new(),
            out,
        }
    }

    fn print_line(&mut self, column: usize, text: ColoredString) {
        let result = writeln!(self.out, "{}{} {}", " ".repeat(column), "▼".bright_cyan(), text)
            .and_then(|_| self.out.flush());
        if let Err(e) = result {
            debug!("Failed to draw tooltip: {}", e);
        }
    }
}

impl Default for TerminalOverlay {
    fn default() -> Self {
        Self::new(Box::new(io::stdout()))
    }
}

impl Overlay for TerminalOverlay {
    fn show(&mut self, id: TooltipId, position: Position, text: &str) {
        let column = position.left.max(0.0) as usize;
        self.columns.insert(id, column);
        self.print_line(column, text.bright_yellow());
    }

    fn update(&mut self, id: TooltipId, text: &str) {
        let Some(&column) = self.columns.get(&id) else {
            return;
        };
        self.print_line(column, text.bright_green().bold());
    }

    fn remove(&mut self, id: TooltipId) {
        self.columns.remove(&id);
    }
}

/// Interactive hover-translation session on the terminal.
pub struct PracticeSession {
    resolver: Arc<WordResolver>,
    tooltips: TooltipManager<TerminalOverlay>,
    words: Vec<WordElement>,
    hover: Option<Hover<TerminalOverlay>>,
}

impl PracticeSession {
    pub fn new(resolver: Arc<WordResolver>) -> Self {
        Self {
            tooltips: TooltipManager::new(TerminalOverlay::default(), Arc::clone(&resolver)),
            resolver,
            words: Vec::new(),
            hover: None,
        }
    }

    /// Processes stdin commands until `:quit` or end of input.
    pub async fn run(&mut self) -> Result<()> {
        print_help();
        println!(
            "{} {}\n",
            "Topic:".bright_yellow(),
            self.resolver.topic().bright_magenta().bold()
        );

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Some(line) = lines.next_line().await.context("Failed to read stdin")? {
            match parse_command(&line) {
                Command::Sentence(sentence) => self.set_sentence(&sentence),
                Command::Hover(index) => self.hover(index),
                Command::Out => self.end_hover(),
                Command::Topic(topic) => self.change_topic(&topic).await,
                Command::Help => print_help(),
                Command::Quit => break,
                Command::Empty => continue,
                Command::Unknown(input) => {
                    println!("{} {}", "Unknown command:".bright_red(), input);
                }
            }
        }

        self.end_hover();
        info!(
            "Session ended with {} cached words",
            self.resolver.session().len()
        );
        Ok(())
    }

    fn set_sentence(&mut self, sentence: &str) {
        // Replacing the sentence invalidates any tooltip pointing into it.
        self.end_hover();
        self.tooltips.clear();
        self.words = layout_sentence(sentence, 0.0);

        print_divider();
        println!("{}{}", " ".repeat(SENTENCE_INDENT), sentence.white().bold());
        let mut markers = String::new();
        for (i, word) in self.words.iter().enumerate() {
            let column = word.rect.left as usize;
            let padding = column.saturating_sub(markers.chars().count());
            markers.push_str(&" ".repeat(padding));
            markers.push_str(&(i + 1).to_string());
        }
        println!("{}", markers.bright_black());
    }

    fn hover(&mut self, index: usize) {
        let Some(element) = index
            .checked_sub(1)
            .and_then(|i| self.words.get(i))
            .cloned()
        else {
            println!(
                "{} {} (1-{})",
                "No word at position".bright_red(),
                index,
                self.words.len()
            );
            return;
        };

        debug!("Hovering '{}'", element.text);
        // The previous hover ends before the next one starts.
        self.end_hover();
        self.hover = Some(self.tooltips.hover_start(&element, Scroll::default()));
    }

    fn end_hover(&mut self) {
        if let Some(hover) = self.hover.take() {
            // The resolution keeps running detached; its result is dropped.
            let _ = hover.end();
        }
    }

    async fn change_topic(&mut self, topic: &str) {
        self.end_hover();
        self.tooltips.clear();
        println!("{} {}", "Loading topic".bright_yellow(), topic.bright_magenta().bold());
        self.resolver.change_topic(topic).await;
    }
}

/// Prints a header box that fits the terminal width.
pub fn print_header(title: &str, subtitle: &str) {
    let inner_width = get_terminal_width().saturating_sub(3);

    let top_border = format!("╔{}╗", "═".repeat(inner_width));
    let bottom_border = format!("╚{}╝", "═".repeat(inner_width));

    println!("\n{}", top_border.bright_cyan().bold());
    println!("{}", centered_line(title, inner_width).bright_cyan().bold());
    println!("{}", centered_line(subtitle, inner_width).bright_cyan().bold());
    println!("{}\n", bottom_border.bright_cyan().bold());
}

/// Centers `text` between box borders `inner_width` columns apart.
fn centered_line(text: &str, inner_width: usize) -> String {
    let len = text.chars().count();
    let padding = inner_width.saturating_sub(len) / 2;
    format!(
        "║{}{}{: <width$}║",
        " ".repeat(padding),
        text,
        "",
        width = inner_width.saturating_sub(padding + len)
    )
}

fn print_help() {
    println!(
        "{}",
        "Type an English sentence, then the number of a word to see its translation.".white()
    );
    println!(
        "{}",
        "Commands: :out (hide tooltip), :topic NAME, :help, :quit".bright_black()
    );
}

/// Gets the current terminal width, with a fallback default.
fn get_terminal_width() -> usize {
    terminal_size()
        .map(|(Width(w), _)| w as usize)
        .unwrap_or(80)
}

/// Prints a divider line that spans the terminal width.
fn print_divider() {
    let width = get_terminal_width();
    let divider: String = "─".repeat(width.saturating_sub(1));
    println!("{}", divider.bright_black());
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// `Write` sink whose contents stay readable after the overlay takes it.
    #[derive(Clone, Default)]
    struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

    impl SharedBuffer {
        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn position(left: f64) -> Position {
        Position { left, top: 0.0 }
    }

    #[test]
    fn test_parse_hover_index() {
        assert_eq!(parse_command("3"), Command::Hover(3));
        assert_eq!(parse_command("  12 "), Command::Hover(12));
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(parse_command(":out"), Command::Out);
        assert_eq!(parse_command(":q"), Command::Quit);
        assert_eq!(parse_command(":quit"), Command::Quit);
        assert_eq!(parse_command(":help"), Command::Help);
        assert_eq!(parse_command(":topic animals"), Command::Topic("animals".to_string()));
        assert_eq!(parse_command(":topic"), Command::Unknown(":topic".to_string()));
        assert_eq!(parse_command(":dance"), Command::Unknown(":dance".to_string()));
        assert_eq!(parse_command("   "), Command::Empty);
    }

    #[test]
    fn test_parse_sentence() {
        assert_eq!(
            parse_command("The cat sleeps."),
            Command::Sentence("The cat sleeps.".to_string())
        );
    }

    #[test]
    fn test_layout_sentence_columns() {
        let words = layout_sentence("The cat, sleeps.", 0.0);
        let texts: Vec<_> = words.iter().map(|w| w.text.as_str()).collect();
        assert_eq!(texts, vec!["The", "cat,", "sleeps."]);
        let columns: Vec<_> = words.iter().map(|w| w.rect.left).collect();
        assert_eq!(columns, vec![2.0, 6.0, 11.0]);
        assert_eq!(words[1].rect.width, 4.0);
    }

    #[test]
    fn test_layout_sentence_skips_repeated_spaces() {
        let words = layout_sentence("a  b", 0.0);
        assert_eq!(words.len(), 2);
        assert_eq!(words[1].rect.left, 5.0);
    }

    #[test]
    fn test_centered_line_fits_width() {
        let line = centered_line("Hi", 10);
        assert_eq!(line.chars().count(), 12);
        assert!(line.starts_with("║    Hi"));
    }

    #[test]
    fn test_overlay_update_appends_without_moving_cursor() {
        let buffer = SharedBuffer::default();
        let mut overlay = TerminalOverlay::new(Box::new(buffer.clone()));

        overlay.show(TooltipId(1), position(6.0), "Traduciendo...");
        overlay.update(TooltipId(1), "gato");

        let output = buffer.contents();
        assert!(!output.contains("\x1b[1A"));
        assert!(!output.contains("\x1b[2K"));
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("      "));
        assert!(lines[0].contains("Traduciendo..."));
        assert!(lines[1].starts_with("      "));
        assert!(lines[1].contains("gato"));
    }

    #[test]
    fn test_overlay_ignores_removed_tooltip() {
        let buffer = SharedBuffer::default();
        let mut overlay = TerminalOverlay::new(Box::new(buffer.clone()));

        overlay.show(TooltipId(1), position(2.0), "Traduciendo...");
        overlay.remove(TooltipId(1));
        overlay.update(TooltipId(1), "gato");

        assert!(!buffer.contents().contains("gato"));
    }
}
