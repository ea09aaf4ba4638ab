//! Rendering of model replies.
//!
//! Replies are markdown. For the web UI they become HTML with raw HTML
//! dropped and unsafe link schemes neutralised; for the terminal they become
//! styled text. User-authored chat text is never interpreted as markdown.

use colored::*;
use pulldown_cmark::{html, CowStr, Event, Options, Parser, Tag, TagEnd};

const BLOCKED_SCHEMES: &[&str] = &["javascript:", "vbscript:", "data:"];

pub fn markdown_options() -> Options {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);
    options
}

fn is_blocked_url(url: &str) -> bool {
    let lowered = url.trim_start().to_ascii_lowercase();
    BLOCKED_SCHEMES.iter().any(|s| lowered.starts_with(s))
}

fn sanitize(event: Event<'_>) -> Option<Event<'_>> {
    match event {
        Event::Html(_) | Event::InlineHtml(_) => None,
        Event::Start(Tag::Link { link_type, dest_url, title, id }) if is_blocked_url(&dest_url) => {
            Some(Event::Start(Tag::Link { link_type, dest_url: CowStr::from("#"), title, id }))
        }
        Event::Start(Tag::Image { link_type, dest_url, title, id }) if is_blocked_url(&dest_url) => {
            Some(Event::Start(Tag::Image { link_type, dest_url: CowStr::from("#"), title, id }))
        }
        other => Some(other),
    }
}

/// Render model output to HTML that is safe to insert into a page.
pub fn markdown_to_html(markdown: &str) -> String {
    let parser = Parser::new_ext(markdown, markdown_options()).filter_map(sanitize);
    let mut out = String::new();
    html::push_html(&mut out, parser);
    out
}

/// Escape user-authored text for display; markdown syntax stays literal.
pub fn plain_text_to_html(text: &str) -> String {
    let mut out = String::new();
    html::push_html(&mut out, std::iter::once(Event::Text(CowStr::from(text))));
    out
}

// ---------------------------------------------------------------------------
// Terminal rendering
// ---------------------------------------------------------------------------

#[derive(Default)]
struct TableBuf {
    rows: Vec<Vec<String>>,
    row: Vec<String>,
    cell: String,
    has_header: bool,
}

impl TableBuf {
    fn finish_row(&mut self) {
        if !self.row.is_empty() {
            self.rows.push(std::mem::take(&mut self.row));
        }
    }

    fn render(&self) -> String {
        let columns = self.rows.iter().map(Vec::len).max().unwrap_or(0);
        let mut widths = vec![0usize; columns];
        for row in &self.rows {
            for (i, cell) in row.iter().enumerate() {
                widths[i] = widths[i].max(cell.chars().count());
            }
        }

        let mut out = String::new();
        for (r, row) in self.rows.iter().enumerate() {
            let mut line = String::from("|");
            for (i, width) in widths.iter().enumerate() {
                let cell = row.get(i).map(String::as_str).unwrap_or("");
                let pad = width - cell.chars().count();
                let text = if r == 0 && self.has_header {
                    cell.bold().to_string()
                } else {
                    cell.to_string()
                };
                line.push(' ');
                line.push_str(&text);
                line.push_str(&" ".repeat(pad));
                line.push_str(" |");
            }
            out.push_str(&line);
            out.push('\n');
            if r == 0 && self.has_header {
                out.push('|');
                for width in &widths {
                    out.push_str(&"-".repeat(width + 2));
                    out.push('|');
                }
                out.push('\n');
            }
        }
        out
    }
}

#[derive(Default)]
struct TerminalWriter {
    out: String,
    heading: bool,
    strong: u32,
    emphasis: u32,
    strike: u32,
    code_block: bool,
    lists: Vec<Option<u64>>,
    table: Option<TableBuf>,
}

impl TerminalWriter {
    fn styled(&self, text: &str) -> String {
        if self.code_block {
            return text.green().to_string();
        }
        let mut s: ColoredString = text.normal();
        if self.heading {
            s = s.bold().bright_cyan();
        }
        if self.strong > 0 {
            s = s.bold();
        }
        if self.emphasis > 0 {
            s = s.italic();
        }
        if self.strike > 0 {
            s = s.strikethrough();
        }
        s.to_string()
    }

    fn text(&mut self, text: &str) {
        if let Some(table) = self.table.as_mut() {
            table.cell.push_str(text);
            return;
        }
        let styled = self.styled(text);
        self.out.push_str(&styled);
    }

    fn ensure_newline(&mut self) {
        if !self.out.is_empty() && !self.out.ends_with('\n') {
            self.out.push('\n');
        }
    }

    fn block_end(&mut self) {
        self.ensure_newline();
        if self.lists.is_empty() {
            self.out.push('\n');
        }
    }

    fn event(&mut self, event: Event<'_>) {
        match event {
            Event::Start(Tag::Heading { .. }) => self.heading = true,
            Event::End(TagEnd::Heading(_)) => {
                self.heading = false;
                self.block_end();
            }
            Event::End(TagEnd::Paragraph) => self.block_end(),
            Event::Start(Tag::Strong) => self.strong += 1,
            Event::End(TagEnd::Strong) => self.strong = self.strong.saturating_sub(1),
            Event::Start(Tag::Emphasis) => self.emphasis += 1,
            Event::End(TagEnd::Emphasis) => self.emphasis = self.emphasis.saturating_sub(1),
            Event::Start(Tag::Strikethrough) => self.strike += 1,
            Event::End(TagEnd::Strikethrough) => self.strike = self.strike.saturating_sub(1),
            Event::Start(Tag::CodeBlock(_)) => {
                self.ensure_newline();
                self.code_block = true;
            }
            Event::End(TagEnd::CodeBlock) => {
                self.code_block = false;
                self.block_end();
            }
            Event::Start(Tag::List(start)) => {
                self.ensure_newline();
                self.lists.push(start);
            }
            Event::End(TagEnd::List(_)) => {
                self.lists.pop();
                if self.lists.is_empty() {
                    self.out.push('\n');
                }
            }
            Event::Start(Tag::Item) => {
                self.ensure_newline();
                let depth = self.lists.len().saturating_sub(1);
                let bullet = match self.lists.last_mut() {
                    Some(Some(n)) => {
                        let b = format!("{n}.");
                        *n += 1;
                        b
                    }
                    _ => "•".to_string(),
                };
                self.out.push_str(&"  ".repeat(depth));
                self.out.push_str(&bullet);
                self.out.push(' ');
            }
            Event::End(TagEnd::Item) => self.ensure_newline(),
            Event::Start(Tag::Table(_)) => {
                self.ensure_newline();
                self.table = Some(TableBuf::default());
            }
            Event::End(TagEnd::TableCell) => {
                if let Some(t) = self.table.as_mut() {
                    let cell = std::mem::take(&mut t.cell).trim().to_string();
                    t.row.push(cell);
                }
            }
            Event::End(TagEnd::TableHead) => {
                if let Some(t) = self.table.as_mut() {
                    t.finish_row();
                    t.has_header = true;
                }
            }
            Event::End(TagEnd::TableRow) => {
                if let Some(t) = self.table.as_mut() {
                    t.finish_row();
                }
            }
            Event::End(TagEnd::Table) => {
                if let Some(t) = self.table.take() {
                    self.out.push_str(&t.render());
                    self.out.push('\n');
                }
            }
            Event::Text(t) => self.text(&t),
            Event::Code(c) => {
                if let Some(table) = self.table.as_mut() {
                    table.cell.push_str(&c);
                } else {
                    self.out.push_str(&c.yellow().to_string());
                }
            }
            Event::SoftBreak => self.text(" "),
            Event::HardBreak => {
                if self.table.is_none() {
                    self.out.push('\n');
                }
            }
            Event::Rule => {
                self.ensure_newline();
                self.out.push_str(&"─".repeat(40));
                self.out.push_str("\n\n");
            }
            Event::TaskListMarker(done) => self.text(if done { "[x] " } else { "[ ] " }),
            _ => {}
        }
    }
}

/// Render model output as styled terminal text.
pub fn markdown_to_terminal(markdown: &str) -> String {
    let mut writer = TerminalWriter::default();
    for event in Parser::new_ext(markdown, markdown_options()).filter_map(sanitize) {
        writer.event(event);
    }
    writer.out.trim_end().to_string()
}
