use serde::Serialize;
use serde_json::Value;

use terminal_size::{terminal_size, Height, Width};

use crate::error::AppResult;

/// ASCII table with a colored header, fitted to the terminal width.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(columns: &[&str]) -> Self {
        Self { columns: columns.iter().map(|c| c.to_string()).collect(), rows: Vec::new() }
    }

    pub fn push_row(&mut self, cells: Vec<String>) { self.rows.push(cells); }

    pub fn len(&self) -> usize { self.rows.len() }

    pub fn is_empty(&self) -> bool { self.rows.is_empty() }

    /// One row per record, taking the given wire keys in order. `columns` pairs a wire
    /// key with its header text.
    pub fn from_records<T: Serialize>(records: &[T], columns: &[(&str, &str)]) -> AppResult<Self> {
        let headers: Vec<&str> = columns.iter().map(|(_, h)| *h).collect();
        let mut table = Table::new(&headers);
        for rec in records {
            let v = serde_json::to_value(rec)?;
            table.push_row(columns.iter().map(|(key, _)| to_cell_string(v.get(*key).unwrap_or(&Value::Null))).collect());
        }
        Ok(table)
    }

    /// Lines of the rendered table, each at most `termw` visible characters.
    pub fn render(&self, termw: usize) -> Vec<String> {
        let mut widths: Vec<usize> = self.columns.iter().map(|s| visible_len(s).min(termw)).collect();
        for r in &self.rows {
            for (i, cell) in r.iter().enumerate().take(widths.len()) {
                widths[i] = widths[i].max(visible_len(cell).min(termw));
            }
        }

        let sep = build_separator(&widths);
        let mut out = Vec::with_capacity(self.rows.len() + 5);
        out.push(fit_line_to_width(&sep, termw));
        out.push(fit_line_to_width(&build_header(&self.columns, &widths), termw));
        out.push(fit_line_to_width(&sep, termw));
        for r in &self.rows {
            out.push(fit_line_to_width(&build_row(r, &widths), termw));
        }
        out.push(fit_line_to_width(&sep, termw));
        out.push(format!("rows: {}", self.rows.len()));
        out
    }

    pub fn print(&self) {
        if self.rows.is_empty() {
            println!("(no rows)");
            return;
        }
        let termw = get_terminal_width();
        crate::tprintln!("[cli.outputformatter] detected terminal width={} columns", termw);
        for line in self.render(termw) {
            println!("{}", line);
        }
    }
}

fn to_cell_string(v: &Value) -> String {
    match v {
        Value::Null => String::from("-"),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn build_separator(widths: &[usize]) -> String {
    let mut s = String::from("+");
    for w in widths {
        s.push_str(&"-".repeat(*w + 2));
        s.push('+');
    }
    s
}

fn pad_cell(s: &mut String, text: &str, shown: &str, width: usize, align_right: bool) {
    let pad = " ".repeat(width.saturating_sub(visible_len(shown)));
    s.push(' ');
    if align_right {
        s.push_str(&pad);
        s.push_str(text);
    } else {
        s.push_str(text);
        s.push_str(&pad);
    }
    s.push_str(" |");
}

fn build_row(cells: &[String], widths: &[usize]) -> String {
    let mut s = String::from("|");
    for (i, w) in widths.iter().enumerate() {
        let cell = cells.get(i).map(String::as_str).unwrap_or("");
        let text = truncate(cell, *w);
        pad_cell(&mut s, &text, &text, *w, is_numeric_like(cell));
    }
    s
}

// header names in green, padded by visible width
fn build_header(cells: &[String], widths: &[usize]) -> String {
    let mut s = String::from("|");
    for (i, w) in widths.iter().enumerate() {
        let text = truncate(cells.get(i).map(String::as_str).unwrap_or(""), *w);
        let colored = format!("\x1b[32m{}\x1b[0m", text);
        pad_cell(&mut s, &colored, &text, *w, false);
    }
    s
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max { return s.to_string(); }
    if max <= 1 { return "…".to_string(); }
    s.chars().take(max - 1).collect::<String>() + "…"
}

fn is_numeric_like(s: &str) -> bool {
    let st = s.trim();
    !st.is_empty() && st.chars().any(|c| c.is_ascii_digit()) && st.chars().all(|c| c.is_ascii_digit() || "-+.".contains(c))
}

fn get_terminal_width() -> usize {
    match terminal_size() {
        Some((Width(w), Height(_))) if w > 8 => (w - 4) as usize,
        _ => 80,
    }
}

fn fit_line_to_width(s: &str, maxw: usize) -> String {
    if visible_len(s) <= maxw { return s.to_string(); }
    elide_end_preserving_ansi(s, maxw)
}

/// Length in visible characters; CSI escape sequences count as zero.
fn visible_len(s: &str) -> usize {
    let mut count = 0;
    let mut chars = s.chars();
    while let Some(ch) = chars.next() {
        if ch == '\x1b' {
            if chars.next() == Some('[') {
                for c in chars.by_ref() {
                    if c.is_ascii_alphabetic() { break; }
                }
            }
            continue;
        }
        count += 1;
    }
    count
}

/// Keep the first `maxw - 1` visible characters, append an ellipsis, and reset color
/// in case an escape was cut.
fn elide_end_preserving_ansi(s: &str, maxw: usize) -> String {
    let budget = maxw.saturating_sub(1);
    let mut out = String::new();
    let mut shown = 0;
    let mut chars = s.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch == '\x1b' {
            out.push(ch);
            if chars.peek() == Some(&'[') {
                for c in chars.by_ref() {
                    out.push(c);
                    if c.is_ascii_alphabetic() { break; }
                }
            }
            continue;
        }
        if shown == budget { break; }
        out.push(ch);
        shown += 1;
    }
    out.push('…');
    out.push_str("\x1b[0m");
    out
}
