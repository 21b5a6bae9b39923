// Lightweight markdown styling for model responses

use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span},
};

/// Style a whole response, including fenced code blocks
pub fn render_markdown(markdown: &str) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    let mut in_code_block = false;

    for line in markdown.lines() {
        if is_code_fence(line) {
            if in_code_block {
                lines.push(Line::from(Span::styled(
                    "└──────────────────────────────",
                    Style::default().fg(Color::DarkGray),
                )));
            } else {
                let language = extract_code_language(line);
                lines.push(Line::from(Span::styled(
                    format!("┌─ {} ─────────────────────", language.as_deref().unwrap_or("code")),
                    Style::default().fg(Color::DarkGray),
                )));
            }
            in_code_block = !in_code_block;
        } else if in_code_block {
            lines.push(Line::from(Span::styled(
                format!("  {line}"),
                Style::default().fg(Color::Green),
            )));
        } else {
            lines.push(render_line(line));
        }
    }

    lines
}

fn is_code_fence(line: &str) -> bool {
    line.trim().starts_with("```")
}

fn extract_code_language(line: &str) -> Option<String> {
    line.trim()
        .strip_prefix("```")
        .map(str::trim)
        .filter(|lang| !lang.is_empty())
        .map(ToString::to_string)
}

fn heading(line: &str) -> Option<(usize, &str)> {
    let trimmed = line.trim_start();
    let level = trimmed.chars().take_while(|&c| c == '#').count();
    if level == 0 {
        return None;
    }
    let rest = &trimmed[level..];
    rest.starts_with(' ').then(|| (level, rest.trim()))
}

fn bullet(line: &str) -> Option<(usize, &str)> {
    let indent = line.len() - line.trim_start().len();
    let trimmed = line.trim_start();
    trimmed
        .strip_prefix("- ")
        .or_else(|| trimmed.strip_prefix("* "))
        .map(|rest| (indent, rest))
}

fn render_line(line: &str) -> Line<'static> {
    if let Some((level, text)) = heading(line) {
        let color = match level {
            1 => Color::Yellow,
            2 => Color::Cyan,
            _ => Color::Blue,
        };
        return Line::from(Span::styled(
            text.to_string(),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        ));
    }

    if let Some((indent, rest)) = bullet(line) {
        let mut spans = vec![Span::styled(
            format!("{}• ", " ".repeat(indent)),
            Style::default().fg(Color::Cyan),
        )];
        spans.extend(render_inline(rest));
        return Line::from(spans);
    }

    Line::from(render_inline(line))
}

/// Bold (`**x**`) and inline code (`` `x` ``); unmatched markers stay literal
fn render_inline(text: &str) -> Vec<Span<'static>> {
    let mut spans = Vec::new();
    let mut plain = String::new();
    let mut rest = text;

    while !rest.is_empty() {
        let styled = if let Some(after) = rest.strip_prefix("**") {
            after.find("**").map(|end| {
                let span = Span::styled(
                    after[..end].to_string(),
                    Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
                );
                (span, &after[end + 2..])
            })
        } else if let Some(after) = rest.strip_prefix('`') {
            after.find('`').map(|end| {
                let span = Span::styled(after[..end].to_string(), Style::default().fg(Color::Magenta));
                (span, &after[end + 1..])
            })
        } else {
            None
        };

        if let Some((span, remaining)) = styled {
            if !plain.is_empty() {
                spans.push(Span::raw(std::mem::take(&mut plain)));
            }
            spans.push(span);
            rest = remaining;
        } else {
            let mut chars = rest.chars();
            if let Some(ch) = chars.next() {
                plain.push(ch);
            }
            rest = chars.as_str();
        }
    }

    if !plain.is_empty() {
        spans.push(Span::raw(plain));
    }
    spans
}
