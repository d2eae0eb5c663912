//! Terminal rendering helpers for report lines.
//!
//! Violation messages can be long and span lines; summaries show a bounded preview.

/// Single-line form of `input`, cut to `max_chars` characters with a `...` marker.
pub fn compact_line(input: &str, max_chars: usize) -> String {
    let words: Vec<&str> = input.split_whitespace().collect();
    let flat = words.join(" ");
    if flat.chars().count() <= max_chars {
        return flat;
    }
    let cut: String = flat.chars().take(max_chars).collect();
    format!("{}...", cut)
}

/// First `max_items` messages joined by ` | `, noting how many were left out.
pub fn preview_messages(messages: &[String], max_items: usize, max_chars: usize) -> String {
    let mut preview: Vec<String> = Vec::with_capacity(max_items.min(messages.len()));
    for message in messages.iter().take(max_items) {
        preview.push(compact_line(message, max_chars));
    }
    let hidden = messages.len().saturating_sub(max_items);
    match hidden {
        0 => preview.join(" | "),
        n => format!("{} (+{} more)", preview.join(" | "), n),
    }
}

/// Render a list as `a, b, c`, or `(none)` when empty.
pub fn join_or_none(items: &[String]) -> String {
    if items.is_empty() {
        "(none)".to_string()
    } else {
        items.join(", ")
    }
}
