// Output formatting: terminal display for classifications and reports.

pub mod terminal;

/// Truncate a string to at most `max_chars` characters, appending "..." if truncated.
///
/// Respects UTF-8 character boundaries, so posts full of emoji or Devanagari
/// never panic the way byte slicing (`&text[..120]`) would.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    let char_count = text.chars().count();
    if char_count <= max_chars {
        text.to_string()
    } else {
        let truncated: String = text.chars().take(max_chars).collect();
        format!("{truncated}...")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_multibyte() {
        assert_eq!(truncate_chars("🌊🌊🌊🌊🌊", 2), "🌊🌊...");
        assert_eq!(truncate_chars("short", 10), "short");
    }
}
