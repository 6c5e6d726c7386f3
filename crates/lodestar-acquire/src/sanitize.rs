//! Filesystem-safe filenames derived from release titles.

/// Fallback stem used when a title sanitises to nothing.
pub const FALLBACK_STEM: &str = "release";

/// Longest stem kept, in bytes, leaving room for an extension inside `NAME_MAX`.
const MAX_STEM_BYTES: usize = 240;

/// Replace characters that are invalid on common filesystems.
///
/// Path separators become `+`, `?` becomes `!`, `*` and `:` become `-`, and `<`, `>`, `|`, `"`
/// and control characters are dropped. Leading/trailing whitespace and dots are trimmed.
#[must_use]
pub fn clean_file_name(title: &str) -> String {
    let mut out = String::with_capacity(title.len());
    for ch in title.chars() {
        match ch {
            '/' | '\\' => out.push('+'),
            '?' => out.push('!'),
            '*' | ':' => out.push('-'),
            '<' | '>' | '|' | '"' => {}
            ch if ch.is_control() => {}
            ch => out.push(ch),
        }
    }

    let trimmed = out.trim_matches(|ch: char| ch.is_whitespace() || ch == '.');
    if trimmed.is_empty() {
        return FALLBACK_STEM.to_string();
    }

    let mut take = trimmed.len().min(MAX_STEM_BYTES);
    while !trimmed.is_char_boundary(take) {
        take -= 1;
    }
    trimmed[..take].trim_end().to_string()
}

/// Filename used for a fetched `.torrent` payload.
#[must_use]
pub fn torrent_file_name(title: &str) -> String {
    format!("{}.torrent", clean_file_name(title))
}
