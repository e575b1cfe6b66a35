//! Fenced code block detection for the line-stream driver.
//!
//! The driver only needs binary in/out tracking: a fence opens with three
//! or more backticks or tildes, optionally carrying a language tag, and
//! closes on the next line starting with three markers of the same family.
//! Nested fences are not supported.

/// An opening fence line (e.g. ```` ```python ````).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FenceOpening {
    /// Fence marker character (backtick or tilde).
    pub marker: char,
    /// Number of marker characters in the opener.
    pub length: usize,
    /// Language tag, empty when none was given.
    pub lang: String,
}

/// Parse a line as a fence opener.
///
/// The marker run must start at column zero and be at least three
/// characters long; the language tag is the run of word characters
/// immediately following it.
pub fn detect_fence_opening(line: &str) -> Option<FenceOpening> {
    let mut chars = line.chars().peekable();
    let first = *chars.peek()?;
    if first != '`' && first != '~' {
        return None;
    }
    let mut length = 0usize;
    while chars.peek() == Some(&first) {
        chars.next();
        length += 1;
    }
    if length < 3 {
        return None;
    }

    let mut lang = String::new();
    while let Some(&ch) = chars.peek() {
        if ch.is_ascii_alphanumeric() || ch == '_' {
            lang.push(ch);
            chars.next();
        } else {
            break;
        }
    }

    Some(FenceOpening {
        marker: first,
        length,
        lang,
    })
}

/// Whether `line` closes the block opened by `opening`.
///
/// A closer is any line whose trimmed text starts with three markers of
/// the opening family. This intentionally treats a longer run as a valid
/// closer too.
pub fn is_fence_close(line: &str, opening: &FenceOpening) -> bool {
    let trimmed = line.trim_start();
    let mut count = 0usize;
    for ch in trimmed.chars() {
        if ch == opening.marker {
            count += 1;
            if count >= 3 {
                return true;
            }
        } else {
            break;
        }
    }
    false
}
