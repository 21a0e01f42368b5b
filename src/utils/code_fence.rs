//! Markdown code-fence stripping for completion output.
//!
//! Models are told to return bare YAML or JSON but regularly wrap the
//! document in a fence such as ```` ```yaml ```` or a bare ```` ``` ````.
//! Only a fence that encloses the whole (trimmed) response is removed;
//! fences in the middle of prose are left for the parser to reject.
//!
//! # Example
//!
//! ```
//! use recordforge::utils::strip_code_fences;
//!
//! let response = "```json\n{\"name\": \"lamp\"}\n```";
//! assert_eq!(strip_code_fences(response), "{\"name\": \"lamp\"}");
//! ```

use regex::Regex;

/// Removes a Markdown code fence that surrounds the whole response.
///
/// An opening fence without a matching closing fence (a truncated
/// completion) loses its opening line only. Content without a leading fence
/// is returned trimmed and otherwise unchanged.
pub fn strip_code_fences(content: &str) -> String {
    let trimmed = content.trim();
    if !trimmed.starts_with("```") {
        return trimmed.to_string();
    }

    if let Some(inner) = enclosed_block(trimmed) {
        return inner;
    }

    // Opening fence only: drop the info-string line.
    match trimmed.split_once('\n') {
        Some((_, rest)) => rest.trim().to_string(),
        None => String::new(),
    }
}

fn enclosed_block(content: &str) -> Option<String> {
    let re = Regex::new(r"^```[\w+-]*[ \t]*\n?([\s\S]*?)\n?[ \t]*```$").ok()?;
    re.captures(content)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
}
