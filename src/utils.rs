//! Utility functions for common operations.

use crate::error::GenerationError;

/// Splits text into lines, keeping each line's terminator.
///
/// A trailing fragment without a terminator is kept as its own line, so
/// concatenating the result always reproduces `text`.
pub fn split_lines_keep_ends(text: &str) -> Vec<String> {
    text.split_inclusive('\n').map(str::to_string).collect()
}

/// Returns the content before the first line break, trimmed.
pub fn first_line(text: &str) -> &str {
    text.split('\n').next().unwrap_or_default().trim()
}

/// Checks if an HTTP response is successful, and if not, returns a detailed error.
///
/// This helper extracts both the status code and response body for better error messages.
pub async fn check_response_status(
    response: reqwest::Response,
) -> Result<reqwest::Response, GenerationError> {
    if !response.status().is_success() {
        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        return Err(GenerationError::ApiError(format!(
            "HTTP {}: {}",
            status, text
        )));
    }
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_empty_text() {
        assert!(split_lines_keep_ends("").is_empty());
    }

    #[test]
    fn test_split_keeps_terminators() {
        let lines = split_lines_keep_ends("Hello\n\nWorld\n");
        assert_eq!(lines, vec!["Hello\n", "\n", "World\n"]);
    }

    #[test]
    fn test_split_unterminated_last_line() {
        let lines = split_lines_keep_ends("a\r\nb");
        assert_eq!(lines, vec!["a\r\n", "b"]);
        assert_eq!(lines.concat(), "a\r\nb");
    }

    #[test]
    fn test_first_line() {
        assert_eq!(first_line("line one\nextra junk"), "line one");
        assert_eq!(first_line("  padded  "), "padded");
        assert_eq!(first_line("\nsecond"), "");
        assert_eq!(first_line("crlf\r\nnext"), "crlf");
        assert_eq!(first_line(""), "");
    }
}
