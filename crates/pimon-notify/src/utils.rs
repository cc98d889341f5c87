/// Maximum length of a response body kept in errors and logs.
pub const MAX_BODY_LENGTH: usize = 1000;

/// Truncates `s` to at most `max_len` bytes on a char boundary.
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        return s.to_string();
    }
    let mut end = max_len;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}... [truncated]", &s[..end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_string() {
        assert_eq!(truncate_string("hello", 10), "hello");
        assert_eq!(truncate_string("hello world", 5), "hello... [truncated]");
    }

    #[test]
    fn test_truncate_string_respects_char_boundaries() {
        assert_eq!(truncate_string("⚠️ALARM", 2), "... [truncated]");
    }
}
