//! Named placeholder discovery in SQL text.

/// Names of the `:name`, `@name` and `$name` placeholders in `sql`, without
/// prefix, deduplicated in first-occurrence order. String literals, quoted
/// identifiers and comments are skipped.
pub fn extract_placeholders(sql: &str) -> Vec<String> {
    let bytes = sql.as_bytes();
    let mut names: Vec<String> = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            quote @ (b'\'' | b'"' | b'`') => i = skip_quoted(bytes, i + 1, quote),
            b'[' => i = skip_until(bytes, i + 1, b"]"),
            b'-' if bytes.get(i + 1) == Some(&b'-') => i = skip_until(bytes, i + 2, b"\n"),
            b'/' if bytes.get(i + 1) == Some(&b'*') => i = skip_until(bytes, i + 2, b"*/"),
            b':' | b'@' | b'$' => {
                let start = i + 1;
                let end = start
                    + bytes[start..]
                        .iter()
                        .take_while(|b| b.is_ascii_alphanumeric() || **b == b'_')
                        .count();
                if end > start {
                    let name = &sql[start..end];
                    if !names.iter().any(|n| n == name) {
                        names.push(name.to_string());
                    }
                }
                i = end.max(i + 1);
            }
            _ => i += 1,
        }
    }
    names
}

/// Index just past the closing `quote`; a doubled quote is an escape.
fn skip_quoted(bytes: &[u8], mut i: usize, quote: u8) -> usize {
    while i < bytes.len() {
        if bytes[i] == quote {
            if bytes.get(i + 1) == Some(&quote) {
                i += 2;
                continue;
            }
            return i + 1;
        }
        i += 1;
    }
    i
}

/// Index just past the next `terminator`, or the end of input.
fn skip_until(bytes: &[u8], from: usize, terminator: &[u8]) -> usize {
    bytes[from.min(bytes.len())..]
        .windows(terminator.len())
        .position(|w| w == terminator)
        .map(|p| from + p + terminator.len())
        .unwrap_or(bytes.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_prefixes_in_order() {
        assert_eq!(
            extract_placeholders("SELECT * FROM t WHERE a = :a AND b = @b OR c = $c AND d = :a"),
            ["a", "b", "c"]
        );
    }

    #[test]
    fn test_skips_literals_and_comments() {
        let sql = "SELECT ':no', \"@no\", [$no] -- :no\n FROM t /* @no */ WHERE x = :yes AND y = 'it''s :no'";
        assert_eq!(extract_placeholders(sql), ["yes"]);
    }

    #[test]
    fn test_ignores_anonymous_and_bare_prefix() {
        assert!(extract_placeholders("SELECT ?, ?2, : , @").is_empty());
    }

    #[test]
    fn test_unterminated_comment() {
        assert_eq!(extract_placeholders("SELECT :a /* :b"), ["a"]);
    }
}
