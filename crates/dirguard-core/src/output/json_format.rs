//! Escaping and JSON helpers for step outputs

/// Escape for GitHub Actions safe output (percent-encoding special chars)
pub fn safe_output_escape(s: &str) -> String {
    s.replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

/// Compact JSON array of strings
pub fn format_json_array<S: AsRef<str>>(values: &[S]) -> String {
    let values: Vec<&str> = values.iter().map(AsRef::as_ref).collect();
    serde_json::to_string(&values).unwrap_or_else(|_| "[]".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_output_escape() {
        assert_eq!(safe_output_escape("hello"), "hello");
        assert_eq!(safe_output_escape("a%b"), "a%25b");
        assert_eq!(safe_output_escape("a\nb"), "a%0Ab");
        assert_eq!(safe_output_escape("a\r\nb"), "a%0D%0Ab");
    }

    #[test]
    fn test_format_json_array() {
        let none: [&str; 0] = [];
        assert_eq!(format_json_array(&none), "[]");
        assert_eq!(
            format_json_array(&["students/A/x.txt", "with\"quote"]),
            r#"["students/A/x.txt","with\"quote"]"#
        );
        let owned = vec!["Задание".to_string()];
        let parsed: Vec<String> = serde_json::from_str(&format_json_array(&owned)).unwrap();
        assert_eq!(parsed, owned);
    }
}
