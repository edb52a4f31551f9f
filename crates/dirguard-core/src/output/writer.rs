//! `$GITHUB_OUTPUT` writer

use super::json_format::safe_output_escape;
use crate::error::Result;
use std::io::Write;
use std::path::Path;

/// Heredoc delimiter for multiline values
pub const DELIMITER: &str = "DIRGUARD_EOF";

/// One step output
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputValue {
    /// Written as `name=value`
    Line(String),
    /// Written as a `name<<DELIM` block, escaped
    Block(String),
}

/// Render outputs in the `$GITHUB_OUTPUT` file syntax
pub fn format_outputs(outputs: &[(&str, OutputValue)]) -> String {
    let mut buf = String::new();
    for (name, value) in outputs {
        match value {
            OutputValue::Line(v) => {
                buf.push_str(&format!("{}={}\n", name, safe_output_escape(v)));
            }
            OutputValue::Block(v) => {
                buf.push_str(&format!("{}<<{}\n", name, DELIMITER));
                buf.push_str(&safe_output_escape(v));
                buf.push('\n');
                buf.push_str(DELIMITER);
                buf.push('\n');
            }
        }
    }
    buf
}

/// Append outputs to the file at `path`
pub fn append_outputs(path: &Path, outputs: &[(&str, OutputValue)]) -> Result<()> {
    let mut f = std::fs::OpenOptions::new()
        .append(true)
        .create(true)
        .open(path)?;
    f.write_all(format_outputs(outputs).as_bytes())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_format_outputs() {
        let text = format_outputs(&[
            ("exit_code", OutputValue::Line("2".into())),
            ("violations", OutputValue::Block("[\"a\",\n\"b\"]".into())),
        ]);
        assert_eq!(
            text,
            "exit_code=2\nviolations<<DIRGUARD_EOF\n[\"a\",%0A\"b\"]\nDIRGUARD_EOF\n"
        );
    }

    #[test]
    fn test_append_outputs() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("github_output");
        std::fs::write(&path, "previous=1\n").unwrap();
        append_outputs(&path, &[("verdict", OutputValue::Line("approved".into()))]).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "previous=1\nverdict=approved\n");
    }
}
