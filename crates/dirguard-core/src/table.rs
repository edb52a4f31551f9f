//! Markdown roster table for the course README

use crate::error::Result;
use std::path::Path;

/// Opening marker of the generated block
pub const TABLE_START: &str = "<!-- STUDENTS_TABLE_START -->";

/// Closing marker of the generated block
pub const TABLE_END: &str = "<!-- STUDENTS_TABLE_END -->";

/// Mismatching rows reported individually
const MAX_REPORTED_MISMATCHES: usize = 20;

const USERNAME_HEADERS: &[&str] = &["github username", "github_username", "github"];

/// A CSV row whose width differs from the header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnMismatch {
    /// 1-based CSV line
    pub line: u64,
    /// Number of cells found
    pub columns: usize,
}

/// Rendered table plus the rows that had to be normalized
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RosterTable {
    /// Markdown table (empty for an empty CSV)
    pub markdown: String,
    /// Header width
    pub expected_columns: usize,
    /// Rows padded or truncated to the header width
    pub mismatches: Vec<ColumnMismatch>,
}

fn escape_cell(cell: &str) -> String {
    cell.replace('|', "\\|")
}

/// Render a username cell as a profile link.
///
/// An existing Markdown link is kept. Otherwise brackets, a `github.com/`
/// URL prefix and a leading `@` are removed and the name is cut at the first
/// character that cannot appear in a GitHub login. Returns `None` when
/// nothing usable remains.
pub fn github_link(cell: &str) -> Option<String> {
    let cell = cell.trim();
    if cell.is_empty() {
        return None;
    }
    if cell.contains("](") {
        return Some(cell.to_string());
    }

    let mut name = cell.replace(['[', ']'], "").trim().to_string();
    if name.starts_with("http") || name.contains("github.com/") {
        if let Some(tail) = name.rsplit("github.com/").next() {
            name = tail.trim_end_matches('/').trim().to_string();
        }
    }
    let name = name.strip_prefix('@').unwrap_or(&name);
    let login: String = name
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric() || *c == '-')
        .collect();
    if login.is_empty() {
        return None;
    }
    Some(format!("[{0}](https://github.com/{0})", login))
}

/// Render roster CSV text as a Markdown table
pub fn render_table(csv_text: &str) -> Result<RosterTable> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(csv_text.as_bytes());

    let mut rows = rdr.records();
    let Some(header) = rows.next().transpose()? else {
        return Ok(RosterTable::default());
    };
    let width = header.len();

    let username_col = header.iter().position(|h| {
        let h = h.trim_start_matches('\u{feff}').trim().to_lowercase();
        USERNAME_HEADERS.contains(&h.as_str())
    });

    let mut lines = Vec::with_capacity(2);
    lines.push(format!(
        "| {} |",
        header.iter().map(escape_cell).collect::<Vec<_>>().join(" | ")
    ));
    lines.push(format!("| {} |", vec!["---"; width].join(" | ")));

    let mut mismatches = Vec::new();
    for (i, record) in rows.enumerate() {
        let record = record?;
        if record.len() != width {
            mismatches.push(ColumnMismatch {
                line: record.position().map(|p| p.line()).unwrap_or(i as u64 + 2),
                columns: record.len(),
            });
        }

        let mut cells: Vec<String> = (0..width)
            .map(|c| escape_cell(record.get(c).unwrap_or_default()))
            .collect();
        if let Some(col) = username_col {
            if let Some(link) = github_link(&cells[col]) {
                cells[col] = link;
            }
        }
        lines.push(format!("| {} |", cells.join(" | ")));
    }

    if !mismatches.is_empty() {
        tracing::warn!(
            expected = width,
            "CSV column count mismatch, rows will be normalized"
        );
        for m in mismatches.iter().take(MAX_REPORTED_MISMATCHES) {
            tracing::warn!("  line {}: {} columns", m.line, m.columns);
        }
        if mismatches.len() > MAX_REPORTED_MISMATCHES {
            tracing::warn!("  ... and {} more", mismatches.len() - MAX_REPORTED_MISMATCHES);
        }
    }

    Ok(RosterTable {
        markdown: lines.join("\n"),
        expected_columns: width,
        mismatches,
    })
}

/// Replace the marked block in `readme`, or append one when markers are absent
pub fn splice_table(readme: &str, table: &str) -> String {
    let block = format!("{}\n\n{}\n\n{}", TABLE_START, table, TABLE_END);
    if let Some((before, rest)) = readme.split_once(TABLE_START) {
        if let Some((_, after)) = rest.split_once(TABLE_END) {
            return format!("{}{}{}", before, block, after);
        }
    }
    format!("{}\n\n{}\n", readme, block)
}

/// Regenerate the table of `readme_path` from `csv_path`
pub fn update_readme(csv_path: &Path, readme_path: &Path) -> Result<RosterTable> {
    let csv_text = std::fs::read_to_string(csv_path)?;
    let table = render_table(&csv_text)?;
    let readme = std::fs::read_to_string(readme_path)?;
    std::fs::write(readme_path, splice_table(&readme, &table.markdown))?;
    tracing::info!(
        readme = %readme_path.display(),
        csv = %csv_path.display(),
        "updated students table"
    );
    Ok(table)
}
