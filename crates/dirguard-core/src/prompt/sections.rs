//! Section extraction from task readme files
//!
//! A section is found either between HTML comment markers
//! (`<!-- START: tag -->` ... `<!-- END: tag -->`) or under a `## Header`
//! line, in that order of preference.

use regex::Regex;

/// Where to look for one readme section
#[derive(Debug, Clone, Copy)]
pub struct SectionSpec {
    /// `##` headers to try, in order
    pub headers: &'static [&'static str],
    /// Marker tags to try, in order
    pub tags: &'static [&'static str],
}

/// Work description
pub const DESCRIPTION: SectionSpec = SectionSpec {
    headers: &["Описание"],
    tags: &["description"],
};

/// Grading criteria
pub const CRITERIA: SectionSpec = SectionSpec {
    headers: &["Критерии оценивания (100 баллов)", "Критерии оценивания"],
    tags: &["criteria"],
};

/// Deliverables
pub const ARTIFACTS: SectionSpec = SectionSpec {
    headers: &["Артефакты (что сдаём)", "Артефакты"],
    tags: &["artifacts"],
};

/// Bonus points
pub const BONUSES: SectionSpec = SectionSpec {
    headers: &["Бонусы (+ до 10)", "Бонусы"],
    tags: &["bonuses"],
};

fn marker_regex(tag: &str, keywords: &str) -> Option<Regex> {
    let pattern = format!(
        r"(?i)<!--\s*(?:{})\s*(?:[:\-]\s*|\s+){}\s*-->",
        keywords,
        regex::escape(tag)
    );
    Regex::new(&pattern).ok()
}

fn header_regex(header: &str) -> Option<Regex> {
    Regex::new(&format!(r"(?i)^##\s+{}\s*$", regex::escape(header))).ok()
}

fn is_any_header(line: &str) -> bool {
    line.strip_prefix("##")
        .and_then(|rest| rest.chars().next())
        .is_some_and(char::is_whitespace)
}

/// Text between the first matching START/END marker pair, trimmed
pub fn extract_by_markers<'t>(text: &'t str, tags: &[&str]) -> Option<&'t str> {
    tags.iter().find_map(|tag| {
        let start = marker_regex(tag, "START")?.find(text)?;
        let end = marker_regex(tag, "END|STOP")?.find_at(text, start.end())?;
        Some(text[start.end()..end.start()].trim())
    })
}

/// Lines under the first matching `## Header` up to the next `##` header
pub fn extract_by_headers(text: &str, headers: &[&str]) -> Option<String> {
    let lines: Vec<&str> = text.lines().collect();
    headers.iter().find_map(|header| {
        let re = header_regex(header)?;
        let start = lines.iter().position(|l| re.is_match(l.trim()))? + 1;
        let body: Vec<&str> = lines[start..]
            .iter()
            .take_while(|l| !is_any_header(l))
            .copied()
            .collect();
        Some(body.join("\n").trim().to_string())
    })
}

/// Drop a leading `## Header` repeated inside a marker block
pub fn strip_leading_header(text: &str, headers: &[&str]) -> String {
    let mut lines = text.lines().skip_while(|l| l.trim().is_empty()).peekable();
    let Some(first) = lines.peek().map(|l| l.trim()) else {
        return String::new();
    };

    let repeated = headers
        .iter()
        .filter_map(|h| header_regex(h))
        .any(|re| re.is_match(first));
    if repeated {
        lines.next();
    }

    lines.collect::<Vec<_>>().join("\n").trim().to_string()
}

/// Extract one section, empty when absent
pub fn extract_section(text: &str, section: SectionSpec) -> String {
    match extract_by_markers(text, section.tags) {
        Some(block) if !block.is_empty() => strip_leading_header(block, section.headers),
        _ => extract_by_headers(text, section.headers).unwrap_or_default(),
    }
}
