//! Student roster loaded from `students/students.csv`
//!
//! The roster maps GitHub usernames to the single directory each student may
//! modify. It is built once per invocation and passed explicitly to the
//! classifier.

use crate::error::{Error, Result};
use crate::platform::PathUtil;
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

/// Header names accepted for the username column (compared case-insensitively)
const USERNAME_HEADERS: &[&str] = &["github username", "github_username", "github"];
const DIRECTORY_HEADERS: &[&str] = &["directory"];
const NAME_HEADERS: &[&str] = &["namelatin"];
const VARIANT_HEADERS: &[&str] = &["вариант", "variant"];

/// One roster row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudentRecord {
    /// GitHub login, matched case-sensitively
    pub username: String,
    /// Allowed directory, POSIX, no leading `./`, no trailing slash
    pub directory: String,
    /// Latin transliteration of the student name
    pub name_latin: Option<String>,
    /// Assignment variant number as written in the roster
    pub variant: Option<String>,
}

impl StudentRecord {
    /// Create a record with just a username and a directory
    pub fn new(username: impl Into<String>, directory: &str) -> Self {
        Self {
            username: username.into(),
            directory: PathUtil::normalize_dir(directory),
            name_latin: None,
            variant: None,
        }
    }

    /// Name of the student folder (last directory segment)
    pub fn folder(&self) -> Option<&str> {
        PathUtil::last_segment(&self.directory)
    }
}

/// A roster row that was skipped
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterWarning {
    /// 1-based CSV line (header is line 1)
    pub line: u64,
    /// Why the row was skipped
    pub reason: String,
}

/// Username -> allowed directory mapping
#[derive(Debug, Clone, Default)]
pub struct Roster {
    records: Vec<StudentRecord>,
    by_username: HashMap<String, usize>,
    /// Rows with a directory but no usable username, still visible to
    /// `find_by_student`
    unmapped: Vec<StudentRecord>,
}

/// Column positions resolved from the header row
struct Columns {
    username: Option<usize>,
    directory: usize,
    name_latin: Option<usize>,
    variant: Option<usize>,
}

impl Columns {
    fn resolve(headers: &csv::StringRecord) -> Result<Self> {
        let find = |names: &[&str]| {
            headers.iter().position(|h| {
                let h = h.trim_start_matches('\u{feff}').trim().to_lowercase();
                names.contains(&h.as_str())
            })
        };

        Ok(Self {
            username: find(USERNAME_HEADERS),
            directory: find(DIRECTORY_HEADERS)
                .ok_or_else(|| Error::Roster("missing 'Directory' column".to_string()))?,
            name_latin: find(NAME_HEADERS),
            variant: find(VARIANT_HEADERS),
        })
    }
}

fn non_empty(record: &csv::StringRecord, idx: Option<usize>) -> Option<String> {
    idx.and_then(|i| record.get(i))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

impl Roster {
    /// Parse a roster from any CSV reader.
    ///
    /// Rows without a username or a directory, rows that are not valid UTF-8
    /// and duplicate usernames are reported as warnings; they never fail the
    /// whole load. Duplicate usernames keep the first row.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<(Self, Vec<RosterWarning>)> {
        Self::parse(reader, true)
    }

    /// Like [`Roster::from_csv_reader`], but a roster without a username
    /// column is accepted. Every row then lands in the unmapped set, which is
    /// enough for variant lookups by student folder.
    pub fn from_csv_reader_lenient<R: Read>(reader: R) -> Result<(Self, Vec<RosterWarning>)> {
        Self::parse(reader, false)
    }

    fn parse<R: Read>(reader: R, require_username: bool) -> Result<(Self, Vec<RosterWarning>)> {
        let mut rdr = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let columns = Columns::resolve(rdr.headers()?)?;
        if require_username && columns.username.is_none() {
            return Err(Error::Roster("missing 'Github Username' column".to_string()));
        }
        let mut roster = Roster::default();
        let mut warnings = Vec::new();

        for (i, row) in rdr.records().enumerate() {
            let record = match row {
                Ok(record) => record,
                Err(e) => {
                    if let csv::ErrorKind::Utf8 { pos, .. } = e.kind() {
                        warnings.push(RosterWarning {
                            line: pos.as_ref().map(|p| p.line()).unwrap_or(i as u64 + 2),
                            reason: "row is not valid UTF-8".to_string(),
                        });
                        continue;
                    }
                    return Err(e.into());
                }
            };
            let line = record.position().map(|p| p.line()).unwrap_or(i as u64 + 2);

            let username = non_empty(&record, columns.username);
            let directory = non_empty(&record, Some(columns.directory))
                .map(|d| PathUtil::normalize_dir(&d))
                .filter(|d| !d.is_empty());
            let Some(directory) = directory else {
                warnings.push(RosterWarning {
                    line,
                    reason: format!(
                        "missing directory for '{}'",
                        username.as_deref().unwrap_or_default()
                    ),
                });
                continue;
            };

            let student = StudentRecord {
                username: username.unwrap_or_default(),
                directory,
                name_latin: non_empty(&record, columns.name_latin),
                variant: non_empty(&record, columns.variant),
            };
            if student.username.is_empty() {
                if columns.username.is_some() {
                    warnings.push(RosterWarning {
                        line,
                        reason: "missing GitHub username".to_string(),
                    });
                }
                roster.unmapped.push(student);
                continue;
            }
            if let Err(warning) = roster.insert(student, line) {
                warnings.push(warning);
            }
        }

        for w in &warnings {
            tracing::warn!(line = w.line, "skipping roster row: {}", w.reason);
        }

        Ok((roster, warnings))
    }

    /// Parse a roster from CSV text
    pub fn from_csv_str(text: &str) -> Result<(Self, Vec<RosterWarning>)> {
        Self::from_csv_reader(text.as_bytes())
    }

    /// Load a roster file
    pub fn from_csv_path(path: &Path) -> Result<(Self, Vec<RosterWarning>)> {
        let file = std::fs::File::open(path).map_err(|e| {
            Error::Roster(format!("failed to open '{}': {}", path.display(), e))
        })?;
        Self::from_csv_reader(std::io::BufReader::new(file))
    }

    /// Load a roster file for student lookups only; see
    /// [`Roster::from_csv_reader_lenient`]
    pub fn from_csv_path_lenient(path: &Path) -> Result<(Self, Vec<RosterWarning>)> {
        let file = std::fs::File::open(path).map_err(|e| {
            Error::Roster(format!("failed to open '{}': {}", path.display(), e))
        })?;
        Self::from_csv_reader_lenient(std::io::BufReader::new(file))
    }

    fn insert(&mut self, student: StudentRecord, line: u64) -> std::result::Result<(), RosterWarning> {
        if self.by_username.contains_key(&student.username) {
            let reason = format!("duplicate username '{}'", student.username);
            self.unmapped.push(student);
            return Err(RosterWarning { line, reason });
        }
        self.by_username
            .insert(student.username.clone(), self.records.len());
        self.records.push(student);
        Ok(())
    }

    /// Exact, case-sensitive username lookup
    pub fn get(&self, username: &str) -> Option<&StudentRecord> {
        self.by_username.get(username).map(|&i| &self.records[i])
    }

    /// Allowed directory of a username
    #[inline]
    pub fn allowed_dir(&self, username: &str) -> Option<&str> {
        self.get(username).map(|r| r.directory.as_str())
    }

    /// Find a student by folder name or `NameLatin`.
    ///
    /// Mapped rows are searched first, then rows that had no usable username.
    pub fn find_by_student(&self, student: &str) -> Option<&StudentRecord> {
        self.records
            .iter()
            .chain(&self.unmapped)
            .find(|r| r.folder() == Some(student) || r.name_latin.as_deref() == Some(student))
    }

    /// Records in file order
    pub fn records(&self) -> &[StudentRecord] {
        &self.records
    }

    /// Number of students
    #[inline]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// `true` when no student is mapped
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl FromIterator<StudentRecord> for Roster {
    fn from_iter<I: IntoIterator<Item = StudentRecord>>(iter: I) -> Self {
        let mut roster = Roster::default();
        for (i, student) in iter.into_iter().enumerate() {
            let _ = roster.insert(student, i as u64 + 2);
        }
        roster
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = "NameLatin,Directory,Github Username,Вариант\n\
                       John,./students/John,johnsmith,3\n\
                       Anna,students/Anna/,anna-k,\n";

    #[test]
    fn test_load_students_map() {
        let (roster, warnings) = Roster::from_csv_str(CSV).unwrap();
        assert!(warnings.is_empty());
        assert_eq!(roster.len(), 2);
        assert_eq!(roster.allowed_dir("johnsmith"), Some("students/John"));
        assert_eq!(roster.allowed_dir("anna-k"), Some("students/Anna"));
        assert_eq!(roster.get("johnsmith").unwrap().variant.as_deref(), Some("3"));
        assert_eq!(roster.get("anna-k").unwrap().variant, None);
    }

    #[test]
    fn test_lookup_is_case_sensitive() {
        let (roster, _) = Roster::from_csv_str(CSV).unwrap();
        assert!(roster.get("JohnSmith").is_none());
    }

    #[test]
    fn test_header_aliases_and_bom() {
        let text = "\u{feff}github,DIRECTORY\nuser1,students/One\n";
        let (roster, _) = Roster::from_csv_str(text).unwrap();
        assert_eq!(roster.allowed_dir("user1"), Some("students/One"));
    }

    #[test]
    fn test_missing_columns_is_error() {
        let err = Roster::from_csv_str("NameLatin,Directory\nJohn,students/John\n").unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Roster);
        assert!(Roster::from_csv_str("Github Username\njohn\n").is_err());
    }

    #[test]
    fn test_malformed_rows_are_skipped_with_warning() {
        let text = "NameLatin,Directory,Github Username\n\
                    John,students/John,johnsmith\n\
                    NoDir,,nodir\n\
                    NoUser,students/NoUser,\n\
                    Short\n";
        let (roster, warnings) = Roster::from_csv_str(text).unwrap();
        assert_eq!(roster.len(), 1);
        assert_eq!(warnings.len(), 3);
        assert_eq!(warnings[0].line, 3);
        assert!(warnings[0].reason.contains("nodir"));
        assert_eq!(warnings[1].line, 4);
    }

    #[test]
    fn test_undecodable_row_is_skipped_with_warning() {
        let bytes = &b"Github Username,Directory\ngood,students/Good\nbad\xff,students/Bad\n"[..];
        let (roster, warnings) = Roster::from_csv_reader(bytes).unwrap();
        assert_eq!(roster.len(), 1);
        assert_eq!(roster.allowed_dir("good"), Some("students/Good"));
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].line, 3);
        assert!(warnings[0].reason.contains("UTF-8"));
    }

    #[test]
    fn test_rows_without_username_stay_findable() {
        let text = "NameLatin,Directory,Github Username,Вариант\n\
                    Ivanov,./students/Ivanov,,7\n\
                    Petrov,students/Petrov,dup,1\n\
                    Sidorov,students/Sidorov,dup,2\n";
        let (roster, warnings) = Roster::from_csv_str(text).unwrap();
        assert_eq!(roster.len(), 1);
        assert_eq!(warnings.len(), 2);
        assert!(roster.get("").is_none());

        let ivanov = roster.find_by_student("Ivanov").unwrap();
        assert_eq!(ivanov.variant.as_deref(), Some("7"));
        assert_eq!(roster.find_by_student("Sidorov").unwrap().variant.as_deref(), Some("2"));
    }

    #[test]
    fn test_lenient_load_without_username_column() {
        let text = "NameLatin,Directory,Вариант\nIvanov,students/Ivanov,4\n";
        assert!(Roster::from_csv_str(text).is_err());

        let (roster, warnings) = Roster::from_csv_reader_lenient(text.as_bytes()).unwrap();
        assert!(warnings.is_empty());
        assert!(roster.is_empty());
        assert_eq!(roster.find_by_student("Ivanov").unwrap().variant.as_deref(), Some("4"));
    }

    #[test]
    fn test_duplicate_username_keeps_first() {
        let text = "Directory,Github Username\nstudents/A,dup\nstudents/B,dup\n";
        let (roster, warnings) = Roster::from_csv_str(text).unwrap();
        assert_eq!(roster.allowed_dir("dup"), Some("students/A"));
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].reason.contains("duplicate"));
    }

    #[test]
    fn test_find_by_student() {
        let (roster, _) = Roster::from_csv_str(CSV).unwrap();
        assert_eq!(roster.find_by_student("John").unwrap().username, "johnsmith");
        assert_eq!(roster.find_by_student("Anna").unwrap().username, "anna-k");
        assert!(roster.find_by_student("Nobody").is_none());
    }

    #[test]
    fn test_from_iter() {
        let roster: Roster = vec![
            StudentRecord::new("a", "./students/A/"),
            StudentRecord::new("b", "students\\B"),
        ]
        .into_iter()
        .collect();
        assert_eq!(roster.allowed_dir("a"), Some("students/A"));
        assert_eq!(roster.allowed_dir("b"), Some("students/B"));
    }

    #[test]
    fn test_from_csv_path() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("students.csv");
        std::fs::write(&path, CSV).unwrap();
        let (roster, _) = Roster::from_csv_path(&path).unwrap();
        assert_eq!(roster.len(), 2);
        assert!(Roster::from_csv_path(&dir.path().join("nope.csv")).is_err());
    }
}
