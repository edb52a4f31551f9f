//! Path normalization helpers

use std::borrow::Cow;

/// Repository path utilities. All repository paths are POSIX style.
pub struct PathUtil;

impl PathUtil {
    /// Convert path to POSIX format (forward slashes)
    ///
    /// Returns borrowed input when there is nothing to replace.
    #[inline]
    pub fn to_posix(path: &str) -> Cow<'_, str> {
        if path.contains('\\') {
            Cow::Owned(path.replace('\\', "/"))
        } else {
            Cow::Borrowed(path)
        }
    }

    /// Split path by any separator, skipping empty segments
    #[inline]
    pub fn components(path: &str) -> impl Iterator<Item = &str> {
        path.split(['/', '\\']).filter(|s| !s.is_empty())
    }

    /// Normalize a roster directory value.
    ///
    /// `./students/John/`, `students\John` and `/students/John` all become
    /// `students/John`. `.` segments are dropped, everything else is kept
    /// verbatim (case included).
    pub fn normalize_dir(raw: &str) -> String {
        let posix = Self::to_posix(raw.trim());
        posix
            .split('/')
            .filter(|seg| !seg.is_empty() && *seg != ".")
            .collect::<Vec<_>>()
            .join("/")
    }

    /// Last segment of a path (`students/John` -> `John`)
    #[inline]
    pub fn last_segment(path: &str) -> Option<&str> {
        Self::components(path).last()
    }

    /// Return the remainder of `path` below `dir`, if `path` lies strictly
    /// inside it. Matching is exact and case-sensitive.
    #[inline]
    pub fn strip_dir<'p>(path: &'p str, dir: &str) -> Option<&'p str> {
        path.strip_prefix(dir)?.strip_prefix('/')
    }
}
