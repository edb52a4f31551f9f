//! Task directory name parsing

use std::fmt;

const TASK_LITERAL: &[u8] = b"task_";

/// A `task_NN` path segment.
///
/// Matching is purely lexical: the `task_` literal is compared ASCII
/// case-insensitively and must be followed by exactly two ASCII digits.
/// No catalog lookup happens here, so `task_37` is valid even when no such
/// assignment exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskDir<'a> {
    segment: &'a str,
    number: u8,
}

impl<'a> TaskDir<'a> {
    /// Parse a single path segment
    pub fn parse(segment: &'a str) -> Option<Self> {
        let bytes = segment.as_bytes();
        if bytes.len() != TASK_LITERAL.len() + 2 {
            return None;
        }
        let (literal, digits) = bytes.split_at(TASK_LITERAL.len());
        if !literal.eq_ignore_ascii_case(TASK_LITERAL) {
            return None;
        }
        if !digits.iter().all(u8::is_ascii_digit) {
            return None;
        }
        Some(Self {
            segment,
            number: (digits[0] - b'0') * 10 + (digits[1] - b'0'),
        })
    }

    /// The segment as written in the path (`Task_03` stays `Task_03`)
    #[inline]
    pub fn as_str(&self) -> &'a str {
        self.segment
    }

    /// Task number (`task_07` -> 7)
    #[inline]
    pub fn number(&self) -> u8 {
        self.number
    }
}

impl fmt::Display for TaskDir<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.segment)
    }
}
