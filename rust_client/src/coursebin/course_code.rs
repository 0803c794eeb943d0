//! Course code checks for user input such as `csci-356` or `CSCI 356L`.

use once_cell::sync::Lazy;
use regex::Regex;

static COURSE_CODE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"([a-zA-Z]{2,4})([\W_]*)(\d{1,3}[a-zA-Z]?)").unwrap_or_else(|e| {
        unreachable!("course code pattern is valid: {}", e)
    })
});

/// Result of checking a typed course code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CourseCodeCheck {
    /// Nothing typed yet
    Empty,
    /// Already in `ABC-123` form
    Canonical,
    /// Recognisable, but spelled differently; carries the canonical spelling
    Suggest(String),
    /// No course code found
    Unrecognized,
}

pub fn check(text: &str) -> CourseCodeCheck {
    if text.is_empty() {
        return CourseCodeCheck::Empty;
    }
    match COURSE_CODE.captures(text) {
        Some(caps) => {
            if &caps[2] == "-" {
                CourseCodeCheck::Canonical
            } else {
                CourseCodeCheck::Suggest(format!("{}-{}", &caps[1], &caps[3]))
            }
        }
        None => CourseCodeCheck::Unrecognized,
    }
}

/// Canonical spelling for `text` when it differs from what was typed.
pub fn suggest(text: &str) -> Option<String> {
    match check(text) {
        CourseCodeCheck::Suggest(code) => Some(code),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_codes() {
        assert_eq!(check("csci-356"), CourseCodeCheck::Canonical);
        assert_eq!(check("EE-109L"), CourseCodeCheck::Canonical);
        assert_eq!(check(""), CourseCodeCheck::Empty);
    }

    #[test]
    fn test_suggestions() {
        assert_eq!(suggest("csci356"), Some("csci-356".to_string()));
        assert_eq!(suggest("CSCI 356"), Some("CSCI-356".to_string()));
        assert_eq!(suggest("math__225a"), Some("math-225a".to_string()));
        assert_eq!(suggest("csci-356"), None);
    }

    #[test]
    fn test_unrecognized() {
        assert_eq!(check("hello"), CourseCodeCheck::Unrecognized);
        assert_eq!(suggest("12345"), None);
    }
}
