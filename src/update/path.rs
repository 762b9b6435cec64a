//! Property path segments.

use crate::schema::{KEY_MARKER, PathError};

/// One resolution step of a dotted path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathStep<'a> {
    /// Plain property name.
    Property(&'a str),
    /// `Property.$key`: element lookup through the property's keyed accessor.
    Keyed { property: &'a str, key: &'a str },
}

/// Split a dotted path into steps.
///
/// A `$`-prefixed segment folds into the preceding property as a keyed
/// lookup; its key is trimmed. A key segment with no property before it,
/// or an empty segment, makes the path incomplete.
pub fn parse_path(path: &str) -> Result<Vec<PathStep<'_>>, PathError> {
    let incomplete = || PathError::Incomplete(path.to_string());
    let mut segments = path.split('.').peekable();
    let mut steps = Vec::new();

    while let Some(segment) = segments.next() {
        if segment.is_empty() || segment.starts_with(KEY_MARKER) {
            return Err(incomplete());
        }
        match segments.next_if(|next| next.starts_with(KEY_MARKER)) {
            Some(key) => steps.push(PathStep::Keyed {
                property: segment,
                key: key[KEY_MARKER.len_utf8()..].trim(),
            }),
            None => steps.push(PathStep::Property(segment)),
        }
    }
    Ok(steps)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_segments() {
        assert_eq!(
            parse_path("Address.City").unwrap(),
            vec![PathStep::Property("Address"), PathStep::Property("City")]
        );
    }

    #[test]
    fn test_keyed_segment() {
        assert_eq!(
            parse_path("Items.$ 42.Title").unwrap(),
            vec![
                PathStep::Keyed {
                    property: "Items",
                    key: "42"
                },
                PathStep::Property("Title"),
            ]
        );
    }

    #[test]
    fn test_malformed_paths() {
        assert!(parse_path("").is_err());
        assert!(parse_path("A..B").is_err());
        assert!(parse_path("$1.Title").is_err());
        assert!(parse_path("Items.$1.$2").is_err());
    }
}
