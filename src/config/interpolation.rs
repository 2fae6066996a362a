//! Placeholder templating for option values.
//!
//! Option values may embed placeholders naming other options of the same
//! step, using `{name}` syntax.
//!
//! # Syntax
//!
//! - `{option_name}` - replaced with the option's value
//! - `{{` and `}}` - produce literal `{` and `}` in output
//! - a `{` without a closing `}` is kept as literal text
//!
//! # Example
//!
//! ```yaml
//! url: "https://example.org/{package_name}-{version}.tar.gz"
//! # With package_name="zlib", version="1.2.5":
//! #   https://example.org/zlib-1.2.5.tar.gz
//! ```

use std::collections::HashSet;

/// A segment of a templated string.
#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    /// Literal text
    Literal(String),
    /// Placeholder: {name}
    Placeholder(String),
}

/// Parse a string containing `{name}` placeholders.
pub fn parse_placeholders(input: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut chars = input.chars().peekable();
    let mut current_literal = String::new();

    while let Some(c) = chars.next() {
        match c {
            '{' if chars.peek() == Some(&'{') => {
                chars.next();
                current_literal.push('{');
            }
            '}' if chars.peek() == Some(&'}') => {
                chars.next();
                current_literal.push('}');
            }
            '{' => {
                let mut name = String::new();
                let mut closed = false;
                while let Some(&next) = chars.peek() {
                    chars.next();
                    if next == '}' {
                        closed = true;
                        break;
                    }
                    name.push(next);
                }

                if closed && is_placeholder_name(&name) {
                    if !current_literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut current_literal)));
                    }
                    segments.push(Segment::Placeholder(name));
                } else {
                    current_literal.push('{');
                    current_literal.push_str(&name);
                    if closed {
                        current_literal.push('}');
                    }
                }
            }
            _ => current_literal.push(c),
        }
    }

    if !current_literal.is_empty() {
        segments.push(Segment::Literal(current_literal));
    }

    segments
}

fn is_placeholder_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// Extract all placeholder names from a templated string.
pub fn extract_placeholders(input: &str) -> HashSet<String> {
    parse_placeholders(input)
        .into_iter()
        .filter_map(|seg| match seg {
            Segment::Placeholder(name) => Some(name),
            _ => None,
        })
        .collect()
}

/// Check if a string contains any placeholder.
pub fn has_placeholders(input: &str) -> bool {
    parse_placeholders(input)
        .iter()
        .any(|seg| matches!(seg, Segment::Placeholder(_)))
}

/// Fill every placeholder in `input` using `lookup`.
///
/// # Errors
///
/// Returns the name of the first placeholder `lookup` cannot fill.
pub fn render<F>(input: &str, mut lookup: F) -> std::result::Result<String, String>
where
    F: FnMut(&str) -> Option<String>,
{
    let mut result = String::new();

    for segment in parse_placeholders(input) {
        match segment {
            Segment::Literal(text) => result.push_str(&text),
            Segment::Placeholder(name) => match lookup(&name) {
                Some(value) => result.push_str(&value),
                None => return Err(name),
            },
        }
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn parse_literal_only() {
        let result = parse_placeholders("hello world");
        assert_eq!(result, vec![Segment::Literal("hello world".to_string())]);
    }

    #[test]
    fn parse_placeholder_with_surrounding_text() {
        let result = parse_placeholders("{package_name}-{version}.tar.gz");
        assert_eq!(
            result,
            vec![
                Segment::Placeholder("package_name".to_string()),
                Segment::Literal("-".to_string()),
                Segment::Placeholder("version".to_string()),
                Segment::Literal(".tar.gz".to_string()),
            ]
        );
    }

    #[test]
    fn parse_escaped_braces() {
        let result = parse_placeholders("{{not_a_placeholder}}");
        assert_eq!(
            result,
            vec![Segment::Literal("{not_a_placeholder}".to_string())]
        );
    }

    #[test]
    fn parse_unclosed_brace_is_literal() {
        let result = parse_placeholders("flags {incomplete");
        assert_eq!(
            result,
            vec![Segment::Literal("flags {incomplete".to_string())]
        );
    }

    #[test]
    fn parse_non_identifier_braces_are_literal() {
        let result = parse_placeholders("-DX={a b}");
        assert_eq!(result, vec![Segment::Literal("-DX={a b}".to_string())]);
    }

    #[test]
    fn parse_empty_string() {
        assert!(parse_placeholders("").is_empty());
    }

    #[test]
    fn extract_placeholders_returns_unique_names() {
        let names = extract_placeholders("{a}/{b}/{a}");
        assert_eq!(names.len(), 2);
        assert!(names.contains("a"));
        assert!(names.contains("b"));
    }

    #[test]
    fn has_placeholders_ignores_escapes() {
        assert!(has_placeholders("{x}"));
        assert!(!has_placeholders("{{x}}"));
        assert!(!has_placeholders("plain"));
    }

    #[test]
    fn render_fills_placeholders() {
        let values = vars(&[("a", "foo"), ("b", "1.0")]);
        let result = render("{a}-{b}", |name| values.get(name).cloned()).unwrap();
        assert_eq!(result, "foo-1.0");
    }

    #[test]
    fn render_reports_first_missing_name() {
        let values = vars(&[("a", "foo")]);
        let result = render("{a}-{b}", |name| values.get(name).cloned());
        assert_eq!(result, Err("b".to_string()));
    }

    #[test]
    fn render_preserves_escaped() {
        let result = render("{{literal}}", |_| None).unwrap();
        assert_eq!(result, "{literal}");
    }
}
