//! Path pattern compilation and matching.
//!
//! # Grammar
//! - Patterns start with `/`
//! - `{name}` matches one or more characters within a segment
//! - `{name:regex}` matches a segment part against `regex`
//! - A trailing `*` matches the rest of the path, including nothing
//! - Everything else is literal; matching covers the whole path
//! - The request target `*` matches only `/*`
//!
//! # Design Decisions
//! - Placeholder names are parsed and kept but never substituted anywhere
//! - Compiled once at startup into a single anchored regex
//! - Placeholder regexes are checked against their captured segment text,
//!   so they can never span a `/`

use regex::Regex;

/// Error compiling a single path pattern.
#[derive(Debug, thiserror::Error)]
pub enum PatternError {
    #[error("pattern must start with '/'")]
    MissingLeadingSlash,

    #[error("unbalanced '{{' or '}}' at byte {0}")]
    Unbalanced(usize),

    #[error("placeholder at byte {0} has no name")]
    EmptyPlaceholder(usize),

    #[error("placeholder '{name}' has an invalid regex: {source}")]
    InvalidRegex {
        name: String,
        #[source]
        source: regex::Error,
    },

    #[error("'*' is only allowed at the end of a pattern")]
    MisplacedWildcard,

    #[error("pattern does not compile: {0}")]
    Compile(#[source] regex::Error),
}

/// A compiled path pattern.
#[derive(Debug, Clone)]
pub struct PathPattern {
    source: String,
    shape: String,
    matcher: Regex,
    placeholders: Vec<Placeholder>,
}

#[derive(Debug, Clone)]
struct Placeholder {
    name: String,
    check: Option<Regex>,
}

impl PathPattern {
    /// Compile a pattern string.
    pub fn parse(source: &str) -> Result<Self, PatternError> {
        if !source.starts_with('/') {
            return Err(PatternError::MissingLeadingSlash);
        }

        let mut expr = String::from("(?s)^");
        let mut placeholders = Vec::new();
        let mut literal = String::new();
        let mut shape = String::new();
        let bytes = source.as_bytes();
        let mut i = 0;

        while i < bytes.len() {
            match bytes[i] {
                b'{' => {
                    let end = closing_brace(source, i)?;
                    expr.push_str(&regex::escape(&literal));
                    literal.clear();

                    let inner = &source[i + 1..end];
                    let (name, pattern) = match inner.split_once(':') {
                        Some((name, pattern)) => (name, Some(pattern)),
                        None => (inner, None),
                    };
                    if name.is_empty() {
                        return Err(PatternError::EmptyPlaceholder(i));
                    }
                    let check = pattern
                        .map(|pattern| {
                            Regex::new(&format!("^(?:{pattern})$")).map_err(|source| {
                                PatternError::InvalidRegex {
                                    name: name.to_string(),
                                    source,
                                }
                            })
                        })
                        .transpose()?;

                    match pattern {
                        Some(pattern) => {
                            shape.push_str("{:");
                            shape.push_str(pattern);
                            shape.push('}');
                        }
                        None => shape.push_str("{}"),
                    }
                    expr.push_str("([^/]+)");
                    placeholders.push(Placeholder {
                        name: name.to_string(),
                        check,
                    });
                    i = end + 1;
                }
                b'}' => return Err(PatternError::Unbalanced(i)),
                b'*' => {
                    if i + 1 != bytes.len() {
                        return Err(PatternError::MisplacedWildcard);
                    }
                    expr.push_str(&regex::escape(&literal));
                    literal.clear();
                    expr.push_str(".*");
                    shape.push('*');
                    i += 1;
                }
                _ => {
                    let next = source[i..]
                        .find(|c: char| matches!(c, '{' | '}' | '*'))
                        .map_or(source.len(), |offset| i + offset);
                    literal.push_str(&source[i..next]);
                    shape.push_str(&source[i..next]);
                    i = next;
                }
            }
        }

        expr.push_str(&regex::escape(&literal));
        expr.push('$');

        let matcher = Regex::new(&expr).map_err(PatternError::Compile)?;

        Ok(Self {
            source: source.to_string(),
            shape,
            matcher,
            placeholders,
        })
    }

    /// Returns true if `path` has this pattern's shape.
    ///
    /// The asterisk-form target `*` (as in `OPTIONS *`) is matched only by
    /// the catch-all pattern `/*`.
    pub fn matches(&self, path: &str) -> bool {
        if path == "*" {
            return self.shape == "/*";
        }

        let Some(captures) = self.matcher.captures(path) else {
            return false;
        };

        self.placeholders.iter().enumerate().all(|(index, placeholder)| {
            match (&placeholder.check, captures.get(index + 1)) {
                (Some(check), Some(segment)) => check.is_match(segment.as_str()),
                (None, Some(_)) => true,
                (_, None) => false,
            }
        })
    }

    /// The pattern as written in configuration.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// The pattern with placeholder names removed. Patterns with equal
    /// shapes match exactly the same paths.
    pub fn shape(&self) -> &str {
        &self.shape
    }

    /// Placeholder names in order of appearance.
    pub fn placeholder_names(&self) -> impl Iterator<Item = &str> {
        self.placeholders.iter().map(|p| p.name.as_str())
    }
}

/// Byte index of the `}` closing the `{` at `open`, honoring nested braces
/// inside placeholder regexes such as `{code:[0-9]{3}}`.
fn closing_brace(source: &str, open: usize) -> Result<usize, PatternError> {
    let mut depth = 0usize;
    for (offset, byte) in source.as_bytes()[open..].iter().enumerate() {
        match byte {
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Ok(open + offset);
                }
            }
            _ => {}
        }
    }
    Err(PatternError::Unbalanced(open))
}
