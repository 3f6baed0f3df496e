//! Path pattern matching.

use regex::Regex;

use crate::error::{Result, RouterError};
use crate::request::PathParams;

/// A compiled path pattern for matching URLs.
///
/// Pattern syntax:
/// - `/prompts` - literal path, matched byte for byte
/// - `/prompts/{id}` - `{id}` captures one or more non-slash characters
///
/// Trailing slashes are ignored on both the pattern and the matched path,
/// so `/` matches the empty path and `/prompts/` matches `/prompts`.
#[derive(Debug, Clone)]
pub struct PathPattern {
    /// The original pattern string.
    pattern: String,
    /// Compiled, anchored regex.
    regex: Regex,
    /// Parameter names in order of appearance.
    param_names: Vec<String>,
}

impl PathPattern {
    /// Parses and compiles a path pattern.
    ///
    /// # Example
    ///
    /// ```
    /// use quill_router::PathPattern;
    ///
    /// let pattern = PathPattern::parse("/templates/{template_id}/prompts/{id}").unwrap();
    /// let params = pattern.match_path("/templates/3/prompts/9").unwrap();
    /// assert_eq!(params.get("template_id"), Some("3"));
    /// assert_eq!(params.get("id"), Some("9"));
    /// ```
    pub fn parse(pattern: &str) -> Result<Self> {
        let invalid = |reason: &str| RouterError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: reason.to_string(),
        };

        let mut param_names: Vec<String> = Vec::new();
        let mut regex_str = String::from("^");
        let mut rest = pattern.trim_end_matches('/');

        while let Some(open) = rest.find('{') {
            regex_str.push_str(&regex::escape(&rest[..open]));

            let after = &rest[open + 1..];
            let close = after.find('}').ok_or_else(|| invalid("unclosed `{`"))?;
            let name = &after[..close];

            if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
                return Err(invalid("parameter names must be non-empty word characters"));
            }
            if param_names.iter().any(|n| n == name) {
                return Err(invalid("duplicate parameter name"));
            }

            regex_str.push_str(&format!("(?P<{name}>[^/]+)"));
            param_names.push(name.to_string());
            rest = &after[close + 1..];
        }

        if rest.contains('}') {
            return Err(invalid("unmatched `}`"));
        }
        regex_str.push_str(&regex::escape(rest));
        regex_str.push('$');

        let regex = Regex::new(&regex_str).map_err(|e| invalid(&e.to_string()))?;

        Ok(Self {
            pattern: pattern.to_string(),
            regex,
            param_names,
        })
    }

    /// Attempts to match a path against this pattern.
    ///
    /// Returns extracted parameters if the whole path matches.
    pub fn match_path(&self, path: &str) -> Option<PathParams> {
        let caps = self.regex.captures(path.trim_end_matches('/'))?;

        let mut params = PathParams::new();
        for name in &self.param_names {
            if let Some(value) = caps.name(name) {
                params.insert(name.clone(), value.as_str());
            }
        }

        Some(params)
    }

    /// Returns the original pattern string.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Returns the parameter names.
    pub fn param_names(&self) -> &[String] {
        &self.param_names
    }
}
