//! Route pattern compilation.
//!
//! A pattern is a `/`-separated list of segments:
//! - `users`: literal text, matched verbatim
//! - `:uid`: named capture of one segment (`[^/]+`)
//! - `*filename`: capture of everything that follows, `/` included (`.*`)
//!
//! Capture markers without a name (`:` or `*` alone) are kept as literal text.
//! Nothing else is validated. A `*` segment placed before the end still
//! compiles to a greedy `.*` and the remaining segments stay in the regex.

use regex::Regex;
use std::collections::HashMap;

use super::params::PathParams;

const SEGMENT_CAPTURE: &str = "([^/]+)";
const WILDCARD_CAPTURE: &str = "(.*)";

/// A compiled, fully anchored route pattern.
#[derive(Debug, Clone)]
pub struct Pattern {
    source: String,
    regex: Regex,
    names: Vec<String>,
}

impl Pattern {
    /// Compile `pattern`. Equal inputs always produce equivalent matchers.
    pub fn compile(pattern: &str) -> Result<Self, regex::Error> {
        let mut names = Vec::new();
        let body = pattern
            .split('/')
            .map(|segment| segment_regex(segment, &mut names))
            .collect::<Vec<_>>()
            .join("/");
        let regex = Regex::new(&format!("^{body}$"))?;

        Ok(Self {
            source: pattern.to_string(),
            regex,
            names,
        })
    }

    /// The pattern text as registered.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// The anchored regular expression the pattern compiled to.
    pub fn regex_str(&self) -> &str {
        self.regex.as_str()
    }

    /// Capture names in the order they appear in the pattern.
    pub fn capture_names(&self) -> &[String] {
        &self.names
    }

    /// True if the pattern declares no captures.
    pub fn is_literal(&self) -> bool {
        self.names.is_empty()
    }

    /// Number of `/`-delimited pieces, leading empty piece included.
    pub fn segment_count(&self) -> usize {
        self.source.split('/').count()
    }

    pub fn is_match(&self, path: &str) -> bool {
        self.regex.is_match(path)
    }

    /// Match `path` and extract its captures. A name declared twice keeps
    /// the value of its last occurrence.
    pub fn captures(&self, path: &str) -> Option<PathParams> {
        let caps = self.regex.captures(path)?;
        let params: HashMap<String, String> = self
            .names
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let value = caps.get(i + 1).map_or("", |m| m.as_str());
                (name.clone(), value.to_string())
            })
            .collect();
        Some(PathParams::new(params))
    }
}

fn segment_regex(segment: &str, names: &mut Vec<String>) -> String {
    if let Some(name) = segment.strip_prefix(':').filter(|n| !n.is_empty()) {
        names.push(name.to_string());
        return SEGMENT_CAPTURE.to_string();
    }
    if let Some(name) = segment.strip_prefix('*').filter(|n| !n.is_empty()) {
        names.push(name.to_string());
        return WILDCARD_CAPTURE.to_string();
    }
    regex::escape(segment)
}
