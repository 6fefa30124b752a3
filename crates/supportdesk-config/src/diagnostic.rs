// SPDX-FileCopyrightText: 2026 Supportdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Turns figment extraction failures into miette diagnostics.
//!
//! Unknown keys get a "did you mean" hint based on Jaro-Winkler similarity
//! and, when the offending file can be located, a labelled source span.

#![allow(unused_assignments)] // miette's Diagnostic derive generates code triggering this lint

use figment::error::Kind;
use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

/// Similarity score a valid key must exceed to be offered as a correction.
const SUGGESTION_THRESHOLD: f64 = 0.75;

/// A configuration problem, renderable through miette.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("unknown configuration key `{key}`")]
    #[diagnostic(
        code(supportdesk::config::unknown_key),
        help("{}", unknown_key_help(suggestion.as_deref(), valid_keys))
    )]
    UnknownKey {
        key: String,
        suggestion: Option<String>,
        valid_keys: String,
        #[label("not a recognised key")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    #[error("invalid value for `{key}`: {detail}")]
    #[diagnostic(code(supportdesk::config::invalid_type), help("expected {expected}"))]
    InvalidType {
        key: String,
        detail: String,
        expected: String,
    },

    #[error("missing required key `{key}`")]
    #[diagnostic(
        code(supportdesk::config::missing_key),
        help("add `{key} = <value>` to supportdesk.toml")
    )]
    MissingKey { key: String },

    /// Semantic check that failed after deserialization.
    #[error("{message}")]
    #[diagnostic(code(supportdesk::config::validation))]
    Validation { message: String },

    #[error("configuration error: {0}")]
    #[diagnostic(code(supportdesk::config::other))]
    Other(String),
}

impl ConfigError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        ConfigError::Validation {
            message: message.into(),
        }
    }
}

fn unknown_key_help(suggestion: Option<&str>, valid_keys: &str) -> String {
    match suggestion {
        Some(s) => format!("did you mean `{s}`? valid keys: {valid_keys}"),
        None => format!("valid keys: {valid_keys}"),
    }
}

/// Convert every error carried by a `figment::Error` into a `ConfigError`.
///
/// `toml_sources` holds `(path, content)` pairs used to attach spans.
pub fn figment_to_config_errors(
    err: figment::Error,
    toml_sources: &[(String, String)],
) -> Vec<ConfigError> {
    err.into_iter()
        .map(|error| {
            let dotted = error
                .path
                .iter()
                .map(|s| s.to_string())
                .collect::<Vec<_>>()
                .join(".");
            match &error.kind {
                Kind::UnknownField(field, expected) => {
                    let (span, src) = locate(&error, field, toml_sources);
                    ConfigError::UnknownKey {
                        key: field.clone(),
                        suggestion: suggest_key(field, expected),
                        valid_keys: expected.join(", "),
                        span,
                        src,
                    }
                }
                Kind::MissingField(field) => ConfigError::MissingKey {
                    key: if dotted.is_empty() {
                        field.to_string()
                    } else {
                        format!("{dotted}.{field}")
                    },
                },
                Kind::InvalidType(actual, expected) => ConfigError::InvalidType {
                    key: dotted,
                    detail: format!("found {actual}"),
                    expected: expected.clone(),
                },
                Kind::InvalidValue(actual, expected) => ConfigError::InvalidType {
                    key: dotted,
                    detail: format!("found {actual}"),
                    expected: expected.clone(),
                },
                _ => ConfigError::Other(error.to_string()),
            }
        })
        .collect()
}

fn locate(
    error: &figment::error::Error,
    field: &str,
    toml_sources: &[(String, String)],
) -> (Option<SourceSpan>, Option<NamedSource<String>>) {
    let origin = match error.metadata.as_ref().and_then(|m| m.source.as_ref()) {
        Some(figment::Source::File(path)) => path.display().to_string(),
        Some(figment::Source::Code(_)) | Some(figment::Source::Custom(_)) | None => {
            // Inline strings have no file path; fall back to the only source if there is one.
            match toml_sources {
                [(path, _)] => path.clone(),
                _ => return (None, None),
            }
        }
        Some(_) => return (None, None),
    };

    let Some((path, content)) = toml_sources.iter().find(|(p, _)| *p == origin) else {
        return (None, None);
    };

    let section = error.path.first().map(|s| s.as_str());
    match find_key_offset(content, section, field) {
        Some(offset) => (
            Some(SourceSpan::new(offset.into(), field.len())),
            Some(NamedSource::new(path, content.clone())),
        ),
        None => (None, None),
    }
}

/// Byte offset of `field` inside `section` (`[section]` or `[[section]]`).
///
/// With no section the search starts at the top of the document.
pub fn find_key_offset(content: &str, section: Option<&str>, field: &str) -> Option<usize> {
    let start = match section {
        None => 0,
        Some(name) => {
            let array = format!("[[{name}]]");
            let table = format!("[{name}]");
            content
                .find(&array)
                .map(|p| p + array.len())
                .or_else(|| content.find(&table).map(|p| p + table.len()))?
        }
    };

    let mut offset = start;
    for line in content[start..].split_inclusive('\n') {
        let trimmed = line.trim_start();
        if let Some(rest) = trimmed.strip_prefix(field)
            && rest.trim_start().starts_with('=')
        {
            return Some(offset + (line.len() - trimmed.len()));
        }
        offset += line.len();
    }
    None
}

/// Closest valid key to `unknown`, if any scores above the threshold.
pub fn suggest_key(unknown: &str, valid_keys: &[&str]) -> Option<String> {
    valid_keys
        .iter()
        .map(|key| (strsim::jaro_winkler(unknown, key), *key))
        .filter(|(score, _)| *score > SUGGESTION_THRESHOLD)
        .max_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, key)| key.to_string())
}

/// Render diagnostics to stderr with miette's graphical handler.
pub fn render_errors(errors: &[ConfigError]) {
    let handler = miette::GraphicalReportHandler::new();
    for error in errors {
        let mut buf = String::new();
        if handler.render_report(&mut buf, error as &dyn Diagnostic).is_ok() {
            eprintln!("{buf}");
        } else {
            eprintln!("error: {error}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suggests_close_key() {
        let keys = ["host", "port", "shutdown_grace_secs"];
        assert_eq!(suggest_key("prot", &keys).as_deref(), Some("port"));
        assert_eq!(suggest_key("zzzzzz", &keys), None);
    }

    #[test]
    fn finds_key_in_table() {
        let content = "[server]\nhost = \"0.0.0.0\"\n\n[chat]\nmax_page_sise = 5\n";
        let offset = find_key_offset(content, Some("chat"), "max_page_sise").unwrap();
        assert_eq!(&content[offset..offset + 13], "max_page_sise");
    }

    #[test]
    fn finds_key_in_array_of_tables() {
        let content = "[[identities]]\nuser_id = \"u1\"\nrol = \"admin\"\n";
        let offset = find_key_offset(content, Some("identities"), "rol").unwrap();
        assert_eq!(&content[offset..offset + 3], "rol");
    }

    #[test]
    fn prefix_of_longer_key_is_not_a_match() {
        let content = "[server]\nhostname = 1\nhost = 2\n";
        let offset = find_key_offset(content, Some("server"), "host").unwrap();
        assert!(content[offset..].starts_with("host = 2"));
    }

    #[test]
    fn missing_section_gives_none() {
        assert!(find_key_offset("[log]\nlevel = \"info\"\n", Some("chat"), "x").is_none());
    }
}
