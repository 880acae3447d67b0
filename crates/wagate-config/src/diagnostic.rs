// SPDX-FileCopyrightText: 2026 Wagate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration diagnostics.
//!
//! Figment extraction failures become [`ConfigError`]s rendered by miette.
//! Unknown keys carry a "did you mean?" hint (Jaro-Winkler via `strsim`) and,
//! when the key came from a file we could read, a labelled source span. Type
//! errors name the environment variable that sets the key, since most
//! deployments configure the gateway through the environment.

#![allow(unused_assignments)] // miette's Diagnostic derive generates code triggering this lint

use std::path::Path;

use figment::error::Kind;
use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

use crate::loader;

/// Minimum Jaro-Winkler similarity for a key suggestion.
const SUGGESTION_THRESHOLD: f64 = 0.75;

/// A configuration error with rich diagnostic information.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    /// A key no section recognizes.
    #[error("unknown configuration key `{key}`")]
    #[diagnostic(
        code(wagate::config::unknown_key),
        help("{}", unknown_key_help(suggestion.as_deref(), valid_keys))
    )]
    UnknownKey {
        key: String,
        /// Closest valid key, if any is similar enough.
        suggestion: Option<String>,
        /// Comma-separated valid keys for the section.
        valid_keys: String,
        #[label("this key is not recognized")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    /// A value that does not deserialize into the expected type.
    #[error("invalid type for key `{key}`: {detail}")]
    #[diagnostic(
        code(wagate::config::invalid_type),
        help("{}", invalid_type_help(expected, env_var.as_deref()))
    )]
    InvalidType {
        key: String,
        detail: String,
        expected: String,
        /// Environment variable that sets this key, when there is one.
        env_var: Option<&'static str>,
    },

    /// A required key is absent.
    #[error("missing required key `{key}`")]
    #[diagnostic(
        code(wagate::config::missing_key),
        help("add `{key} = <value>` to wagate.toml or set its environment variable")
    )]
    MissingKey { key: String },

    /// A value that parsed but is not acceptable.
    #[error("validation error: {message}")]
    #[diagnostic(code(wagate::config::validation))]
    Validation { message: String },

    /// Anything figment reports that has no dedicated variant.
    #[error("configuration error: {0}")]
    #[diagnostic(code(wagate::config::other))]
    Other(String),
}

fn unknown_key_help(suggestion: Option<&str>, valid_keys: &str) -> String {
    match suggestion {
        Some(s) => format!("did you mean `{s}`? Valid keys: {valid_keys}"),
        None => format!("valid keys: {valid_keys}"),
    }
}

fn invalid_type_help(expected: &str, env_var: Option<&str>) -> String {
    match env_var {
        Some(var) => format!("expected {expected} (check wagate.toml and ${var})"),
        None => format!("expected {expected}"),
    }
}

/// Environment variable mapped to a dotted config key.
pub fn env_var_for(key: &str) -> Option<&'static str> {
    loader::ENV_KEYS
        .iter()
        .find(|(_, path)| *path == key)
        .map(|(name, _)| *name)
}

/// TOML file contents kept so diagnostics can point into them.
#[derive(Debug, Default)]
pub struct ConfigSources {
    files: Vec<(String, String)>,
}

impl ConfigSources {
    /// Read every config file in the lookup hierarchy that exists.
    pub fn discover() -> Self {
        let mut sources = Self::default();

        let local = std::env::current_dir()
            .map(|d| d.join(loader::LOCAL_CONFIG_PATH))
            .unwrap_or_else(|_| loader::LOCAL_CONFIG_PATH.into());
        sources.read(&local);
        if let Some(user) = loader::user_config_path() {
            sources.read(&user);
        }
        sources.read(Path::new(loader::SYSTEM_CONFIG_PATH));
        sources
    }

    /// A single in-memory source.
    pub fn inline(name: &str, content: &str) -> Self {
        Self {
            files: vec![(name.to_string(), content.to_string())],
        }
    }

    fn read(&mut self, path: &Path) {
        if let Ok(content) = std::fs::read_to_string(path) {
            self.files.push((path.display().to_string(), content));
        }
    }

    fn get(&self, path: &str) -> Option<(&str, &str)> {
        self.files
            .iter()
            .find(|(p, _)| p == path)
            .map(|(p, c)| (p.as_str(), c.as_str()))
    }

    /// Span of `field` inside the file `error` originated from.
    fn locate(
        &self,
        error: &figment::Error,
        field: &str,
    ) -> (Option<SourceSpan>, Option<NamedSource<String>>) {
        let origin = match error.metadata.as_ref().and_then(|m| m.source.as_ref()) {
            Some(figment::Source::File(path)) => path.display().to_string(),
            _ => return (None, None),
        };
        let Some((path, content)) = self.get(&origin) else {
            return (None, None);
        };
        match find_key_offset(content, &error.path, field) {
            Some(offset) => (
                Some(SourceSpan::new(offset.into(), field.len())),
                Some(NamedSource::new(path, content.to_string())),
            ),
            None => (None, None),
        }
    }
}

/// Convert a figment error chain into one diagnostic per failure.
pub fn figment_to_config_errors(err: figment::Error, sources: &ConfigSources) -> Vec<ConfigError> {
    err.into_iter()
        .map(|error| match &error.kind {
            Kind::UnknownField(field, expected) => {
                let suggestion = suggest_key(field, expected);
                let (span, src) = sources.locate(&error, field);
                ConfigError::UnknownKey {
                    key: field.clone(),
                    suggestion,
                    valid_keys: expected.join(", "),
                    span,
                    src,
                }
            }
            Kind::MissingField(field) => ConfigError::MissingKey {
                key: field.to_string(),
            },
            Kind::InvalidType(actual, expected) => {
                let key = error.path.join(".");
                ConfigError::InvalidType {
                    env_var: env_var_for(&key),
                    detail: format!("found {actual}, expected {expected}"),
                    expected: expected.to_string(),
                    key,
                }
            }
            _ => ConfigError::Other(error.to_string()),
        })
        .collect()
}

/// Byte offset of `field` in TOML `content`, searched after the section
/// header named by the first element of `path` (or from the top).
pub fn find_key_offset(content: &str, path: &[String], field: &str) -> Option<usize> {
    let start = match path.first() {
        Some(section) => {
            let header = format!("[{section}]");
            content.find(&header)? + header.len()
        }
        None => 0,
    };

    let mut line_start = start;
    for line in content[start..].split_inclusive('\n') {
        let indent = line.len() - line.trim_start().len();
        let rest = &line[indent..];
        if rest
            .strip_prefix(field)
            .is_some_and(|after| after.starts_with([' ', '\t', '=']))
        {
            return Some(line_start + indent);
        }
        line_start += line.len();
    }
    None
}

/// Closest key by Jaro-Winkler similarity, above the suggestion threshold.
pub fn suggest_key(unknown: &str, valid_keys: &[&str]) -> Option<String> {
    valid_keys
        .iter()
        .map(|key| (strsim::jaro_winkler(unknown, key), *key))
        .filter(|(score, _)| *score > SUGGESTION_THRESHOLD)
        .max_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, key)| key.to_string())
}

/// Render diagnostics to stderr using miette's graphical handler.
pub fn render_errors(errors: &[ConfigError]) {
    let handler = miette::GraphicalReportHandler::new();
    for error in errors {
        let mut out = String::new();
        match handler.render_report(&mut out, error as &dyn Diagnostic) {
            Ok(()) => eprint!("{out}"),
            Err(_) => eprintln!("Error: {error}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suggests_close_key() {
        let valid = &["host", "port", "verify_token", "app_secret", "log_level"];
        assert_eq!(suggest_key("prot", valid), Some("port".to_string()));
        assert_eq!(
            suggest_key("verify_tokne", valid),
            Some("verify_token".to_string())
        );
    }

    #[test]
    fn no_suggestion_for_distant_typo() {
        let valid = &["per_minute", "redis_url"];
        assert_eq!(suggest_key("zzzzzz", valid), None);
    }

    #[test]
    fn find_key_offset_in_section() {
        let content = "[server]\nport = 1\n\n[queue]\nmdoe = \"sqs\"\n";
        let path = vec!["queue".to_string()];
        let o = find_key_offset(content, &path, "mdoe").unwrap();
        assert_eq!(&content[o..o + 4], "mdoe");
    }

    #[test]
    fn find_key_offset_skips_prefix_matches() {
        let content = "[queue]\nmode_x = 1\n  mode = \"local\"\n";
        let path = vec!["queue".to_string()];
        let o = find_key_offset(content, &path, "mode").unwrap();
        assert_eq!(&content[o..o + 6], "mode =");
    }

    #[test]
    fn env_var_lookup_by_key() {
        assert_eq!(env_var_for("server.port"), Some("PORT"));
        assert_eq!(env_var_for("queue.sqs_wait_time_secs"), Some("SQS_WAIT_TIME"));
        assert_eq!(env_var_for("storage.wal_mode"), None);
    }

    #[test]
    fn invalid_type_help_names_env_var() {
        assert_eq!(
            invalid_type_help("u16", Some("PORT")),
            "expected u16 (check wagate.toml and $PORT)"
        );
        assert_eq!(invalid_type_help("u16", None), "expected u16");
    }

    #[test]
    fn unknown_key_help_lists_suggestion() {
        assert_eq!(
            unknown_key_help(Some("port"), "host, port"),
            "did you mean `port`? Valid keys: host, port"
        );
    }
}
