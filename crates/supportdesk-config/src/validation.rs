// SPDX-FileCopyrightText: 2026 Supportdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Semantic checks that serde attributes cannot express.
//!
//! Every failing check is reported; validation does not stop at the first one.

use std::collections::HashSet;

use crate::diagnostic::ConfigError;
use crate::model::SupportdeskConfig;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration.
pub fn validate_config(config: &SupportdeskConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    let host = config.server.host.trim();
    if host.is_empty() {
        errors.push(ConfigError::invalid("server.host must not be empty"));
    } else if host.parse::<std::net::IpAddr>().is_err()
        && !host
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-')
    {
        errors.push(ConfigError::invalid(format!(
            "server.host `{host}` is not an IP address or hostname"
        )));
    }

    if config.server.port == 0 {
        errors.push(ConfigError::invalid("server.port must not be 0"));
    }

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::invalid("storage.database_path must not be empty"));
    }

    let chat = &config.chat;
    if chat.max_page_size == 0 {
        errors.push(ConfigError::invalid("chat.max_page_size must be at least 1"));
    }
    if chat.default_page_size == 0 || chat.default_page_size > chat.max_page_size {
        errors.push(ConfigError::invalid(format!(
            "chat.default_page_size must be between 1 and chat.max_page_size ({}), got {}",
            chat.max_page_size, chat.default_page_size
        )));
    }
    if chat.max_subject_len == 0 {
        errors.push(ConfigError::invalid("chat.max_subject_len must be at least 1"));
    }
    if chat.max_content_len == 0 {
        errors.push(ConfigError::invalid("chat.max_content_len must be at least 1"));
    }
    if chat.rate_limit_messages == 0 {
        errors.push(ConfigError::invalid("chat.rate_limit_messages must be at least 1"));
    }
    if chat.rate_limit_window_secs == 0 {
        errors.push(ConfigError::invalid("chat.rate_limit_window_secs must be at least 1"));
    }
    if chat.subscriber_buffer == 0 {
        errors.push(ConfigError::invalid("chat.subscriber_buffer must be at least 1"));
    }

    if !LOG_LEVELS.contains(&config.log.level.to_ascii_lowercase().as_str()) {
        errors.push(ConfigError::invalid(format!(
            "log.level `{}` is not one of {}",
            config.log.level,
            LOG_LEVELS.join(", ")
        )));
    }

    let mut user_ids = HashSet::new();
    let mut hashes = HashSet::new();
    for (idx, identity) in config.identities.iter().enumerate() {
        if identity.user_id.trim().is_empty() {
            errors.push(ConfigError::invalid(format!(
                "identities[{idx}].user_id must not be empty"
            )));
        } else if !user_ids.insert(identity.user_id.as_str()) {
            errors.push(ConfigError::invalid(format!(
                "identities[{idx}].user_id `{}` is declared more than once",
                identity.user_id
            )));
        }

        let hash = identity.token_sha256.as_str();
        if hash.len() != 64 || !hash.chars().all(|c| c.is_ascii_hexdigit()) {
            errors.push(ConfigError::invalid(format!(
                "identities[{idx}].token_sha256 must be 64 hex characters"
            )));
        } else if !hashes.insert(hash.to_ascii_lowercase()) {
            errors.push(ConfigError::invalid(format!(
                "identities[{idx}].token_sha256 is shared with another identity"
            )));
        }
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::IdentityConfig;
    use supportdesk_core::Role;

    fn identity(user_id: &str, hash: &str) -> IdentityConfig {
        IdentityConfig {
            user_id: user_id.to_string(),
            role: Role::Client,
            token_sha256: hash.to_string(),
            active: true,
            display_name: None,
        }
    }

    #[test]
    fn defaults_are_valid() {
        assert!(validate_config(&SupportdeskConfig::default()).is_ok());
    }

    #[test]
    fn collects_every_failure() {
        let mut config = SupportdeskConfig::default();
        config.server.host = String::new();
        config.chat.rate_limit_messages = 0;
        config.log.level = "loud".into();
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn default_page_size_must_fit_max() {
        let mut config = SupportdeskConfig::default();
        config.chat.default_page_size = 500;
        let errors = validate_config(&config).unwrap_err();
        assert!(errors[0].to_string().contains("default_page_size"));
    }

    #[test]
    fn rejects_duplicate_identities_and_bad_hashes() {
        let hash = "a".repeat(64);
        let mut config = SupportdeskConfig::default();
        config.identities = vec![
            identity("u1", &hash),
            identity("u1", &"b".repeat(64)),
            identity("u2", &hash),
            identity("u3", "not-hex"),
        ];
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
    }
}
