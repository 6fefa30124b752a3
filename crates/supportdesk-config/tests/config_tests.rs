// SPDX-FileCopyrightText: 2026 Supportdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use supportdesk_config::{ConfigError, load_and_validate_str};
use supportdesk_core::Role;

#[test]
fn empty_document_yields_defaults() {
    let config = load_and_validate_str("").unwrap();
    assert_eq!(config.server.port, 8080);
    assert_eq!(config.chat.default_page_size, 20);
    assert_eq!(config.chat.max_page_size, 100);
    assert_eq!(config.chat.max_subject_len, 200);
    assert_eq!(config.chat.max_content_len, 1000);
    assert_eq!(config.chat.rate_limit_messages, 30);
    assert_eq!(config.chat.rate_limit_window_secs, 60);
    assert!(config.storage.wal_mode);
    assert!(config.identities.is_empty());
}

#[test]
fn parses_identities() {
    let toml = format!(
        r#"
[server]
port = 3000

[[identities]]
user_id = "agent-1"
role = "team"
token_sha256 = "{}"
display_name = "Agent One"

[[identities]]
user_id = "client-1"
role = "client"
token_sha256 = "{}"
active = false
"#,
        "1".repeat(64),
        "2".repeat(64)
    );
    let config = load_and_validate_str(&toml).unwrap();
    assert_eq!(config.server.port, 3000);
    assert_eq!(config.identities.len(), 2);
    assert_eq!(config.identities[0].role, Role::Team);
    assert!(config.identities[0].active);
    assert_eq!(config.identities[0].display_name.as_deref(), Some("Agent One"));
    assert!(!config.identities[1].active);
}

#[test]
fn typo_gets_a_suggestion() {
    let errors = load_and_validate_str("[chat]\nmax_page_sise = 10\n").unwrap_err();
    match &errors[0] {
        ConfigError::UnknownKey {
            key, suggestion, ..
        } => {
            assert_eq!(key, "max_page_sise");
            assert_eq!(suggestion.as_deref(), Some("max_page_size"));
        }
        other => panic!("expected UnknownKey, got {other:?}"),
    }
}

#[test]
fn unknown_role_is_rejected() {
    let toml = format!(
        "[[identities]]\nuser_id = \"x\"\nrole = \"superuser\"\ntoken_sha256 = \"{}\"\n",
        "3".repeat(64)
    );
    assert!(load_and_validate_str(&toml).is_err());
}

#[test]
fn wrong_type_is_reported() {
    let errors = load_and_validate_str("[server]\nport = \"eighty\"\n").unwrap_err();
    assert!(matches!(errors[0], ConfigError::InvalidType { .. }));
}

#[test]
fn semantic_errors_surface_after_parse() {
    let errors = load_and_validate_str("[chat]\nmax_content_len = 0\n").unwrap_err();
    assert!(matches!(errors[0], ConfigError::Validation { .. }));
}
