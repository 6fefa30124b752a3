// SPDX-FileCopyrightText: 2026 Supportdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Layered configuration loading with figment.
//!
//! Merge order, later layers winning:
//! 1. compiled defaults
//! 2. `/etc/supportdesk/supportdesk.toml`
//! 3. `~/.config/supportdesk/supportdesk.toml`
//! 4. `./supportdesk.toml`
//! 5. `SUPPORTDESK_*` environment variables

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::SupportdeskConfig;

pub(crate) const SYSTEM_CONFIG: &str = "/etc/supportdesk/supportdesk.toml";
pub(crate) const LOCAL_CONFIG: &str = "supportdesk.toml";

pub(crate) fn user_config() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("supportdesk").join("supportdesk.toml"))
}

/// The full figment before extraction.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(SupportdeskConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG))
        .merge(Toml::file(user_config().unwrap_or_default()))
        .merge(Toml::file(LOCAL_CONFIG))
        .merge(env_provider())
}

/// Load configuration from the standard hierarchy with env var overrides.
pub fn load_config() -> Result<SupportdeskConfig, figment::Error> {
    build_figment().extract()
}

/// Load from one explicit file, still honouring env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<SupportdeskConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(SupportdeskConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Load from an in-memory TOML document. No files, no environment.
pub fn load_config_from_str(toml_content: &str) -> Result<SupportdeskConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(SupportdeskConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// `SUPPORTDESK_CHAT_MAX_PAGE_SIZE` maps to `chat.max_page_size`.
///
/// Only the first underscore after a known section name becomes a dot, so
/// keys that contain underscores stay intact. Identities are not settable
/// from the environment.
fn env_provider() -> Env {
    const SECTIONS: [&str; 4] = ["server", "storage", "chat", "log"];
    Env::prefixed("SUPPORTDESK_").map(|key| {
        let key = key.as_str().to_ascii_lowercase();
        SECTIONS
            .iter()
            .find_map(|section| {
                key.strip_prefix(section)
                    .and_then(|rest| rest.strip_prefix('_'))
                    .map(|rest| format!("{section}.{rest}"))
            })
            .unwrap_or(key)
            .into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_overrides_nested_keys() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("SUPPORTDESK_SERVER_PORT", "9191");
            jail.set_env("SUPPORTDESK_CHAT_MAX_PAGE_SIZE", "50");
            jail.set_env("SUPPORTDESK_STORAGE_WAL_MODE", "false");
            let config: SupportdeskConfig = Figment::new()
                .merge(Serialized::defaults(SupportdeskConfig::default()))
                .merge(env_provider())
                .extract()?;
            assert_eq!(config.server.port, 9191);
            assert_eq!(config.chat.max_page_size, 50);
            assert!(!config.storage.wal_mode);
            Ok(())
        });
    }

    #[test]
    fn local_file_is_picked_up() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(LOCAL_CONFIG, "[log]\nlevel = \"debug\"\n")?;
            let config = load_config_from_path(Path::new(LOCAL_CONFIG))?;
            assert_eq!(config.log.level, "debug");
            Ok(())
        });
    }
}
