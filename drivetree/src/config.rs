use std::time::Duration;

use drivetree_core::ROOT_FOLDER_ID;

use crate::remote::retry::DEFAULT_MAX_ATTEMPTS;
use crate::remote::{Backoff, RetryExecutor};
use crate::upload::{ShareSettings, UploadSettings};

const DEFAULT_API_BASE: &str = "https://www.googleapis.com";
const DEFAULT_BACKOFF_BASE_MS: u64 = 1000;
const DEFAULT_BACKOFF_JITTER_MS: u64 = 1000;
const DEFAULT_SHARE_ROLE: &str = "writer";
const DEFAULT_SHARE_SCOPE: &str = "anyone";
const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Clone, Debug)]
pub struct ServiceConfig {
    pub access_token: Option<String>,
    pub api_base: String,
    pub root_folder_id: String,
    /// Falls back to a SQLite file under the XDG data dir when unset.
    pub database_url: Option<String>,
    pub max_attempts: u32,
    pub backoff_base: Duration,
    pub backoff_jitter: Duration,
    pub share_uploads: bool,
    pub share_role: String,
    pub share_scope: String,
    pub convert_office_documents: bool,
    pub log_level: String,
}

impl ServiceConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let string = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
        let parsed = |name: &str| string(name).and_then(|value| value.trim().parse::<u64>().ok());
        let number = |name: &str, default: u64| {
            parsed(name).filter(|value| *value > 0).unwrap_or(default)
        };
        let flag = |name: &str, default: bool| {
            string(name)
                .map(|value| {
                    matches!(
                        value.trim().to_ascii_lowercase().as_str(),
                        "1" | "true" | "yes" | "on"
                    )
                })
                .unwrap_or(default)
        };

        Self {
            access_token: string("DRIVETREE_ACCESS_TOKEN"),
            api_base: string("DRIVETREE_API_BASE").unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            root_folder_id: string("DRIVETREE_ROOT_FOLDER_ID")
                .unwrap_or_else(|| ROOT_FOLDER_ID.to_string()),
            database_url: string("DRIVETREE_DATABASE_URL"),
            max_attempts: u32::try_from(number(
                "DRIVETREE_MAX_ATTEMPTS",
                u64::from(DEFAULT_MAX_ATTEMPTS),
            ))
            .unwrap_or(DEFAULT_MAX_ATTEMPTS),
            backoff_base: Duration::from_millis(number(
                "DRIVETREE_BACKOFF_BASE_MS",
                DEFAULT_BACKOFF_BASE_MS,
            )),
            backoff_jitter: Duration::from_millis(
                parsed("DRIVETREE_BACKOFF_JITTER_MS").unwrap_or(DEFAULT_BACKOFF_JITTER_MS),
            ),
            share_uploads: flag("DRIVETREE_SHARE_UPLOADS", true),
            share_role: string("DRIVETREE_SHARE_ROLE")
                .unwrap_or_else(|| DEFAULT_SHARE_ROLE.to_string()),
            share_scope: string("DRIVETREE_SHARE_SCOPE")
                .unwrap_or_else(|| DEFAULT_SHARE_SCOPE.to_string()),
            convert_office_documents: flag("DRIVETREE_CONVERT_OFFICE", true),
            log_level: string("DRIVETREE_LOG").unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string()),
        }
    }

    pub fn retry_executor(&self) -> RetryExecutor {
        RetryExecutor::new(
            self.max_attempts,
            Backoff::new(self.backoff_base, self.backoff_jitter),
        )
    }

    pub fn upload_settings(&self) -> UploadSettings {
        UploadSettings {
            root_folder_id: self.root_folder_id.clone(),
            share: self.share_uploads.then(|| ShareSettings {
                role: self.share_role.clone(),
                scope: self.share_scope.clone(),
            }),
            convert_office_documents: self.convert_office_documents,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> ServiceConfig {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServiceConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = config_from(&[]);
        assert_eq!(config.access_token, None);
        assert_eq!(config.api_base, DEFAULT_API_BASE);
        assert_eq!(config.root_folder_id, "root");
        assert_eq!(config.max_attempts, 5);
        assert_eq!(config.backoff_base, Duration::from_secs(1));
        assert_eq!(config.backoff_jitter, Duration::from_secs(1));
        assert!(config.share_uploads);
        assert_eq!(config.share_role, "writer");
        assert_eq!(config.share_scope, "anyone");
        assert!(config.convert_office_documents);
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn reads_overrides() {
        let config = config_from(&[
            ("DRIVETREE_ACCESS_TOKEN", "token"),
            ("DRIVETREE_ROOT_FOLDER_ID", "shared-root"),
            ("DRIVETREE_MAX_ATTEMPTS", "3"),
            ("DRIVETREE_SHARE_UPLOADS", "off"),
            ("DRIVETREE_CONVERT_OFFICE", "false"),
        ]);
        assert_eq!(config.access_token.as_deref(), Some("token"));
        assert_eq!(config.max_attempts, 3);

        let settings = config.upload_settings();
        assert_eq!(settings.root_folder_id, "shared-root");
        assert!(settings.share.is_none());
        assert!(!settings.convert_office_documents);
    }

    #[test]
    fn invalid_numbers_fall_back_to_defaults() {
        let config = config_from(&[
            ("DRIVETREE_MAX_ATTEMPTS", "many"),
            ("DRIVETREE_BACKOFF_BASE_MS", "0"),
            ("DRIVETREE_ROOT_FOLDER_ID", "  "),
        ]);
        assert_eq!(config.max_attempts, 5);
        assert_eq!(config.backoff_base, Duration::from_secs(1));
        assert_eq!(config.root_folder_id, "root");
    }

    #[test]
    fn zero_jitter_is_kept() {
        let config = config_from(&[("DRIVETREE_BACKOFF_JITTER_MS", "0")]);
        assert_eq!(config.backoff_jitter, Duration::ZERO);

        let config = config_from(&[("DRIVETREE_BACKOFF_JITTER_MS", "soon")]);
        assert_eq!(config.backoff_jitter, Duration::from_secs(1));
    }
}
