use crate::models::SubstitutionScope;
use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

/// How the coordinator answers a per-file operation failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorPolicy {
    /// Ask the user each time.
    #[default]
    Ask,
    Continue,
    Abort,
}

/// User preferences persisted in `imgrename.yaml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserConfig {
    /// Directory of the most recently started batch.
    pub last_directory: Option<Utf8PathBuf>,

    /// Search pattern offered when none is given.
    pub default_search: String,

    pub copy_by_default: bool,

    pub substitution_scope: SubstitutionScope,

    pub on_error: ErrorPolicy,

    pub debug_mode: bool,
}

impl Default for UserConfig {
    fn default() -> Self {
        Self {
            last_directory: None,
            default_search: default_search_pattern(),
            copy_by_default: false,
            substitution_scope: SubstitutionScope::FileName,
            on_error: ErrorPolicy::Ask,
            debug_mode: false,
        }
    }
}

fn default_search_pattern() -> String {
    "IMG".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_config_defaults() {
        let config = UserConfig::default();
        assert_eq!(config.default_search, "IMG");
        assert!(config.last_directory.is_none());
        assert!(!config.copy_by_default);
        assert_eq!(config.substitution_scope, SubstitutionScope::FileName);
        assert_eq!(config.on_error, ErrorPolicy::Ask);
    }

    #[test]
    fn test_partial_yaml_fills_defaults() {
        let config: UserConfig =
            serde_yaml_ng::from_str("last_directory: /photos\non_error: continue\n").unwrap();

        assert_eq!(config.last_directory, Some(Utf8PathBuf::from("/photos")));
        assert_eq!(config.on_error, ErrorPolicy::Continue);
        assert_eq!(config.default_search, "IMG");
    }
}
