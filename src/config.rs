use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{MigrateError, Result};

/// 설정 파일 내용. 자격증명은 절대 저장하지 않는다.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub migration: MigrationConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub multiplier_ms: u64,
    pub min_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            multiplier_ms: 1_000,
            min_delay_ms: 4_000,
            max_delay_ms: 10_000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct HttpConfig {
    pub timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self { timeout_secs: 30 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MigrationConfig {
    /// 업로드 요청 하나에 담을 트랙 수 (Spotify 최대 100).
    pub batch_size: usize,
    /// 검색 한 번에 요청할 후보 수.
    pub search_limit: u32,
    /// 업로드 후 완료를 알리기 전 대기 시간.
    pub settle_delay_ms: u64,
    /// 새로 만드는 플레이리스트의 공개 여부.
    pub public: bool,
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            batch_size: 100,
            search_limit: 2,
            settle_delay_ms: 1_100,
            public: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
        }
    }
}

pub fn default_config_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home)
        .join(".config")
        .join("playlist-migrate")
        .join("config.toml")
}

/// 설정 파일을 읽는다. 파일이 없으면 기본값을 반환한다.
pub fn load_config(path: &Path) -> Result<Config> {
    if !path.exists() {
        debug!(path = %path.display(), "config.missing");
        return Ok(Config::default());
    }
    let content = std::fs::read_to_string(path)
        .map_err(|e| MigrateError::Config(format!("{}: {e}", path.display())))?;
    parse_config(&content).map_err(|e| MigrateError::Config(format!("{}: {e}", path.display())))
}

fn parse_config(content: &str) -> std::result::Result<Config, toml::de::Error> {
    toml::from_str(content)
}

pub fn save_config(path: &Path, config: &Config) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| MigrateError::Config(e.to_string()))?;
    }
    let content =
        toml::to_string_pretty(config).map_err(|e| MigrateError::Config(e.to_string()))?;
    std::fs::write(path, content).map_err(|e| MigrateError::Config(e.to_string()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_gives_defaults() {
        let cfg = parse_config("").unwrap();
        assert_eq!(cfg, Config::default());
        assert_eq!(cfg.migration.batch_size, 100);
        assert_eq!(cfg.retry.max_attempts, 3);
    }

    #[test]
    fn test_partial_section_keeps_other_defaults() {
        let cfg = parse_config(
            r#"
            [migration]
            batch_size = 50

            [logging]
            filter = "debug"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.migration.batch_size, 50);
        assert_eq!(cfg.migration.search_limit, 2);
        assert_eq!(cfg.migration.settle_delay_ms, 1_100);
        assert_eq!(cfg.logging.filter, "debug");
        assert_eq!(cfg.http.timeout_secs, 30);
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let path = std::env::temp_dir().join("playlist-migrate-does-not-exist.toml");
        assert_eq!(load_config(&path).unwrap(), Config::default());
    }

    #[test]
    fn test_save_then_load() {
        let dir = std::env::temp_dir().join(format!("playlist-migrate-{}", std::process::id()));
        let path = dir.join("config.toml");
        let mut cfg = Config::default();
        cfg.retry.max_attempts = 5;
        cfg.migration.public = true;

        save_config(&path, &cfg).unwrap();
        let loaded = load_config(&path).unwrap();
        std::fs::remove_dir_all(&dir).ok();

        assert_eq!(loaded, cfg);
    }

    #[test]
    fn test_invalid_file_is_config_error() {
        let dir = std::env::temp_dir().join(format!("playlist-migrate-bad-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        std::fs::write(&path, "[migration]\nbatch_size = \"many\"\n").unwrap();

        let result = load_config(&path);
        std::fs::remove_dir_all(&dir).ok();

        assert!(matches!(result, Err(MigrateError::Config(_))));
    }
}
