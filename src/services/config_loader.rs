// 設定ファイル読み込みサービス
//
// core::config の純粋性を保つため、ファイルI/Oはこのサービスに集約する。

use crate::core::config::Config;
use anyhow::{Context, Result};
use std::path::Path;

/// 設定ファイル読み込みサービス
#[derive(Debug, Clone, Default)]
pub struct ConfigLoader;

impl ConfigLoader {
    /// YAMLファイルから設定を読み込み、検証する
    pub fn from_file(path: &Path) -> Result<Config> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        let config: Config = content.parse()?;
        config
            .validate()
            .with_context(|| format!("Invalid config file: {:?}", path))?;
        Ok(config)
    }

    /// デフォルトパスから設定を読み込む
    pub fn load_default() -> Result<Config> {
        Self::from_file(Path::new(Config::DEFAULT_CONFIG_PATH))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_from_file_reads_and_validates() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(Config::DEFAULT_CONFIG_PATH);
        fs::write(
            &path,
            r#"
version: "1.0"
dialect: sqlite
environments:
  local:
    database: ./local.db
clean:
  schemas: [main]
"#,
        )
        .unwrap();

        let config = ConfigLoader::from_file(&path).unwrap();
        assert_eq!(config.clean.schemas, vec!["main"]);
    }

    #[test]
    fn test_from_file_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = ConfigLoader::from_file(&dir.path().join("missing.yaml")).unwrap_err();

        assert!(err.to_string().contains("Failed to read config file"));
    }

    #[test]
    fn test_from_file_rejects_invalid_clean_section() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(
            &path,
            r#"
version: "1.0"
dialect: sqlite
environments:
  local:
    database: ./local.db
clean:
  schemas: [main, main]
"#,
        )
        .unwrap();

        let err = ConfigLoader::from_file(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("more than once"));
    }
}
