// コマンド共通コンテキスト
//
// 設定ファイル読み込みとデータベース接続の重複をCLI層で集約する。

use crate::adapters::database::DatabaseConnectionService;
use crate::adapters::session::DatabaseSession;
use crate::core::config::{Config, DatabaseConfig, Dialect};
use crate::services::config_loader::ConfigLoader;
use anyhow::{anyhow, Context, Result};
use std::path::PathBuf;

/// CLIコマンド共通の実行コンテキスト
#[derive(Debug, Clone)]
pub struct CommandContext {
    pub project_path: PathBuf,
    pub config_path: PathBuf,
    pub config: Config,
}

impl CommandContext {
    /// プロジェクトルートから設定を読み込んでコンテキストを作成
    pub fn load(project_path: PathBuf) -> Result<Self> {
        Self::load_with_config(project_path, None)
    }

    /// カスタム設定ファイルパスを指定してコンテキストを作成
    pub fn load_with_config(
        project_path: PathBuf,
        custom_config_path: Option<PathBuf>,
    ) -> Result<Self> {
        let config_path = custom_config_path
            .unwrap_or_else(|| project_path.join(Config::DEFAULT_CONFIG_PATH));

        if !config_path.exists() {
            return Err(anyhow!(
                "Config file not found: {:?}. Create it or pass --config <FILE>.",
                config_path
            ));
        }

        let config =
            ConfigLoader::from_file(&config_path).with_context(|| "Failed to read config file")?;

        Ok(Self {
            project_path,
            config_path,
            config,
        })
    }

    /// 環境のデータベース設定を取得
    ///
    /// SQLiteの相対パスはプロジェクトルートから解決します。
    pub fn database_config(&self, env: &str) -> Result<DatabaseConfig> {
        let mut db_config = self.config.get_database_config(env)?;
        if self.config.dialect == Dialect::SQLite
            && db_config.database != ":memory:"
        {
            let path = PathBuf::from(&db_config.database);
            if path.is_relative() {
                db_config.database = self
                    .project_path
                    .join(path)
                    .to_string_lossy()
                    .into_owned();
            }
        }
        Ok(db_config)
    }

    /// 環境のデータベースに接続
    pub async fn connect(&self, env: &str) -> Result<DatabaseSession> {
        let db_config = self.database_config(env)?;
        DatabaseConnectionService::new()
            .connect(self.config.dialect, &db_config)
            .await
            .with_context(|| format!("Failed to connect to database for environment '{}'", env))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_config(dir: &TempDir) {
        fs::write(
            dir.path().join(Config::DEFAULT_CONFIG_PATH),
            r#"
version: "1.0"
dialect: sqlite
environments:
  local:
    database: data/local.db
  memory:
    database: ":memory:"
"#,
        )
        .unwrap();
    }

    #[test]
    fn test_load_missing_config() {
        let dir = TempDir::new().unwrap();
        let err = CommandContext::load(dir.path().to_path_buf()).unwrap_err();

        assert!(err.to_string().contains("Config file not found"));
    }

    #[test]
    fn test_database_config_resolves_relative_sqlite_path() {
        let dir = TempDir::new().unwrap();
        write_config(&dir);

        let context = CommandContext::load(dir.path().to_path_buf()).unwrap();
        let db_config = context.database_config("local").unwrap();

        assert_eq!(
            PathBuf::from(db_config.database),
            dir.path().join("data/local.db")
        );
        assert_eq!(
            context.database_config("memory").unwrap().database,
            ":memory:"
        );
    }

    #[test]
    fn test_database_config_unknown_environment() {
        let dir = TempDir::new().unwrap();
        write_config(&dir);

        let context = CommandContext::load(dir.path().to_path_buf()).unwrap();
        assert!(context.database_config("production").is_err());
    }
}
