/// 設定ファイル管理機能のテスト
///
/// このテストは、設定ファイルの読み込み、検証、環境別設定と
/// クリーン対象スキーマの管理が正しく動作することを確認します。

#[cfg(test)]
mod config_tests {
    use std::fs;
    use strata_lifecycle::core::config::{CleanConfig, Config, Dialect};
    use strata_lifecycle::services::config_loader::ConfigLoader;
    use tempfile::TempDir;

    const CONFIG_YAML: &str = r#"
version: "1.0"
dialect: postgresql

environments:
  development:
    host: localhost
    port: 5432
    database: app_dev
    user: postgres
    password: password
  test:
    host: db.internal
    port: 6543
    database: app_test
    timeout: 10

clean:
  schemas:
    - app
    - app_audit
  drop_schemas: true
"#;

    /// Config構造体が正しくデシリアライズできることを確認
    #[test]
    fn test_config_deserialization() {
        let config: Config = CONFIG_YAML.parse().unwrap();

        assert_eq!(config.version, "1.0");
        assert_eq!(config.dialect, Dialect::PostgreSQL);
        assert_eq!(config.clean.schemas, vec!["app", "app_audit"]);
        assert!(config.clean.drop_schemas);
        config.validate().unwrap();
    }

    /// 環境別のデータベース設定を取得できることを確認
    #[test]
    fn test_get_database_config_for_environment() {
        let config: Config = CONFIG_YAML.parse().unwrap();

        let test_env = config.get_database_config("test").unwrap();
        assert_eq!(test_env.host, "db.internal");
        assert_eq!(test_env.port, Some(6543));
        assert_eq!(test_env.database, "app_test");
        assert_eq!(test_env.user, None);
        assert_eq!(test_env.timeout, Some(10));

        let error = config.get_database_config("production").unwrap_err();
        assert!(error.to_string().contains("production"));
    }

    /// clean セクションを省略した場合は空の設定になる
    #[test]
    fn test_clean_section_defaults() {
        let yaml = r#"
version: "1.0"
dialect: sqlite
environments:
  development:
    database: app.db
"#;
        let config: Config = yaml.parse().unwrap();

        assert_eq!(config.clean, CleanConfig::default());
        assert!(config.clean.schemas.is_empty());
        assert!(!config.clean.drop_schemas);
        config.validate().unwrap();
    }

    /// スキーマの重複と空の名前は拒否される
    #[test]
    fn test_clean_config_rejects_duplicates_and_empty_names() {
        let duplicate = CleanConfig {
            schemas: vec!["app".to_string(), "app_audit".to_string(), "app".to_string()],
            drop_schemas: false,
        };
        let error = duplicate.validate().unwrap_err();
        assert!(error.to_string().contains("'app'"));

        let empty = CleanConfig {
            schemas: vec!["app".to_string(), String::new()],
            drop_schemas: false,
        };
        assert!(empty.validate().unwrap_err().to_string().contains("position 1"));
    }

    #[test]
    fn test_dialect_names() {
        assert_eq!("postgres".parse::<Dialect>().unwrap(), Dialect::PostgreSQL);
        assert_eq!("mysql".parse::<Dialect>().unwrap(), Dialect::MySQL);
        assert_eq!(Dialect::SQLite.to_string(), "sqlite");
        assert!("oracle".parse::<Dialect>().is_err());
    }

    /// ファイルから読み込み、検証まで行う
    #[test]
    fn test_loader_reads_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".strata-lifecycle.yaml");
        fs::write(&path, CONFIG_YAML).unwrap();

        let config = ConfigLoader::from_file(&path).unwrap();

        assert_eq!(config.environments.len(), 2);
        assert_eq!(config.clean.schemas, vec!["app", "app_audit"]);
    }

    /// 検証エラーは読み込みエラーとして返る
    #[test]
    fn test_loader_rejects_invalid_config() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(
            &path,
            r#"
version: "1.0"
dialect: mysql
environments:
  development:
    database: app
clean:
  schemas: [app, app]
"#,
        )
        .unwrap();

        let error = ConfigLoader::from_file(&path).unwrap_err();

        assert!(format!("{:#}", error).contains("listed more than once"));
    }
}
