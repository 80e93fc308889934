// データベース接続アダプター
//
// 設定から DatabaseSession を開き、接続タイムアウトと接続確認を扱います。
// PostgreSQL、MySQL、SQLiteに対応した統一されたインターフェースを提供します。

use crate::adapters::connection_string::build_connection_string;
use crate::adapters::session::DatabaseSession;
use crate::core::config::{DatabaseConfig, Dialect};
use crate::core::error::DatabaseError;
use std::time::Duration;
use tracing::{debug, info};

/// デフォルトの接続タイムアウト（秒）
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 30;

/// データベース接続サービス
///
/// セッションの確立と終了を行います。
#[derive(Debug, Clone, Default)]
pub struct DatabaseConnectionService {}

impl DatabaseConnectionService {
    /// 新しいDatabaseConnectionServiceを作成
    pub fn new() -> Self {
        Self {}
    }

    /// 接続タイムアウトを決定
    pub fn connect_timeout(&self, config: &DatabaseConfig) -> Duration {
        Duration::from_secs(config.timeout.unwrap_or(DEFAULT_CONNECT_TIMEOUT_SECS))
    }

    /// データベースセッションを開く
    ///
    /// # Arguments
    ///
    /// * `dialect` - データベース方言
    /// * `config` - データベース設定
    ///
    /// # Returns
    ///
    /// 接続済みのセッション、またはタイムアウトを含む接続エラー
    pub async fn connect(
        &self,
        dialect: Dialect,
        config: &DatabaseConfig,
    ) -> Result<DatabaseSession, DatabaseError> {
        let url = build_connection_string(dialect, config);
        let timeout = self.connect_timeout(config);

        debug!(
            dialect = %dialect,
            host = %config.host,
            database = %config.database,
            timeout_secs = timeout.as_secs(),
            "Opening database session"
        );

        let session = tokio::time::timeout(timeout, DatabaseSession::connect(dialect, &url))
            .await
            .map_err(|_| DatabaseError::Connection {
                message: format!("Timed out connecting to {} database", dialect),
                cause: format!("no response within {}s", timeout.as_secs()),
            })??;

        info!(dialect = %dialect, database = %config.database, "Connected to database");
        Ok(session)
    }

    /// 接続テストを実行
    pub async fn test_connection(&self, session: &DatabaseSession) -> Result<(), DatabaseError> {
        session
            .execute("SELECT 1")
            .await
            .map(|_| ())
            .map_err(|e| DatabaseError::Connection {
                message: "Connection test failed".to_string(),
                cause: e.to_string(),
            })
    }

    /// セッションを閉じる
    pub async fn close_session(&self, session: &DatabaseSession) -> Result<(), DatabaseError> {
        debug!(dialect = %session.dialect(), "Closing database session");
        session.close().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sqlite_config(database: String, timeout: Option<u64>) -> DatabaseConfig {
        DatabaseConfig {
            host: String::new(),
            port: None,
            database,
            user: None,
            password: None,
            timeout,
        }
    }

    #[test]
    fn test_connect_timeout_defaults_to_thirty_seconds() {
        let service = DatabaseConnectionService::new();

        assert_eq!(
            service.connect_timeout(&sqlite_config("a.db".to_string(), None)),
            Duration::from_secs(30)
        );
        assert_eq!(
            service.connect_timeout(&sqlite_config("a.db".to_string(), Some(5))),
            Duration::from_secs(5)
        );
    }

    #[tokio::test]
    async fn test_connect_and_close_sqlite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("connect.db");
        let config = sqlite_config(path.to_string_lossy().into_owned(), Some(5));

        let service = DatabaseConnectionService::new();
        let session = service.connect(Dialect::SQLite, &config).await.unwrap();

        service.test_connection(&session).await.unwrap();
        service.close_session(&session).await.unwrap();

        assert!(session.is_closed().await);
        assert!(service.test_connection(&session).await.is_err());
    }
}
