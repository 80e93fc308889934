// データベースセッション
//
// 単一のsqlx接続（AnyConnection）を共有ハンドルとして保持し、
// DDL/DML の実行、カタログ問い合わせ、トランザクション制御を提供します。
// TableやSchemaはこのハンドルのクローンを借用するだけで、独自のリソースは持ちません。

use crate::core::config::Dialect;
use crate::core::error::DatabaseError;
use async_trait::async_trait;
use sqlx::any::install_default_drivers;
use sqlx::{AnyConnection, Connection, Executor, Row};
use std::fmt;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

/// トランザクション制御インターフェース
///
/// `TransactionTemplate` はこのトレイトのみに依存します。
#[async_trait]
pub trait TransactionalSession: Send + Sync {
    /// トランザクションを開始
    async fn begin(&self) -> Result<(), DatabaseError>;

    /// トランザクションをコミット
    async fn commit(&self) -> Result<(), DatabaseError>;

    /// トランザクションをロールバック
    async fn rollback(&self) -> Result<(), DatabaseError>;
}

struct SessionState {
    connection: Option<AnyConnection>,
    in_transaction: bool,
}

/// データベースセッション
///
/// クローンは同じ接続を共有します。`close()` 後はすべての操作が
/// `DatabaseError::SessionClosed` で失敗します。
#[derive(Clone)]
pub struct DatabaseSession {
    dialect: Dialect,
    state: Arc<Mutex<SessionState>>,
}

impl fmt::Debug for DatabaseSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseSession")
            .field("dialect", &self.dialect)
            .finish_non_exhaustive()
    }
}

impl DatabaseSession {
    /// 接続文字列から新しいセッションを開く
    pub async fn connect(dialect: Dialect, url: &str) -> Result<Self, DatabaseError> {
        install_default_drivers();

        let connection =
            AnyConnection::connect(url)
                .await
                .map_err(|e| DatabaseError::Connection {
                    message: format!("Failed to open {} session", dialect),
                    cause: e.to_string(),
                })?;

        Ok(Self::from_connection(dialect, connection))
    }

    /// 既存の接続からセッションを作成
    pub fn from_connection(dialect: Dialect, connection: AnyConnection) -> Self {
        Self {
            dialect,
            state: Arc::new(Mutex::new(SessionState {
                connection: Some(connection),
                in_transaction: false,
            })),
        }
    }

    /// このセッションのデータベース方言
    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// セッションが閉じられているかどうか
    pub async fn is_closed(&self) -> bool {
        self.state.lock().await.connection.is_none()
    }

    /// トランザクション中かどうか
    pub async fn in_transaction(&self) -> bool {
        self.state.lock().await.in_transaction
    }

    /// セッションを閉じる
    ///
    /// すでに閉じられている場合は何もしません。
    pub async fn close(&self) -> Result<(), DatabaseError> {
        let connection = {
            let mut state = self.state.lock().await;
            state.in_transaction = false;
            state.connection.take()
        };

        match connection {
            Some(connection) => connection
                .close()
                .await
                .map_err(|e| DatabaseError::Connection {
                    message: "Failed to close session".to_string(),
                    cause: e.to_string(),
                }),
            None => Ok(()),
        }
    }

    /// SQL文を実行（DDL/DML）
    ///
    /// 戻り値は影響を受けた行数です。
    pub async fn execute(&self, sql: &str) -> Result<u64, DatabaseError> {
        debug!(sql = %sql, "Executing statement");

        let mut state = self.state.lock().await;
        let connection = state
            .connection
            .as_mut()
            .ok_or(DatabaseError::SessionClosed)?;

        connection
            .execute(sql)
            .await
            .map(|result| result.rows_affected())
            .map_err(|e| DatabaseError::Query {
                message: e.to_string(),
                sql: Some(sql.to_string()),
            })
    }

    /// 先頭カラムを文字列として取得するクエリを実行
    ///
    /// 結果は最後まで読み切ってから返します。
    pub async fn query_names(
        &self,
        sql: &str,
        binds: &[String],
    ) -> Result<Vec<String>, DatabaseError> {
        debug!(sql = %sql, binds = ?binds, "Running catalog query");

        let mut state = self.state.lock().await;
        let connection = state
            .connection
            .as_mut()
            .ok_or(DatabaseError::SessionClosed)?;

        let mut query = sqlx::query(sql);
        for value in binds {
            query = query.bind(value.clone());
        }

        let rows = query
            .fetch_all(&mut *connection)
            .await
            .map_err(|e| DatabaseError::Query {
                message: e.to_string(),
                sql: Some(sql.to_string()),
            })?;

        rows.iter()
            .map(|row| {
                row.try_get::<String, _>(0)
                    .map_err(|e| DatabaseError::Query {
                        message: format!("Unexpected catalog row: {}", e),
                        sql: Some(sql.to_string()),
                    })
            })
            .collect()
    }

    /// 1行以上返すかどうかを確認
    pub async fn query_exists(&self, sql: &str, binds: &[String]) -> Result<bool, DatabaseError> {
        Ok(!self.query_names(sql, binds).await?.is_empty())
    }
}

/// トランザクション開始SQLを生成
pub fn begin_transaction_sql(dialect: Dialect) -> &'static str {
    match dialect {
        Dialect::MySQL => "START TRANSACTION",
        Dialect::PostgreSQL | Dialect::SQLite => "BEGIN",
    }
}

/// トランザクションコミットSQLを生成
pub fn commit_transaction_sql() -> &'static str {
    "COMMIT"
}

/// トランザクションロールバックSQLを生成
pub fn rollback_transaction_sql() -> &'static str {
    "ROLLBACK"
}

impl DatabaseSession {
    async fn run_transaction_control(
        &self,
        sql: &str,
        expect_open: bool,
        open_after: bool,
    ) -> Result<(), DatabaseError> {
        let mut state = self.state.lock().await;
        if state.in_transaction != expect_open {
            let message = if expect_open {
                format!("{} issued without an active transaction", sql)
            } else {
                "Nested transactions are not supported".to_string()
            };
            return Err(DatabaseError::Transaction { message });
        }

        let connection = state
            .connection
            .as_mut()
            .ok_or(DatabaseError::SessionClosed)?;

        let result = connection.execute(sql).await;
        match result {
            Ok(_) => {
                state.in_transaction = open_after;
                Ok(())
            }
            Err(e) => Err(DatabaseError::Transaction {
                message: format!("{} failed: {}", sql, e),
            }),
        }
    }
}

#[async_trait]
impl TransactionalSession for DatabaseSession {
    async fn begin(&self) -> Result<(), DatabaseError> {
        self.run_transaction_control(begin_transaction_sql(self.dialect), false, true)
            .await
    }

    async fn commit(&self) -> Result<(), DatabaseError> {
        // 失敗時はトランザクションを開いたままにし、ロールバックを可能にする
        self.run_transaction_control(commit_transaction_sql(), true, false)
            .await
    }

    async fn rollback(&self) -> Result<(), DatabaseError> {
        let result = self
            .run_transaction_control(rollback_transaction_sql(), true, false)
            .await;
        if result.is_err() {
            self.state.lock().await.in_transaction = false;
        }
        result
    }
}
