// エラー型定義
//
// スキーマライフサイクル操作で使用されるカスタムエラー型を提供します。
// thiserrorを使用して、DatabaseError, MetadataError, DdlError, LockError,
// SchemaError, CleanError を定義します。

use serde::Serialize;
use thiserror::Error;

/// データベースエラー
///
/// セッション（接続）レベルで発生するエラーを表現します。
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Connection error
    #[error("Database connection error: {message} (cause: {cause})")]
    Connection {
        /// エラーメッセージ
        message: String,
        /// エラー原因
        cause: String,
    },

    /// Query execution error
    #[error("Query execution error: {message}")]
    Query {
        /// エラーメッセージ
        message: String,
        /// 失敗したSQL
        sql: Option<String>,
    },

    /// Transaction error
    #[error("Transaction error: {message}")]
    Transaction {
        /// エラーメッセージ
        message: String,
    },

    /// Session already closed
    #[error("Database session is closed")]
    SessionClosed,
}

impl DatabaseError {
    /// 接続エラーかどうか
    pub fn is_connection(&self) -> bool {
        matches!(self, DatabaseError::Connection { .. })
    }

    /// クエリエラーかどうか
    pub fn is_query(&self) -> bool {
        matches!(self, DatabaseError::Query { .. })
    }

    /// トランザクションエラーかどうか
    pub fn is_transaction(&self) -> bool {
        matches!(self, DatabaseError::Transaction { .. })
    }

    /// セッション終了後の操作かどうか
    pub fn is_session_closed(&self) -> bool {
        matches!(self, DatabaseError::SessionClosed)
    }

    /// 失敗したSQLを取得
    pub fn sql(&self) -> Option<&str> {
        match self {
            DatabaseError::Query { sql, .. } => sql.as_deref(),
            _ => None,
        }
    }
}

/// カタログ参照エラー
///
/// システムカタログへの問い合わせ（テーブル・カラム・主キー一覧）の失敗を表現します。
#[derive(Debug, Error)]
#[error("Catalog lookup failed for {object}: {source}")]
pub struct MetadataError {
    /// 対象オブジェクト（クォート済みの表示形式）
    pub object: String,
    /// 原因
    #[source]
    pub source: DatabaseError,
}

impl MetadataError {
    /// 新しいカタログ参照エラーを作成
    pub fn new(object: impl Into<String>, source: DatabaseError) -> Self {
        Self {
            object: object.into(),
            source,
        }
    }
}

/// DDLエラー
///
/// 構造変更（DROP/CREATE等）の失敗を表現します。
#[derive(Debug, Error)]
pub enum DdlError {
    /// DDL execution failed
    #[error("Failed to {operation} {object}: {source}")]
    Execution {
        /// 操作名（drop table, clean schema など）
        operation: String,
        /// 対象オブジェクト
        object: String,
        /// 原因
        #[source]
        source: DatabaseError,
    },

    /// Operation not supported by the dialect
    #[error("{dialect} does not support {operation} ({object})")]
    Unsupported {
        /// 操作名
        operation: String,
        /// 対象オブジェクト
        object: String,
        /// データベース方言
        dialect: String,
    },
}

impl DdlError {
    /// 実行エラーかどうか
    pub fn is_execution(&self) -> bool {
        matches!(self, DdlError::Execution { .. })
    }

    /// 未サポート操作かどうか
    pub fn is_unsupported(&self) -> bool {
        matches!(self, DdlError::Unsupported { .. })
    }
}

/// ロックエラー
///
/// テーブルロックの取得失敗（タイムアウト、未サポート）を表現します。
#[derive(Debug, Error)]
pub enum LockError {
    /// Lock was not granted
    #[error("Unable to lock table {table}: {source}")]
    Denied {
        /// 対象テーブル
        table: String,
        /// 原因
        #[source]
        source: DatabaseError,
    },

    /// Locking not supported by the dialect
    #[error("Unable to lock table {table}: {dialect} does not support table locking")]
    Unsupported {
        /// 対象テーブル
        table: String,
        /// データベース方言
        dialect: String,
    },
}

impl LockError {
    /// ロック拒否かどうか
    pub fn is_denied(&self) -> bool {
        matches!(self, LockError::Denied { .. })
    }

    /// 未サポートかどうか
    pub fn is_unsupported(&self) -> bool {
        matches!(self, LockError::Unsupported { .. })
    }
}

/// スキーマ操作エラー
///
/// スキーマ単位の操作中に発生した下位エラーを集約します。
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error(transparent)]
    Metadata(#[from] MetadataError),

    #[error(transparent)]
    Ddl(#[from] DdlError),

    #[error(transparent)]
    Lock(#[from] LockError),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

/// ライフサイクル操作の種類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CleanMode {
    /// スキーマ内の全オブジェクトを削除（スキーマ自体は残す）
    Clean,
    /// スキーマ自体を削除
    Drop,
}

impl CleanMode {
    /// drop_schemasフラグからモードを決定
    pub fn from_drop_schemas(drop_schemas: bool) -> Self {
        if drop_schemas {
            CleanMode::Drop
        } else {
            CleanMode::Clean
        }
    }

    /// 進行形の動詞（ログ・エラーメッセージ用）
    pub fn progressive(&self) -> &'static str {
        match self {
            CleanMode::Clean => "cleaning",
            CleanMode::Drop => "dropping",
        }
    }

    /// 過去形の動詞（ログ・サマリー用）
    pub fn past_tense(&self) -> &'static str {
        match self {
            CleanMode::Clean => "Cleaned",
            CleanMode::Drop => "Dropped",
        }
    }
}

impl std::fmt::Display for CleanMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CleanMode::Clean => write!(f, "clean"),
            CleanMode::Drop => write!(f, "drop"),
        }
    }
}

/// クリーンエラー
///
/// どのスキーマのどの操作で失敗したかと、その原因を保持します。
#[derive(Debug, Error)]
#[error("Error while {} schema {schema}: {source}", .mode.progressive())]
pub struct CleanError {
    /// 失敗したスキーマ名
    pub schema: String,
    /// 実行していた操作
    pub mode: CleanMode,
    /// 原因
    #[source]
    pub source: SchemaError,
}

impl CleanError {
    /// 新しいクリーンエラーを作成
    pub fn new(schema: impl Into<String>, mode: CleanMode, source: SchemaError) -> Self {
        Self {
            schema: schema.into(),
            mode,
            source,
        }
    }

    /// 失敗したスキーマを取得
    pub fn schema(&self) -> &str {
        &self.schema
    }
}
