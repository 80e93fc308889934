// SQLiteサポート
//
// アタッチされたデータベース名（main, temp, ATTACH ... AS name）がカタログ兼スキーマです。
// スキーマの作成・削除（ATTACH / DETACH）はトランザクション内で実行できないため未サポートです。

use crate::adapters::metadata::TableType;
use crate::adapters::session::DatabaseSession;
use crate::adapters::sql_quote::quote_identifier_sqlite;
use crate::core::config::Dialect;
use crate::core::error::{DdlError, LockError, MetadataError, SchemaError};
use crate::dbsupport::schema::{Schema, SchemaBase};
use crate::dbsupport::table::{Table, TableBase};
use crate::dbsupport::{query_single_name, DbSupport};
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// SQLite用DbSupport
#[derive(Debug)]
pub struct SqliteSupport {
    session: DatabaseSession,
}

impl SqliteSupport {
    pub fn new(session: DatabaseSession) -> Self {
        Self { session }
    }
}

#[async_trait]
impl DbSupport for SqliteSupport {
    fn dialect(&self) -> Dialect {
        Dialect::SQLite
    }

    fn catalog_is_schema(&self) -> bool {
        true
    }

    fn session(&self) -> &DatabaseSession {
        &self.session
    }

    async fn current_schema(&self) -> Result<String, MetadataError> {
        query_single_name(
            &self.session,
            "current database",
            "SELECT name FROM pragma_database_list WHERE seq = 0",
        )
        .await
    }

    fn schema(self: Arc<Self>, name: &str) -> Box<dyn Schema> {
        Box::new(SqliteSchema {
            base: SchemaBase::new(self, name),
        })
    }

    fn table(self: Arc<Self>, schema: &str, name: &str) -> Box<dyn Table> {
        Box::new(SqliteTable {
            base: TableBase::new(self, schema, name),
        })
    }
}

/// SQLiteテーブル
#[derive(Debug)]
pub struct SqliteTable {
    base: TableBase,
}

#[async_trait]
impl Table for SqliteTable {
    fn schema_name(&self) -> &str {
        self.base.schema_name()
    }

    fn name(&self) -> &str {
        self.base.name()
    }

    async fn exists(&self) -> Result<bool, MetadataError> {
        self.base
            .exists_in(self.base.schema_name(), self.base.name(), false)
            .await
    }

    async fn exists_no_quotes(&self) -> Result<bool, MetadataError> {
        // SQLiteの識別子は大文字小文字を区別しない
        self.base
            .exists_in(self.base.schema_name(), self.base.name(), true)
            .await
    }

    async fn has_primary_key(&self) -> Result<bool, MetadataError> {
        self.base.has_primary_key().await
    }

    async fn has_column(&self, column: &str) -> Result<bool, MetadataError> {
        self.base.has_column(column).await
    }

    async fn drop_table(&self) -> Result<(), DdlError> {
        self.base
            .execute_ddl("drop table", &format!("DROP TABLE {}", self.base.quoted()))
            .await
    }

    async fn lock(&self) -> Result<(), LockError> {
        Err(self.base.lock_unsupported())
    }
}

impl fmt::Display for SqliteTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.base, f)
    }
}

/// SQLiteスキーマ
#[derive(Debug)]
pub struct SqliteSchema {
    base: SchemaBase,
}

impl SqliteSchema {
    fn master(&self) -> String {
        format!("{}.sqlite_master", quote_identifier_sqlite(self.base.name()))
    }

    async fn names_of_type(&self, object_type: &str) -> Result<Vec<String>, MetadataError> {
        let sql = format!(
            "SELECT name FROM {} WHERE type = ? AND name NOT LIKE 'sqlite\\_%' ESCAPE '\\' \
             ORDER BY name",
            self.master()
        );
        self.base.query_names(&sql, &[object_type.to_string()]).await
    }

    /// AUTOINCREMENT の採番状態をリセット
    async fn reset_sequences(&self) -> Result<(), SchemaError> {
        let sql = format!(
            "SELECT name FROM {} WHERE type = 'table' AND name = 'sqlite_sequence'",
            self.master()
        );
        if self.base.query_names(&sql, &[]).await?.is_empty() {
            return Ok(());
        }

        let sequence = self.base.qualify("sqlite_sequence");
        self.base
            .execute_ddl(
                "reset sequences",
                &sequence,
                &format!("DELETE FROM {}", sequence),
            )
            .await?;
        Ok(())
    }
}

#[async_trait]
impl Schema for SqliteSchema {
    fn name(&self) -> &str {
        self.base.name()
    }

    async fn exists(&self) -> Result<bool, MetadataError> {
        let names = self
            .base
            .query_names(
                "SELECT name FROM pragma_database_list WHERE name = ? LIMIT 1",
                &[self.base.name().to_string()],
            )
            .await?;
        Ok(!names.is_empty())
    }

    async fn empty(&self) -> Result<bool, MetadataError> {
        self.base.is_empty().await
    }

    async fn create(&self) -> Result<(), DdlError> {
        Err(self.base.unsupported("create schema"))
    }

    async fn drop_schema(&self) -> Result<(), DdlError> {
        Err(self.base.unsupported("drop schema"))
    }

    async fn clean(&self) -> Result<(), SchemaError> {
        // 外部キー検査をコミット時まで遅延させ、削除順序に依存しないようにする
        self.base
            .execute_ddl(
                "defer foreign keys",
                &self.base.quoted(),
                "PRAGMA defer_foreign_keys = ON",
            )
            .await?;

        debug!(schema = %self.base, "Dropping views and triggers");
        let views = self.base.object_names(&[TableType::View]).await?;
        self.base
            .drop_each("drop view", &views, |q| format!("DROP VIEW IF EXISTS {}", q))
            .await?;

        let triggers = self.names_of_type("trigger").await?;
        self.base
            .drop_each("drop trigger", &triggers, |q| {
                format!("DROP TRIGGER IF EXISTS {}", q)
            })
            .await?;

        debug!(schema = %self.base, "Dropping tables");
        self.base.drop_all_tables().await?;
        self.reset_sequences().await?;

        Ok(())
    }

    async fn all_tables(&self) -> Result<Vec<Box<dyn Table>>, MetadataError> {
        self.base.all_tables().await
    }

    fn table(&self, name: &str) -> Box<dyn Table> {
        self.base.table(name)
    }
}

impl fmt::Display for SqliteSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.base, f)
    }
}
