// MySQLサポート
//
// MySQLではカタログ（データベース）とスキーマは同じ名前空間です。
// DDLは暗黙的にコミットされるため、clean/drop はロールバックできません。

use crate::adapters::metadata::TableType;
use crate::adapters::session::DatabaseSession;
use crate::core::config::Dialect;
use crate::core::error::{DdlError, LockError, MetadataError, SchemaError};
use crate::dbsupport::schema::{Schema, SchemaBase};
use crate::dbsupport::table::{Table, TableBase};
use crate::dbsupport::{query_single_name, DbSupport};
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// MySQL用DbSupport
#[derive(Debug)]
pub struct MySqlSupport {
    session: DatabaseSession,
}

impl MySqlSupport {
    pub fn new(session: DatabaseSession) -> Self {
        Self { session }
    }
}

#[async_trait]
impl DbSupport for MySqlSupport {
    fn dialect(&self) -> Dialect {
        Dialect::MySQL
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
            "SELECT CAST(COALESCE(DATABASE(), '') AS CHAR)",
        )
        .await
    }

    fn schema(self: Arc<Self>, name: &str) -> Box<dyn Schema> {
        Box::new(MySqlSchema {
            base: SchemaBase::new(self, name),
        })
    }

    fn table(self: Arc<Self>, schema: &str, name: &str) -> Box<dyn Table> {
        Box::new(MySqlTable {
            base: TableBase::new(self, schema, name),
        })
    }
}

/// MySQLテーブル
#[derive(Debug)]
pub struct MySqlTable {
    base: TableBase,
}

#[async_trait]
impl Table for MySqlTable {
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
        // 識別子の大文字小文字はサーバー設定に従うため、変換せずに問い合わせる
        self.exists().await
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
        self.base
            .execute_lock(&format!("SELECT * FROM {} FOR UPDATE", self.base.quoted()))
            .await
    }
}

impl fmt::Display for MySqlTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.base, f)
    }
}

/// MySQLスキーマ
#[derive(Debug)]
pub struct MySqlSchema {
    base: SchemaBase,
}

const ROUTINES_SQL: &str = "SELECT CAST(routine_name AS CHAR) FROM information_schema.routines \
     WHERE routine_schema = ? AND routine_type = ?";

const EVENTS_SQL: &str =
    "SELECT CAST(event_name AS CHAR) FROM information_schema.events WHERE event_schema = ?";

impl MySqlSchema {
    fn binds(&self) -> Vec<String> {
        vec![self.base.name().to_string()]
    }

    async fn foreign_key_checks(&self) -> Result<String, MetadataError> {
        query_single_name(
            self.base.session(),
            "foreign key checks",
            "SELECT CAST(@@foreign_key_checks AS CHAR)",
        )
        .await
    }

    /// 外部キー検査を無効にしてテーブルを削除し、最後に元の設定へ戻す
    async fn drop_tables(&self) -> Result<(), SchemaError> {
        let previous = self.foreign_key_checks().await?;
        let object = self.base.quoted();

        self.base
            .execute_ddl(
                "disable foreign key checks",
                &object,
                "SET FOREIGN_KEY_CHECKS = 0",
            )
            .await?;

        let dropped = self.base.drop_all_tables().await;

        let restored = self
            .base
            .execute_ddl(
                "restore foreign key checks",
                &object,
                &format!("SET FOREIGN_KEY_CHECKS = {}", if previous == "0" { 0 } else { 1 }),
            )
            .await;

        dropped?;
        restored?;
        Ok(())
    }

    async fn drop_routines(&self, routine_type: &str) -> Result<(), SchemaError> {
        let names = self
            .base
            .query_names(
                ROUTINES_SQL,
                &[self.base.name().to_string(), routine_type.to_string()],
            )
            .await?;
        self.base
            .drop_each(
                &format!("drop {}", routine_type.to_lowercase()),
                &names,
                |q| format!("DROP {} IF EXISTS {}", routine_type, q),
            )
            .await?;
        Ok(())
    }
}

#[async_trait]
impl Schema for MySqlSchema {
    fn name(&self) -> &str {
        self.base.name()
    }

    async fn exists(&self) -> Result<bool, MetadataError> {
        let names = self
            .base
            .query_names(
                "SELECT CAST(schema_name AS CHAR) FROM information_schema.schemata \
                 WHERE schema_name = ? LIMIT 1",
                &self.binds(),
            )
            .await?;
        Ok(!names.is_empty())
    }

    async fn empty(&self) -> Result<bool, MetadataError> {
        self.base.is_empty().await
    }

    async fn create(&self) -> Result<(), DdlError> {
        let quoted = self.base.quoted();
        self.base
            .execute_ddl("create schema", &quoted, &format!("CREATE SCHEMA {}", quoted))
            .await
    }

    async fn drop_schema(&self) -> Result<(), DdlError> {
        let quoted = self.base.quoted();
        self.base
            .execute_ddl("drop schema", &quoted, &format!("DROP SCHEMA {}", quoted))
            .await
    }

    async fn clean(&self) -> Result<(), SchemaError> {
        debug!(schema = %self.base, "Dropping views");
        let views = self.base.object_names(&[TableType::View]).await?;
        self.base
            .drop_each("drop view", &views, |q| format!("DROP VIEW IF EXISTS {}", q))
            .await?;

        debug!(schema = %self.base, "Dropping tables");
        self.drop_tables().await?;

        debug!(schema = %self.base, "Dropping routines and events");
        self.drop_routines("PROCEDURE").await?;
        self.drop_routines("FUNCTION").await?;

        let events = self.base.query_names(EVENTS_SQL, &self.binds()).await?;
        self.base
            .drop_each("drop event", &events, |q| format!("DROP EVENT IF EXISTS {}", q))
            .await?;

        Ok(())
    }

    async fn all_tables(&self) -> Result<Vec<Box<dyn Table>>, MetadataError> {
        self.base.all_tables().await
    }

    fn table(&self, name: &str) -> Box<dyn Table> {
        self.base.table(name)
    }
}

impl fmt::Display for MySqlSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.base, f)
    }
}
