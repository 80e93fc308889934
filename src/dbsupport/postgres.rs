// PostgreSQLサポート
//
// カタログとスキーマは別の名前空間です。
// クォートなし識別子は小文字に変換されます。

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

/// PostgreSQL用DbSupport
#[derive(Debug)]
pub struct PostgresSupport {
    session: DatabaseSession,
}

impl PostgresSupport {
    pub fn new(session: DatabaseSession) -> Self {
        Self { session }
    }
}

#[async_trait]
impl DbSupport for PostgresSupport {
    fn dialect(&self) -> Dialect {
        Dialect::PostgreSQL
    }

    fn catalog_is_schema(&self) -> bool {
        false
    }

    fn session(&self) -> &DatabaseSession {
        &self.session
    }

    async fn current_schema(&self) -> Result<String, MetadataError> {
        query_single_name(
            &self.session,
            "current schema",
            "SELECT CAST(current_schema() AS TEXT)",
        )
        .await
    }

    fn schema(self: Arc<Self>, name: &str) -> Box<dyn Schema> {
        Box::new(PostgresSchema {
            base: SchemaBase::new(self, name),
        })
    }

    fn table(self: Arc<Self>, schema: &str, name: &str) -> Box<dyn Table> {
        Box::new(PostgresTable {
            base: TableBase::new(self, schema, name),
        })
    }
}

/// PostgreSQLテーブル
#[derive(Debug)]
pub struct PostgresTable {
    base: TableBase,
}

#[async_trait]
impl Table for PostgresTable {
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
        let schema = fold_unquoted(self.base.schema_name());
        let name = fold_unquoted(self.base.name());
        self.base.exists_in(&schema, &name, false).await
    }

    async fn has_primary_key(&self) -> Result<bool, MetadataError> {
        self.base.has_primary_key().await
    }

    async fn has_column(&self, column: &str) -> Result<bool, MetadataError> {
        self.base.has_column(column).await
    }

    async fn drop_table(&self) -> Result<(), DdlError> {
        self.base
            .execute_ddl(
                "drop table",
                &format!("DROP TABLE {} CASCADE", self.base.quoted()),
            )
            .await
    }

    async fn lock(&self) -> Result<(), LockError> {
        self.base
            .execute_lock(&format!(
                "LOCK TABLE {} IN SHARE ROW EXCLUSIVE MODE",
                self.base.quoted()
            ))
            .await
    }
}

impl fmt::Display for PostgresTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.base, f)
    }
}

/// PostgreSQLスキーマ
#[derive(Debug)]
pub struct PostgresSchema {
    base: SchemaBase,
}

/// クォートなし識別子の畳み込み（ASCIIの大文字のみ小文字になる）
fn fold_unquoted(name: &str) -> String {
    name.to_ascii_lowercase()
}

const MATERIALIZED_VIEWS_SQL: &str = "SELECT CAST(c.relname AS TEXT) FROM pg_catalog.pg_class c \
     JOIN pg_catalog.pg_namespace n ON n.oid = c.relnamespace \
     WHERE n.nspname = $1 AND c.relkind = 'm'";

const SEQUENCES_SQL: &str = "SELECT CAST(sequence_name AS TEXT) FROM information_schema.sequences \
     WHERE sequence_schema = $1";

const TYPES_SQL: &str = "SELECT CAST(t.typname AS TEXT) FROM pg_catalog.pg_type t \
     JOIN pg_catalog.pg_namespace n ON n.oid = t.typnamespace \
     WHERE n.nspname = $1 AND CAST(t.typtype AS TEXT) = $2";

impl PostgresSchema {
    fn binds(&self) -> Vec<String> {
        vec![self.base.name().to_string()]
    }

    /// 拡張機能に属さないルーチンのシグネチャ（クォート済み）
    ///
    /// `kind` は pg_proc.prokind（f: 関数, p: プロシージャ, a: 集約関数）。
    async fn routine_signatures(&self, kind: &str) -> Result<Vec<String>, MetadataError> {
        let sql = "SELECT format('%I.%I(%s)', n.nspname, p.proname, \
                   pg_catalog.pg_get_function_identity_arguments(p.oid)) \
                   FROM pg_catalog.pg_proc p \
                   JOIN pg_catalog.pg_namespace n ON n.oid = p.pronamespace \
                   WHERE n.nspname = $1 AND CAST(p.prokind AS TEXT) = $2 \
                   AND NOT EXISTS (SELECT 1 FROM pg_catalog.pg_depend d \
                   WHERE d.objid = p.oid AND d.deptype = 'e')";
        self.base
            .query_names(sql, &[self.base.name().to_string(), kind.to_string()])
            .await
    }

    async fn drop_routines(&self, kind: &str, keyword: &str) -> Result<(), SchemaError> {
        for signature in self.routine_signatures(kind).await? {
            self.base
                .execute_ddl(
                    &format!("drop {}", keyword.to_lowercase()),
                    &signature,
                    &format!("DROP {} IF EXISTS {} CASCADE", keyword, signature),
                )
                .await?;
        }
        Ok(())
    }

    async fn drop_types(&self, typtype: &str, keyword: &str) -> Result<(), SchemaError> {
        let names = self
            .base
            .query_names(TYPES_SQL, &[self.base.name().to_string(), typtype.to_string()])
            .await?;
        self.base
            .drop_each(&format!("drop {}", keyword.to_lowercase()), &names, |q| {
                format!("DROP {} IF EXISTS {} CASCADE", keyword, q)
            })
            .await?;
        Ok(())
    }
}

#[async_trait]
impl Schema for PostgresSchema {
    fn name(&self) -> &str {
        self.base.name()
    }

    async fn exists(&self) -> Result<bool, MetadataError> {
        let names = self
            .base
            .query_names(
                "SELECT CAST(nspname AS TEXT) FROM pg_catalog.pg_namespace WHERE nspname = $1 LIMIT 1",
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
            .execute_ddl(
                "drop schema",
                &quoted,
                &format!("DROP SCHEMA {} CASCADE", quoted),
            )
            .await
    }

    async fn clean(&self) -> Result<(), SchemaError> {
        debug!(schema = %self.base, "Dropping views");
        let views = self.base.object_names(&[TableType::View]).await?;
        self.base
            .drop_each("drop view", &views, |q| {
                format!("DROP VIEW IF EXISTS {} CASCADE", q)
            })
            .await?;

        let materialized = self
            .base
            .query_names(MATERIALIZED_VIEWS_SQL, &self.binds())
            .await?;
        self.base
            .drop_each("drop materialized view", &materialized, |q| {
                format!("DROP MATERIALIZED VIEW IF EXISTS {} CASCADE", q)
            })
            .await?;

        debug!(schema = %self.base, "Dropping tables");
        self.base.drop_all_tables().await?;

        let sequences = self.base.query_names(SEQUENCES_SQL, &self.binds()).await?;
        self.base
            .drop_each("drop sequence", &sequences, |q| {
                format!("DROP SEQUENCE IF EXISTS {}", q)
            })
            .await?;

        debug!(schema = %self.base, "Dropping routines and types");
        self.drop_routines("f", "FUNCTION").await?;
        self.drop_routines("a", "AGGREGATE").await?;
        self.drop_routines("p", "PROCEDURE").await?;
        self.drop_types("e", "TYPE").await?;
        self.drop_types("d", "DOMAIN").await?;

        Ok(())
    }

    async fn all_tables(&self) -> Result<Vec<Box<dyn Table>>, MetadataError> {
        self.base.all_tables().await
    }

    fn table(&self, name: &str) -> Box<dyn Table> {
        self.base.table(name)
    }
}

impl fmt::Display for PostgresSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.base, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fold_unquoted_keeps_non_ascii() {
        assert_eq!(fold_unquoted("Users"), "users");
        assert_eq!(fold_unquoted("ÄUDIT_Log"), "Äudit_log");
        assert_eq!(fold_unquoted("Straße"), "straße");
    }
}
