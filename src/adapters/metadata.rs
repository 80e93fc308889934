// カタログメタデータアクセス
//
// システムカタログ（INFORMATION_SCHEMA / sqlite_master / PRAGMA）に対する
// 読み取り専用の問い合わせを抽象化します。
// catalog, schema, table, column の各引数はすべて省略可能です。

use crate::adapters::session::DatabaseSession;
use crate::adapters::sql_quote::{quote_identifier_sqlite, quote_literal};
use crate::core::config::Dialect;
use crate::core::error::DatabaseError;
use async_trait::async_trait;

/// 検索対象のテーブル種別
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableType {
    /// 通常のテーブル
    Table,
    /// ビュー
    View,
}

impl TableType {
    /// INFORMATION_SCHEMA.TABLES.TABLE_TYPE の値
    fn information_schema_name(&self) -> &'static str {
        match self {
            TableType::Table => "BASE TABLE",
            TableType::View => "VIEW",
        }
    }

    /// sqlite_master.type の値
    fn sqlite_name(&self) -> &'static str {
        match self {
            TableType::Table => "table",
            TableType::View => "view",
        }
    }
}

/// カタログ検索条件
#[derive(Debug, Clone, Default)]
pub struct CatalogFilter<'a> {
    /// カタログ名
    pub catalog: Option<&'a str>,
    /// スキーマ名
    pub schema: Option<&'a str>,
    /// テーブル名
    pub table: Option<&'a str>,
    /// カラム名
    pub column: Option<&'a str>,
    /// テーブル種別（空の場合はすべて）
    pub table_types: &'a [TableType],
    /// 大文字小文字を区別せずに比較する
    pub ignore_case: bool,
}

impl<'a> CatalogFilter<'a> {
    /// catalog/schema を指定して検索条件を作成
    pub fn scoped(catalog: Option<&'a str>, schema: Option<&'a str>) -> Self {
        Self {
            catalog,
            schema,
            ..Default::default()
        }
    }

    pub fn with_table(mut self, table: &'a str) -> Self {
        self.table = Some(table);
        self
    }

    pub fn with_column(mut self, column: &'a str) -> Self {
        self.column = Some(column);
        self
    }

    pub fn with_types(mut self, table_types: &'a [TableType]) -> Self {
        self.table_types = table_types;
        self
    }

    pub fn ignoring_case(mut self) -> Self {
        self.ignore_case = true;
        self
    }
}

/// 問い合わせ対象のカタログオブジェクト
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogObject {
    Tables,
    Columns,
    PrimaryKeys,
}

/// カタログメタデータ読み取りインターフェース
#[async_trait]
pub trait MetadataAccess: Send + Sync {
    /// 条件に一致するテーブル名一覧
    async fn tables(&self, filter: &CatalogFilter<'_>) -> Result<Vec<String>, DatabaseError>;

    /// 条件に一致するカラム名一覧
    async fn columns(&self, filter: &CatalogFilter<'_>) -> Result<Vec<String>, DatabaseError>;

    /// 条件に一致する主キーカラム名一覧
    async fn primary_keys(&self, filter: &CatalogFilter<'_>)
        -> Result<Vec<String>, DatabaseError>;

    /// 条件に一致するオブジェクトが1つでも存在するか（最初の一致で打ち切る）
    async fn any(
        &self,
        object: CatalogObject,
        filter: &CatalogFilter<'_>,
    ) -> Result<bool, DatabaseError>;
}

#[async_trait]
impl MetadataAccess for DatabaseSession {
    async fn tables(&self, filter: &CatalogFilter<'_>) -> Result<Vec<String>, DatabaseError> {
        let query = build_catalog_query(self.dialect(), CatalogObject::Tables, filter, false);
        self.query_names(&query.sql, &query.binds).await
    }

    async fn columns(&self, filter: &CatalogFilter<'_>) -> Result<Vec<String>, DatabaseError> {
        let query = build_catalog_query(self.dialect(), CatalogObject::Columns, filter, false);
        self.query_names(&query.sql, &query.binds).await
    }

    async fn primary_keys(
        &self,
        filter: &CatalogFilter<'_>,
    ) -> Result<Vec<String>, DatabaseError> {
        let query = build_catalog_query(self.dialect(), CatalogObject::PrimaryKeys, filter, false);
        self.query_names(&query.sql, &query.binds).await
    }

    async fn any(
        &self,
        object: CatalogObject,
        filter: &CatalogFilter<'_>,
    ) -> Result<bool, DatabaseError> {
        let query = build_catalog_query(self.dialect(), object, filter, true);
        self.query_exists(&query.sql, &query.binds).await
    }
}

/// 生成されたカタログクエリ
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogQuery {
    pub sql: String,
    pub binds: Vec<String>,
}

struct QueryBuilder {
    dialect: Dialect,
    sql: String,
    binds: Vec<String>,
}

impl QueryBuilder {
    fn new(dialect: Dialect, base: &str) -> Self {
        Self {
            dialect,
            sql: base.to_string(),
            binds: Vec::new(),
        }
    }

    fn placeholder(&self) -> String {
        match self.dialect {
            Dialect::PostgreSQL => format!("${}", self.binds.len()),
            Dialect::MySQL | Dialect::SQLite => "?".to_string(),
        }
    }

    fn column_expr(&self, column: &str) -> String {
        match self.dialect {
            Dialect::PostgreSQL => format!("CAST({} AS TEXT)", column),
            Dialect::MySQL | Dialect::SQLite => column.to_string(),
        }
    }

    fn push_eq(&mut self, column: &str, value: Option<&str>, ignore_case: bool) {
        let Some(value) = value else {
            return;
        };
        self.binds.push(value.to_string());
        let placeholder = self.placeholder();
        let column = self.column_expr(column);
        if ignore_case {
            self.sql.push_str(&format!(
                " AND LOWER({}) = LOWER({})",
                column, placeholder
            ));
        } else {
            self.sql
                .push_str(&format!(" AND {} = {}", column, placeholder));
        }
    }

    fn push_in(&mut self, column: &str, values: &[&str]) {
        if values.is_empty() {
            return;
        }
        let list = values
            .iter()
            .map(|v| quote_literal(v))
            .collect::<Vec<_>>()
            .join(", ");
        self.sql.push_str(&format!(" AND {} IN ({})", column, list));
    }

    fn push(&mut self, fragment: &str) {
        self.sql.push(' ');
        self.sql.push_str(fragment);
    }

    fn finish(mut self, first_only: bool) -> CatalogQuery {
        if first_only {
            self.sql.push_str(" LIMIT 1");
        }
        CatalogQuery {
            sql: self.sql,
            binds: self.binds,
        }
    }
}

/// 方言とオブジェクト種別に応じたカタログクエリを生成
///
/// `first_only` の場合は `LIMIT 1` を付与します。
pub fn build_catalog_query(
    dialect: Dialect,
    object: CatalogObject,
    filter: &CatalogFilter<'_>,
    first_only: bool,
) -> CatalogQuery {
    match dialect {
        Dialect::PostgreSQL => postgres_catalog_query(object, filter, first_only),
        Dialect::MySQL => mysql_catalog_query(object, filter, first_only),
        Dialect::SQLite => sqlite_catalog_query(object, filter, first_only),
    }
}

fn information_schema_types(filter: &CatalogFilter<'_>) -> Vec<&'static str> {
    filter
        .table_types
        .iter()
        .map(|t| t.information_schema_name())
        .collect()
}

fn postgres_catalog_query(
    object: CatalogObject,
    filter: &CatalogFilter<'_>,
    first_only: bool,
) -> CatalogQuery {
    let ic = filter.ignore_case;
    match object {
        CatalogObject::Tables => {
            let mut q = QueryBuilder::new(
                Dialect::PostgreSQL,
                "SELECT CAST(table_name AS TEXT) FROM information_schema.tables WHERE 1 = 1",
            );
            q.push_eq("table_catalog", filter.catalog, ic);
            q.push_eq("table_schema", filter.schema, ic);
            q.push_eq("table_name", filter.table, ic);
            q.push_in("table_type", &information_schema_types(filter));
            q.push("ORDER BY table_name");
            q.finish(first_only)
        }
        CatalogObject::Columns => {
            let mut q = QueryBuilder::new(
                Dialect::PostgreSQL,
                "SELECT CAST(column_name AS TEXT) FROM information_schema.columns WHERE 1 = 1",
            );
            q.push_eq("table_catalog", filter.catalog, ic);
            q.push_eq("table_schema", filter.schema, ic);
            q.push_eq("table_name", filter.table, ic);
            q.push_eq("column_name", filter.column, ic);
            q.push("ORDER BY table_name, ordinal_position");
            q.finish(first_only)
        }
        CatalogObject::PrimaryKeys => {
            let mut q = QueryBuilder::new(
                Dialect::PostgreSQL,
                "SELECT CAST(kcu.column_name AS TEXT) \
                 FROM information_schema.table_constraints tc \
                 JOIN information_schema.key_column_usage kcu \
                   ON tc.constraint_catalog = kcu.constraint_catalog \
                  AND tc.constraint_schema = kcu.constraint_schema \
                  AND tc.constraint_name = kcu.constraint_name \
                 WHERE tc.constraint_type = 'PRIMARY KEY'",
            );
            q.push_eq("tc.table_catalog", filter.catalog, ic);
            q.push_eq("tc.table_schema", filter.schema, ic);
            q.push_eq("tc.table_name", filter.table, ic);
            q.push("ORDER BY tc.table_name, kcu.ordinal_position");
            q.finish(first_only)
        }
    }
}

/// MySQLではカタログ＝データベース＝スキーマのため、どちらの引数も TABLE_SCHEMA に対応します。
fn mysql_catalog_query(
    object: CatalogObject,
    filter: &CatalogFilter<'_>,
    first_only: bool,
) -> CatalogQuery {
    let ic = filter.ignore_case;
    let database = filter.catalog.or(filter.schema);
    match object {
        CatalogObject::Tables => {
            let mut q = QueryBuilder::new(
                Dialect::MySQL,
                "SELECT CAST(table_name AS CHAR) FROM information_schema.tables WHERE 1 = 1",
            );
            q.push_eq("table_schema", database, ic);
            q.push_eq("table_name", filter.table, ic);
            q.push_in("table_type", &information_schema_types(filter));
            q.push("ORDER BY table_name");
            q.finish(first_only)
        }
        CatalogObject::Columns => {
            let mut q = QueryBuilder::new(
                Dialect::MySQL,
                "SELECT CAST(column_name AS CHAR) FROM information_schema.columns WHERE 1 = 1",
            );
            q.push_eq("table_schema", database, ic);
            q.push_eq("table_name", filter.table, ic);
            q.push_eq("column_name", filter.column, ic);
            q.push("ORDER BY table_name, ordinal_position");
            q.finish(first_only)
        }
        CatalogObject::PrimaryKeys => {
            let mut q = QueryBuilder::new(
                Dialect::MySQL,
                "SELECT CAST(column_name AS CHAR) FROM information_schema.key_column_usage \
                 WHERE constraint_name = 'PRIMARY'",
            );
            q.push_eq("table_schema", database, ic);
            q.push_eq("table_name", filter.table, ic);
            q.push("ORDER BY table_name, ordinal_position");
            q.finish(first_only)
        }
    }
}

/// SQLiteではアタッチされたデータベース名がカタログ兼スキーマになります。
/// 省略時は `main` を対象とします。
fn sqlite_catalog_query(
    object: CatalogObject,
    filter: &CatalogFilter<'_>,
    first_only: bool,
) -> CatalogQuery {
    let ic = filter.ignore_case;
    let database = filter.catalog.or(filter.schema).unwrap_or("main");
    let master = format!("{}.sqlite_master", quote_identifier_sqlite(database));

    let types: Vec<&str> = if filter.table_types.is_empty() {
        vec!["table", "view"]
    } else {
        filter.table_types.iter().map(|t| t.sqlite_name()).collect()
    };

    match object {
        CatalogObject::Tables => {
            let mut q = QueryBuilder::new(
                Dialect::SQLite,
                &format!(
                    "SELECT name FROM {} WHERE name NOT LIKE 'sqlite\\_%' ESCAPE '\\'",
                    master
                ),
            );
            q.push_in("type", &types);
            q.push_eq("name", filter.table, ic);
            q.push("ORDER BY name");
            q.finish(first_only)
        }
        CatalogObject::Columns | CatalogObject::PrimaryKeys => {
            let mut q = QueryBuilder::new(
                Dialect::SQLite,
                &format!(
                    "SELECT p.name FROM {} m JOIN pragma_table_info(m.name, {}) p \
                     WHERE m.type = 'table'",
                    master,
                    quote_literal(database)
                ),
            );
            q.push_eq("m.name", filter.table, ic);
            if object == CatalogObject::Columns {
                q.push_eq("p.name", filter.column, ic);
                q.push("ORDER BY m.name, p.cid");
            } else {
                q.push("AND p.pk > 0 ORDER BY m.name, p.pk");
            }
            q.finish(first_only)
        }
    }
}
