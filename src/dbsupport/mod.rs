// データベースサポート
//
// 方言ごとの能力（カタログとスキーマの関係、識別子クォート）と、
// Table/Schema 実装の生成を一つのトレイトにまとめます。
// 実装はセッションごとに一度だけ選択されます。

pub mod mysql;
pub mod postgres;
pub mod schema;
pub mod sqlite;
pub mod table;

use crate::adapters::metadata::CatalogFilter;
use crate::adapters::session::DatabaseSession;
use crate::adapters::sql_quote::quote_qualified;
use crate::core::config::Dialect;
use crate::core::error::{DatabaseError, MetadataError};
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

pub use schema::{Schema, SchemaBase};
pub use table::{Table, TableBase};

/// 方言ごとのデータベースサポート
///
/// セッションと同じ寿命を持ち、そのセッション上の Table/Schema を生成します。
#[async_trait]
pub trait DbSupport: Send + Sync + fmt::Debug {
    /// データベース方言
    fn dialect(&self) -> Dialect;

    /// カタログとスキーマが同じ名前空間かどうか
    ///
    /// trueの場合、スキーマ名はカタログ引数としてメタデータ問い合わせに渡されます。
    fn catalog_is_schema(&self) -> bool;

    /// 共有セッション
    fn session(&self) -> &DatabaseSession;

    /// 生の識別子を常にエスケープしてドットで連結
    fn quote(&self, parts: &[&str]) -> String {
        quote_qualified(self.dialect(), parts)
    }

    /// 現在のスキーマ名
    async fn current_schema(&self) -> Result<String, MetadataError>;

    /// スキーマを取得（存在確認は行わない）
    fn schema(self: Arc<Self>, name: &str) -> Box<dyn Schema>;

    /// テーブルを取得（存在確認は行わない）
    fn table(self: Arc<Self>, schema: &str, name: &str) -> Box<dyn Table>;
}

/// セッションの方言に応じたDbSupportを作成
pub fn create_db_support(session: DatabaseSession) -> Arc<dyn DbSupport> {
    match session.dialect() {
        Dialect::PostgreSQL => Arc::new(postgres::PostgresSupport::new(session)),
        Dialect::MySQL => Arc::new(mysql::MySqlSupport::new(session)),
        Dialect::SQLite => Arc::new(sqlite::SqliteSupport::new(session)),
    }
}

/// スキーマ名をカタログ引数とスキーマ引数のどちらに渡すかを決定
pub fn catalog_scope<'a>(support: &dyn DbSupport, schema: &'a str) -> CatalogFilter<'a> {
    if support.catalog_is_schema() {
        CatalogFilter::scoped(Some(schema), None)
    } else {
        CatalogFilter::scoped(None, Some(schema))
    }
}

/// 単一値を返す問い合わせの結果を取り出す
pub(crate) async fn query_single_name(
    session: &DatabaseSession,
    object: &str,
    sql: &str,
) -> Result<String, MetadataError> {
    let names = session
        .query_names(sql, &[])
        .await
        .map_err(|e| MetadataError::new(object, e))?;

    match names.into_iter().next() {
        Some(name) if !name.is_empty() => Ok(name),
        _ => Err(MetadataError::new(
            object,
            DatabaseError::Query {
                message: format!("No {} is selected for this session", object),
                sql: Some(sql.to_string()),
            },
        )),
    }
}
