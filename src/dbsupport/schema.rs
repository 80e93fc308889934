// スキーマ契約
//
// 名前付きのテーブル群に対する集約操作（clean / drop）を定義します。
// テーブル一覧は保持せず、必要になるたびにカタログから取得します。

use crate::adapters::metadata::{CatalogObject, MetadataAccess, TableType};
use crate::adapters::session::DatabaseSession;
use crate::core::error::{DatabaseError, DdlError, MetadataError, SchemaError};
use crate::dbsupport::table::Table;
use crate::dbsupport::{catalog_scope, DbSupport};
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

/// スキーマ
///
/// 表示形式はクォート済みのスキーマ名です。
#[async_trait]
pub trait Schema: Send + Sync + fmt::Display + fmt::Debug {
    /// スキーマ名
    fn name(&self) -> &str;

    /// スキーマが存在するかどうか
    async fn exists(&self) -> Result<bool, MetadataError>;

    /// テーブルやビューを1つも含まないかどうか
    async fn empty(&self) -> Result<bool, MetadataError>;

    /// スキーマを作成
    async fn create(&self) -> Result<(), DdlError>;

    /// スキーマ自体を削除
    async fn drop_schema(&self) -> Result<(), DdlError>;

    /// スキーマ内の全オブジェクトを削除（スキーマは残す）
    async fn clean(&self) -> Result<(), SchemaError>;

    /// スキーマ内の全テーブル
    async fn all_tables(&self) -> Result<Vec<Box<dyn Table>>, MetadataError>;

    /// 名前を指定してテーブルを取得（存在確認は行わない）
    fn table(&self, name: &str) -> Box<dyn Table>;
}

/// スキーマ実装の共通部分
#[derive(Debug, Clone)]
pub struct SchemaBase {
    support: Arc<dyn DbSupport>,
    name: String,
}

impl SchemaBase {
    pub fn new(support: Arc<dyn DbSupport>, name: impl Into<String>) -> Self {
        Self {
            support,
            name: name.into(),
        }
    }

    pub fn support(&self) -> &Arc<dyn DbSupport> {
        &self.support
    }

    pub fn session(&self) -> &DatabaseSession {
        self.support.session()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// クォート済みのスキーマ名
    pub fn quoted(&self) -> String {
        self.support.quote(&[&self.name])
    }

    /// クォート済みの `schema.object`
    pub fn qualify(&self, object: &str) -> String {
        self.support.quote(&[&self.name, object])
    }

    /// このスキーマのテーブルを生成
    pub fn table(&self, name: &str) -> Box<dyn Table> {
        Arc::clone(&self.support).table(&self.name, name)
    }

    fn metadata_error(&self, source: DatabaseError) -> MetadataError {
        MetadataError::new(self.quoted(), source)
    }

    /// 指定した種別のオブジェクト名一覧
    pub async fn object_names(&self, types: &[TableType]) -> Result<Vec<String>, MetadataError> {
        let filter = catalog_scope(self.support.as_ref(), &self.name).with_types(types);

        self.session()
            .tables(&filter)
            .await
            .map_err(|e| self.metadata_error(e))
    }

    /// テーブルもビューも存在しないかどうか
    pub async fn is_empty(&self) -> Result<bool, MetadataError> {
        let filter = catalog_scope(self.support.as_ref(), &self.name)
            .with_types(&[TableType::Table, TableType::View]);

        self.session()
            .any(CatalogObject::Tables, &filter)
            .await
            .map(|found| !found)
            .map_err(|e| self.metadata_error(e))
    }

    /// 全テーブルを Table として取得
    pub async fn all_tables(&self) -> Result<Vec<Box<dyn Table>>, MetadataError> {
        let names = self.object_names(&[TableType::Table]).await?;
        Ok(names.iter().map(|name| self.table(name)).collect())
    }

    /// 先頭カラムを名前として返す問い合わせ
    pub async fn query_names(
        &self,
        sql: &str,
        binds: &[String],
    ) -> Result<Vec<String>, MetadataError> {
        self.session()
            .query_names(sql, binds)
            .await
            .map_err(|e| self.metadata_error(e))
    }

    /// DDLを実行し、失敗を DdlError に変換
    pub async fn execute_ddl(
        &self,
        operation: &str,
        object: &str,
        sql: &str,
    ) -> Result<(), DdlError> {
        self.session()
            .execute(sql)
            .await
            .map(|_| ())
            .map_err(|source| DdlError::Execution {
                operation: operation.to_string(),
                object: object.to_string(),
                source,
            })
    }

    /// 名前一覧のオブジェクトを順に削除
    ///
    /// `drop_sql` はクォート済みの修飾名を受け取り、DROP文を返します。
    pub async fn drop_each(
        &self,
        operation: &str,
        names: &[String],
        drop_sql: impl Fn(&str) -> String + Send + Sync,
    ) -> Result<(), DdlError> {
        for name in names {
            let qualified = self.qualify(name);
            self.execute_ddl(operation, &qualified, &drop_sql(&qualified))
                .await?;
        }
        Ok(())
    }

    /// テーブルを Table::drop_table で順に削除
    pub async fn drop_all_tables(&self) -> Result<(), SchemaError> {
        for table in self.all_tables().await? {
            table.drop_table().await?;
        }
        Ok(())
    }

    pub fn unsupported(&self, operation: &str) -> DdlError {
        DdlError::Unsupported {
            operation: operation.to_string(),
            object: self.quoted(),
            dialect: self.support.dialect().to_string(),
        }
    }
}

impl fmt::Display for SchemaBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.quoted())
    }
}
