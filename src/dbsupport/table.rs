// テーブル能力契約
//
// バックエンドに依存しないテーブル操作（存在確認、カラム・主キー確認、ロック、削除）を定義します。
// 共通のカタログ問い合わせは TableBase に一度だけ実装します。

use crate::adapters::metadata::{CatalogObject, MetadataAccess, TableType};
use crate::adapters::session::DatabaseSession;
use crate::core::error::{DatabaseError, DdlError, LockError, MetadataError};
use crate::dbsupport::{catalog_scope, DbSupport};
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

/// テーブル
///
/// 表示形式は方言に応じてクォートされた `schema.name` です。
/// エラーメッセージとログにもこの形式が使われます。
#[async_trait]
pub trait Table: Send + Sync + fmt::Display + fmt::Debug {
    /// 所属スキーマ名
    fn schema_name(&self) -> &str;

    /// テーブル名
    fn name(&self) -> &str;

    /// このテーブルが現在のセッションから見えるかどうか
    async fn exists(&self) -> Result<bool, MetadataError>;

    /// クォートなし識別子として解釈した場合の存在確認
    ///
    /// 識別子を大文字小文字変換するバックエンドでは `exists()` と結果が異なることがあります。
    async fn exists_no_quotes(&self) -> Result<bool, MetadataError>;

    /// 主キー制約を持つかどうか
    async fn has_primary_key(&self) -> Result<bool, MetadataError>;

    /// 指定した名前（完全一致）のカラムを持つかどうか
    async fn has_column(&self, column: &str) -> Result<bool, MetadataError>;

    /// テーブルを削除
    ///
    /// 呼び出し側で `exists()` がtrueであることを保証してください。ここでは再確認しません。
    async fn drop_table(&self) -> Result<(), DdlError>;

    /// 現在のトランザクションが終わるまで保持される排他ロックを取得
    async fn lock(&self) -> Result<(), LockError>;
}

/// テーブル実装の共通部分
#[derive(Debug, Clone)]
pub struct TableBase {
    support: Arc<dyn DbSupport>,
    schema: String,
    name: String,
}

impl TableBase {
    pub fn new(
        support: Arc<dyn DbSupport>,
        schema: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            support,
            schema: schema.into(),
            name: name.into(),
        }
    }

    pub fn support(&self) -> &dyn DbSupport {
        self.support.as_ref()
    }

    pub fn session(&self) -> &DatabaseSession {
        self.support.session()
    }

    pub fn schema_name(&self) -> &str {
        &self.schema
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// クォート済みの `schema.name`
    pub fn quoted(&self) -> String {
        self.support.quote(&[&self.schema, &self.name])
    }

    fn metadata_error(&self, source: DatabaseError) -> MetadataError {
        MetadataError::new(self.quoted(), source)
    }

    /// 指定したスキーマとテーブル名でテーブル型オブジェクトを検索
    ///
    /// `catalog_is_schema` に応じてスキーマ名をカタログ引数かスキーマ引数に割り当てます。
    pub async fn exists_in(
        &self,
        schema: &str,
        table: &str,
        ignore_case: bool,
    ) -> Result<bool, MetadataError> {
        let mut filter = catalog_scope(self.support(), schema)
            .with_table(table)
            .with_types(&[TableType::Table]);
        if ignore_case {
            filter = filter.ignoring_case();
        }

        self.session()
            .any(CatalogObject::Tables, &filter)
            .await
            .map_err(|e| self.metadata_error(e))
    }

    pub async fn has_primary_key(&self) -> Result<bool, MetadataError> {
        let filter = catalog_scope(self.support(), &self.schema).with_table(&self.name);

        self.session()
            .any(CatalogObject::PrimaryKeys, &filter)
            .await
            .map_err(|e| self.metadata_error(e))
    }

    pub async fn has_column(&self, column: &str) -> Result<bool, MetadataError> {
        let filter = catalog_scope(self.support(), &self.schema)
            .with_table(&self.name)
            .with_column(column);

        self.session()
            .any(CatalogObject::Columns, &filter)
            .await
            .map_err(|e| self.metadata_error(e))
    }

    /// DDLを実行し、失敗を DdlError に変換
    pub async fn execute_ddl(&self, operation: &str, sql: &str) -> Result<(), DdlError> {
        self.session()
            .execute(sql)
            .await
            .map(|_| ())
            .map_err(|source| DdlError::Execution {
                operation: operation.to_string(),
                object: self.quoted(),
                source,
            })
    }

    /// ロック用SQLを実行し、失敗を LockError に変換
    pub async fn execute_lock(&self, sql: &str) -> Result<(), LockError> {
        self.session()
            .execute(sql)
            .await
            .map(|_| ())
            .map_err(|source| LockError::Denied {
                table: self.quoted(),
                source,
            })
    }

    pub fn lock_unsupported(&self) -> LockError {
        LockError::Unsupported {
            table: self.quoted(),
            dialect: self.support.dialect().to_string(),
        }
    }
}

impl fmt::Display for TableBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.quoted())
    }
}
