// 統合テスト共通ヘルパー
//
// - インメモリSQLiteセッションとアタッチDB
// - ログ出力のキャプチャ
// - スナップショットでロールバックを再現するインメモリのトランザクションダブル
// - clean の途中で失敗する実スキーマのラッパー

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::fmt;
use std::io;
use std::sync::{Arc, Mutex};
use strata_lifecycle::adapters::session::{DatabaseSession, TransactionalSession};
use strata_lifecycle::core::config::Dialect;
use strata_lifecycle::core::error::{
    DatabaseError, DdlError, LockError, MetadataError, SchemaError,
};
use strata_lifecycle::dbsupport::{create_db_support, DbSupport, Schema, Table};

// =============================================================================
// SQLite
// =============================================================================

/// インメモリSQLiteのセッションとDbSupportを作成
pub async fn sqlite_support() -> (DatabaseSession, Arc<dyn DbSupport>) {
    let session = DatabaseSession::connect(Dialect::SQLite, "sqlite::memory:")
        .await
        .unwrap();
    let support = create_db_support(session.clone());
    (session, support)
}

/// インメモリDBを別名でアタッチ（SQLiteにおけるスキーマ）
pub async fn attach_schema(session: &DatabaseSession, name: &str) {
    session
        .execute(&format!("ATTACH DATABASE ':memory:' AS \"{}\"", name))
        .await
        .unwrap();
}

/// 複数のSQL文を順に実行
pub async fn execute_all(session: &DatabaseSession, statements: &[&str]) {
    for sql in statements {
        session.execute(sql).await.unwrap();
    }
}

/// スキーマ内のテーブル名一覧
pub async fn table_names(support: &Arc<dyn DbSupport>, schema: &str) -> Vec<String> {
    Arc::clone(support)
        .schema(schema)
        .all_tables()
        .await
        .unwrap()
        .iter()
        .map(|t| t.name().to_string())
        .collect()
}

// =============================================================================
// ログキャプチャ
// =============================================================================

/// tracingの出力を蓄積するバッファ
#[derive(Clone, Default)]
pub struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl LogBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }

    /// INFOレベル以上をこのバッファに出力するサブスクライバーを現在のスレッドに設定
    pub fn install(&self) -> tracing::subscriber::DefaultGuard {
        let buffer = self.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || buffer.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::INFO)
            .finish();
        tracing::subscriber::set_default(subscriber)
    }
}

impl io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

// =============================================================================
// インメモリのトランザクションダブル
// =============================================================================

/// スキーマ名 → テーブル名一覧
type Catalog = BTreeMap<String, Vec<String>>;

#[derive(Default)]
struct FakeState {
    catalog: Catalog,
    snapshot: Option<Catalog>,
    events: Vec<String>,
}

/// begin でスナップショットを取り、rollback で復元するデータベース
#[derive(Clone, Default)]
pub struct FakeDatabase {
    state: Arc<Mutex<FakeState>>,
}

/// FakeSchema の失敗の仕方
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Failure {
    None,
    /// 最初のテーブルを削除した後にロック取得に失敗する
    LockDuringClean,
    /// スキーマ削除の途中でロック待ちがタイムアウトする
    LockTimeoutDuringDrop,
}

impl FakeDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_schema(self, name: &str, tables: &[&str]) -> Self {
        self.state.lock().unwrap().catalog.insert(
            name.to_string(),
            tables.iter().map(|t| t.to_string()).collect(),
        );
        self
    }

    pub fn schema_exists(&self, name: &str) -> bool {
        self.state.lock().unwrap().catalog.contains_key(name)
    }

    pub fn tables(&self, name: &str) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .catalog
            .get(name)
            .cloned()
            .unwrap_or_default()
    }

    /// begin/commit/rollback とスキーマ操作の記録
    pub fn events(&self) -> Vec<String> {
        self.state.lock().unwrap().events.clone()
    }

    pub fn in_transaction(&self) -> bool {
        self.state.lock().unwrap().snapshot.is_some()
    }

    pub fn schema(&self, name: &str, failure: Failure) -> Box<dyn Schema> {
        Box::new(FakeSchema {
            db: self.clone(),
            name: name.to_string(),
            failure,
        })
    }

    fn record(&self, event: impl Into<String>) {
        self.state.lock().unwrap().events.push(event.into());
    }
}

#[async_trait]
impl TransactionalSession for FakeDatabase {
    async fn begin(&self) -> Result<(), DatabaseError> {
        let mut state = self.state.lock().unwrap();
        if state.snapshot.is_some() {
            return Err(DatabaseError::Transaction {
                message: "Nested transactions are not supported".to_string(),
            });
        }
        state.snapshot = Some(state.catalog.clone());
        state.events.push("begin".to_string());
        Ok(())
    }

    async fn commit(&self) -> Result<(), DatabaseError> {
        let mut state = self.state.lock().unwrap();
        if state.snapshot.take().is_none() {
            return Err(DatabaseError::Transaction {
                message: "COMMIT issued without an active transaction".to_string(),
            });
        }
        state.events.push("commit".to_string());
        Ok(())
    }

    async fn rollback(&self) -> Result<(), DatabaseError> {
        let mut state = self.state.lock().unwrap();
        match state.snapshot.take() {
            Some(snapshot) => {
                state.catalog = snapshot;
                state.events.push("rollback".to_string());
                Ok(())
            }
            None => Err(DatabaseError::Transaction {
                message: "ROLLBACK issued without an active transaction".to_string(),
            }),
        }
    }
}

#[derive(Debug)]
struct FakeSchema {
    db: FakeDatabase,
    name: String,
    failure: Failure,
}

impl fmt::Debug for FakeDatabase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FakeDatabase").finish_non_exhaustive()
    }
}

impl fmt::Display for FakeSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\"", self.name)
    }
}

#[async_trait]
impl Schema for FakeSchema {
    fn name(&self) -> &str {
        &self.name
    }

    async fn exists(&self) -> Result<bool, MetadataError> {
        Ok(self.db.schema_exists(&self.name))
    }

    async fn empty(&self) -> Result<bool, MetadataError> {
        Ok(self.db.tables(&self.name).is_empty())
    }

    async fn create(&self) -> Result<(), DdlError> {
        self.db
            .state
            .lock()
            .unwrap()
            .catalog
            .entry(self.name.clone())
            .or_default();
        Ok(())
    }

    async fn drop_schema(&self) -> Result<(), DdlError> {
        self.db.record(format!("drop {}", self.name));
        self.db.state.lock().unwrap().catalog.remove(&self.name);

        if self.failure == Failure::LockTimeoutDuringDrop {
            return Err(DdlError::Execution {
                operation: "drop schema".to_string(),
                object: self.to_string(),
                source: DatabaseError::Query {
                    message: "canceling statement due to lock timeout".to_string(),
                    sql: Some(format!("DROP SCHEMA {} CASCADE", self)),
                },
            });
        }
        Ok(())
    }

    async fn clean(&self) -> Result<(), SchemaError> {
        self.db.record(format!("clean {}", self.name));
        for table in self.all_tables().await? {
            table.drop_table().await?;
            if self.failure == Failure::LockDuringClean {
                table.lock().await?;
            }
        }
        Ok(())
    }

    async fn all_tables(&self) -> Result<Vec<Box<dyn Table>>, MetadataError> {
        Ok(self
            .db
            .tables(&self.name)
            .iter()
            .map(|name| self.table(name))
            .collect())
    }

    fn table(&self, name: &str) -> Box<dyn Table> {
        Box::new(FakeTable {
            db: self.db.clone(),
            schema: self.name.clone(),
            name: name.to_string(),
        })
    }
}

#[derive(Debug)]
struct FakeTable {
    db: FakeDatabase,
    schema: String,
    name: String,
}

impl fmt::Display for FakeTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\".\"{}\"", self.schema, self.name)
    }
}

#[async_trait]
impl Table for FakeTable {
    fn schema_name(&self) -> &str {
        &self.schema
    }

    fn name(&self) -> &str {
        &self.name
    }

    async fn exists(&self) -> Result<bool, MetadataError> {
        Ok(self.db.tables(&self.schema).contains(&self.name))
    }

    async fn exists_no_quotes(&self) -> Result<bool, MetadataError> {
        self.exists().await
    }

    async fn has_primary_key(&self) -> Result<bool, MetadataError> {
        Ok(false)
    }

    async fn has_column(&self, _column: &str) -> Result<bool, MetadataError> {
        Ok(false)
    }

    async fn drop_table(&self) -> Result<(), DdlError> {
        let mut state = self.db.state.lock().unwrap();
        if let Some(tables) = state.catalog.get_mut(&self.schema) {
            tables.retain(|t| t != &self.name);
        }
        Ok(())
    }

    async fn lock(&self) -> Result<(), LockError> {
        Err(LockError::Denied {
            table: self.to_string(),
            source: DatabaseError::Query {
                message: "could not obtain lock".to_string(),
                sql: None,
            },
        })
    }
}

// =============================================================================
// 途中で失敗するスキーマ
// =============================================================================

/// 実スキーマの clean を実行した後、テーブルロックを取得するスキーマ
///
/// SQLiteではロックが未サポートのため、オブジェクトを削除した後に必ず失敗します。
#[derive(Debug)]
pub struct LockAfterCleanSchema {
    inner: Box<dyn Schema>,
    table: String,
}

impl LockAfterCleanSchema {
    pub fn new(inner: Box<dyn Schema>, table: &str) -> Self {
        Self {
            inner,
            table: table.to_string(),
        }
    }
}

impl fmt::Display for LockAfterCleanSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.inner, f)
    }
}

#[async_trait]
impl Schema for LockAfterCleanSchema {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn exists(&self) -> Result<bool, MetadataError> {
        self.inner.exists().await
    }

    async fn empty(&self) -> Result<bool, MetadataError> {
        self.inner.empty().await
    }

    async fn create(&self) -> Result<(), DdlError> {
        self.inner.create().await
    }

    async fn drop_schema(&self) -> Result<(), DdlError> {
        self.inner.drop_schema().await
    }

    async fn clean(&self) -> Result<(), SchemaError> {
        self.inner.clean().await?;
        self.inner.table(&self.table).lock().await?;
        Ok(())
    }

    async fn all_tables(&self) -> Result<Vec<Box<dyn Table>>, MetadataError> {
        self.inner.all_tables().await
    }

    fn table(&self, name: &str) -> Box<dyn Table> {
        self.inner.table(name)
    }
}
