// スキーマクリーナー
//
// 指定された順序でスキーマごとに clean または drop を実行します。
// 各スキーマは独立したトランザクションで処理し、最初の失敗で停止します。

use crate::adapters::session::TransactionalSession;
use crate::core::error::{CleanError, CleanMode, SchemaError};
use crate::dbsupport::Schema;
use crate::services::time_format::format_duration;
use crate::services::transaction::TransactionTemplate;
use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info};

/// スキーマ単位の処理結果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchemaCleanResult {
    /// スキーマ名
    pub schema: String,
    /// 実行した操作
    pub mode: CleanMode,
    /// 実行時間（ミリ秒）
    pub duration_ms: u64,
}

/// apply() 全体の結果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CleanReport {
    pub mode: CleanMode,
    /// 処理順の結果
    pub results: Vec<SchemaCleanResult>,
    pub total_duration_ms: u64,
}

impl CleanReport {
    /// 処理したスキーマ名（処理順）
    pub fn schema_names(&self) -> Vec<&str> {
        self.results.iter().map(|r| r.schema.as_str()).collect()
    }
}

/// スキーマクリーナー
///
/// 1回のクリーン要求ごとに作成し、`apply()` の後は破棄します。
pub struct SchemaCleaner<'a> {
    session: &'a dyn TransactionalSession,
    schemas: Vec<Box<dyn Schema>>,
    drop_schemas: bool,
}

impl<'a> SchemaCleaner<'a> {
    /// 新しいSchemaCleanerを作成
    ///
    /// # Arguments
    ///
    /// * `session` - トランザクションを制御するセッション
    /// * `schemas` - 処理対象のスキーマ（この順序で処理）
    /// * `drop_schemas` - trueの場合はスキーマ自体を削除
    pub fn new(
        session: &'a dyn TransactionalSession,
        schemas: Vec<Box<dyn Schema>>,
        drop_schemas: bool,
    ) -> Self {
        Self {
            session,
            schemas,
            drop_schemas,
        }
    }

    pub fn mode(&self) -> CleanMode {
        CleanMode::from_drop_schemas(self.drop_schemas)
    }

    /// 全スキーマに clean / drop を適用
    ///
    /// 失敗したスキーマのトランザクションはロールバックされ、
    /// それ以前のスキーマはコミット済みのまま残ります。後続のスキーマには触れません。
    pub async fn apply(&self) -> Result<CleanReport, CleanError> {
        let mode = self.mode();
        let template = TransactionTemplate::new(self.session);
        let started = Utc::now();
        let mut results = Vec::with_capacity(self.schemas.len());

        for schema in &self.schemas {
            let schema = schema.as_ref();
            debug!(
                schema = %schema,
                mode = %mode,
                "{} schema {} ...",
                capitalize(mode.progressive()),
                schema
            );

            let start = Utc::now();
            template
                .execute(|| async move {
                    match mode {
                        CleanMode::Clean => schema.clean().await,
                        CleanMode::Drop => schema.drop_schema().await.map_err(SchemaError::from),
                    }
                })
                .await
                .map_err(|source| CleanError::new(schema.name(), mode, source))?;

            let elapsed = Utc::now().signed_duration_since(start);
            let duration_ms = elapsed.num_milliseconds().max(0) as u64;
            info!(
                schema = %schema,
                mode = %mode,
                duration_ms,
                "{} schema {} (execution time {})",
                mode.past_tense(),
                schema,
                format_duration(elapsed)
            );

            results.push(SchemaCleanResult {
                schema: schema.name().to_string(),
                mode,
                duration_ms,
            });
        }

        Ok(CleanReport {
            mode,
            results,
            total_duration_ms: elapsed_millis(started),
        })
    }
}

fn elapsed_millis(start: chrono::DateTime<Utc>) -> u64 {
    Utc::now()
        .signed_duration_since(start)
        .num_milliseconds()
        .max(0) as u64
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
