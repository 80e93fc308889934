// cleanコマンドハンドラー
//
// 設定された順序でスキーマをクリーン（またはドロップ）します。
// - 対象スキーマの決定（--schema、設定ファイル、カレントスキーマの順）
// - 存在しないスキーマの警告とスキップ
// - SchemaCleaner の実行と結果サマリーの表示

use crate::adapters::session::DatabaseSession;
use crate::cli::command_context::CommandContext;
use crate::cli::commands::{render_output, CommandOutput};
use crate::cli::OutputFormat;
use crate::core::config::CleanConfig;
use crate::core::error::CleanMode;
use crate::dbsupport::{create_db_support, DbSupport};
use crate::services::schema_cleaner::{CleanReport, SchemaCleaner};
use crate::services::time_format::format_millis;
use anyhow::{Context, Result};
use colored::Colorize;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, warn};

/// cleanコマンドの出力構造体
#[derive(Debug, Clone, Serialize)]
pub struct CleanOutput {
    /// 環境名
    pub environment: String,
    /// データベース方言
    pub dialect: String,
    /// 処理結果
    pub report: CleanReport,
    /// スキップしたスキーマ
    pub skipped: Vec<String>,
    /// テキスト出力メッセージ
    #[serde(skip)]
    pub text_message: String,
}

impl CommandOutput for CleanOutput {
    fn to_text(&self) -> String {
        self.text_message.clone()
    }
}

/// cleanコマンドの入力パラメータ
#[derive(Debug, Clone)]
pub struct CleanCommand {
    /// プロジェクトのルートパス
    pub project_path: PathBuf,
    /// カスタム設定ファイルパス
    pub config_path: Option<PathBuf>,
    /// 環境名
    pub env: String,
    /// コマンドラインで指定されたスキーマ
    pub schemas: Vec<String>,
    /// スキーマ自体を削除するかどうか
    pub drop_schemas: bool,
    /// 出力フォーマット
    pub format: OutputFormat,
}

/// cleanコマンドハンドラー
#[derive(Debug, Default)]
pub struct CleanCommandHandler {}

impl CleanCommandHandler {
    /// 新しいCleanCommandHandlerを作成
    pub fn new() -> Self {
        Self {}
    }

    /// cleanコマンドを実行
    ///
    /// # Arguments
    ///
    /// * `command` - cleanコマンドのパラメータ
    ///
    /// # Returns
    ///
    /// 成功時は処理結果のサマリー、失敗時は失敗したスキーマを含むエラー
    pub async fn execute(&self, command: &CleanCommand) -> Result<String> {
        let context = CommandContext::load_with_config(
            command.project_path.clone(),
            command.config_path.clone(),
        )?;

        let session = context.connect(&command.env).await?;
        let result = self.run(&context, &session, command).await;

        if let Err(e) = session.close().await {
            warn!(error = %e, "Failed to close database session");
        }

        result
    }

    async fn run(
        &self,
        context: &CommandContext,
        session: &DatabaseSession,
        command: &CleanCommand,
    ) -> Result<String> {
        let support = create_db_support(session.clone());
        let requested = self
            .resolve_schema_names(&command.schemas, &context.config.clean, support.as_ref())
            .await?;
        let drop_schemas = command.drop_schemas || context.config.clean.drop_schemas;

        let mut targets = Vec::with_capacity(requested.len());
        let mut skipped = Vec::new();
        for name in requested {
            let schema = Arc::clone(&support).schema(&name);
            if schema
                .exists()
                .await
                .with_context(|| format!("Failed to check schema {}", schema))?
            {
                targets.push(schema);
            } else {
                warn!(schema = %schema, "Unable to clean unknown schema");
                skipped.push(name);
            }
        }

        debug!(
            count = targets.len(),
            drop_schemas,
            env = %command.env,
            "Resolved target schemas"
        );

        let cleaner = SchemaCleaner::new(session, targets, drop_schemas);
        let report = cleaner
            .apply()
            .await
            .with_context(|| format!("Failed to {} schemas", cleaner.mode()))?;

        let output = CleanOutput {
            environment: command.env.clone(),
            dialect: support.dialect().to_string(),
            text_message: self.format_report(&report, &skipped, support.as_ref()),
            report,
            skipped,
        };

        render_output(&output, &command.format)
    }

    /// 処理対象のスキーマ名を決定
    ///
    /// コマンドライン指定を優先し、次に設定ファイル、どちらもなければカレントスキーマを使います。
    pub async fn resolve_schema_names(
        &self,
        cli_schemas: &[String],
        clean_config: &CleanConfig,
        support: &dyn DbSupport,
    ) -> Result<Vec<String>> {
        if !cli_schemas.is_empty() {
            let from_cli = CleanConfig {
                schemas: cli_schemas.to_vec(),
                drop_schemas: false,
            };
            from_cli.validate().context("Invalid --schema arguments")?;
            return Ok(from_cli.schemas);
        }

        if !clean_config.schemas.is_empty() {
            return Ok(clean_config.schemas.clone());
        }

        let current = support
            .current_schema()
            .await
            .context("No schemas configured and the current schema could not be determined")?;
        Ok(vec![current])
    }

    /// 結果サマリーをテキストに整形
    pub fn format_report(
        &self,
        report: &CleanReport,
        skipped: &[String],
        support: &dyn DbSupport,
    ) -> String {
        let mut output = String::new();

        for name in skipped {
            output.push_str(&format!(
                "{} schema {} does not exist, skipped\n",
                "Warning:".yellow().bold(),
                support.quote(&[name])
            ));
        }

        if report.results.is_empty() {
            output.push_str("No schemas to process.");
            return output;
        }

        let verb = report.mode.past_tense();
        for result in &report.results {
            output.push_str(&format!(
                "{} {} schema {} ({})\n",
                "✓".green(),
                verb,
                support.quote(&[&result.schema]).cyan(),
                format_millis(result.duration_ms)
            ));
        }

        let summary = format!(
            "{} {} schema(s) in {}",
            verb,
            report.results.len(),
            format_millis(report.total_duration_ms)
        );
        output.push('\n');
        output.push_str(&match report.mode {
            CleanMode::Clean => summary.green().bold().to_string(),
            CleanMode::Drop => summary.red().bold().to_string(),
        });

        output
    }
}
