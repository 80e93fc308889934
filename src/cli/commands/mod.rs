// コマンドハンドラー層
// 各CLIコマンドの実装と共通の出力処理

pub mod clean;

use crate::cli::OutputFormat;
use anyhow::{Context, Result};
use serde::Serialize;

/// コマンド出力
///
/// JSONはSerializeの結果、テキストは `to_text` の結果を出力します。
pub trait CommandOutput: Serialize {
    fn to_text(&self) -> String;
}

/// 出力フォーマットに応じて出力を文字列化
pub fn render_output<T: CommandOutput>(output: &T, format: &OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Text => Ok(output.to_text()),
        OutputFormat::Json => {
            serde_json::to_string_pretty(output).context("Failed to serialize output as JSON")
        }
    }
}
