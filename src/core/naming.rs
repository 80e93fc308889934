// 命名ポリシー
//
// アプリケーション名と関連パスの単一ソースを提供します。

/// 現行アプリケーション名
pub const APP_NAME: &str = "strata-lifecycle";

/// 既定の設定ファイル名
pub const CONFIG_FILE: &str = ".strata-lifecycle.yaml";

/// バイナリ名
pub const BINARY_NAME: &str = "strata-lifecycle";

/// ログフィルタを上書きする環境変数
pub const LOG_ENV: &str = "STRATA_LOG";
