// strata-lifecycleライブラリのエントリーポイント
//
// モジュール構造:
// - cli: CLIレイヤー（ユーザー入力の受付とコマンドルーティング）
// - core: 設定、エラー型、命名
// - adapters: セッション、カタログ問い合わせ、識別子クォート
// - dbsupport: 方言ごとの Table / Schema 実装
// - services: トランザクション実行とスキーマクリーナー

pub mod adapters;
pub mod cli;
pub mod core;
pub mod dbsupport;
pub mod services;
