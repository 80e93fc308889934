// 接続文字列ビルダー
//
// DatabaseConfig と Dialect から sqlx の接続URLを生成する。
// ユーザー名とパスワードはURLエンコードする。

use crate::core::config::{DatabaseConfig, Dialect};

fn credentials(config: &DatabaseConfig, default_user: &str) -> String {
    let user = urlencoding::encode(config.user.as_deref().unwrap_or(default_user));
    match config.password.as_deref() {
        Some(password) if !password.is_empty() => {
            format!("{}:{}", user, urlencoding::encode(password))
        }
        _ => user.into_owned(),
    }
}

/// 接続文字列を生成
///
/// SQLiteはファイルが存在しない場合に作成するため `mode=rwc` を付与します。
pub fn build_connection_string(dialect: Dialect, config: &DatabaseConfig) -> String {
    match dialect {
        Dialect::PostgreSQL => format!(
            "postgresql://{}@{}:{}/{}",
            credentials(config, "postgres"),
            config.host,
            config.port_for(dialect),
            config.database
        ),
        Dialect::MySQL => format!(
            "mysql://{}@{}:{}/{}",
            credentials(config, "root"),
            config.host,
            config.port_for(dialect),
            config.database
        ),
        Dialect::SQLite => {
            if config.database == ":memory:" {
                "sqlite::memory:".to_string()
            } else {
                format!("sqlite://{}?mode=rwc", config.database)
            }
        }
    }
}
