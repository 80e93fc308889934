// Adapters
// データベースセッション、カタログ問い合わせ、識別子クォートを抽象化

pub mod connection_string;
pub mod database;
pub mod metadata;
pub mod session;
pub mod sql_quote;
