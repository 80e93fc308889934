// Services Layer
// トランザクション実行とスキーマライフサイクル操作を提供するサービス層

pub mod config_loader;
pub mod schema_cleaner;
pub mod time_format;
pub mod transaction;
