/// エラー型のテスト
///
/// エラーメッセージの形式と、原因チェーン（source）が保持されることを確認します。

#[cfg(test)]
mod error_tests {
    use std::error::Error as _;
    use strata_lifecycle::core::error::{
        CleanError, CleanMode, DatabaseError, DdlError, LockError, MetadataError, SchemaError,
    };

    fn lock_timeout() -> DatabaseError {
        DatabaseError::Query {
            message: "canceling statement due to lock timeout".to_string(),
            sql: Some(r#"DROP SCHEMA "app_audit" CASCADE"#.to_string()),
        }
    }

    /// DatabaseErrorの表示形式
    #[test]
    fn test_database_error_display() {
        let error = DatabaseError::Connection {
            message: "Failed to open postgresql session".to_string(),
            cause: "connection refused".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Database connection error: Failed to open postgresql session (cause: connection refused)"
        );

        assert_eq!(
            DatabaseError::SessionClosed.to_string(),
            "Database session is closed"
        );
    }

    /// DDLエラーは操作名と対象オブジェクトを含む
    #[test]
    fn test_ddl_error_names_operation_and_object() {
        let error = DdlError::Execution {
            operation: "drop schema".to_string(),
            object: r#""app_audit""#.to_string(),
            source: lock_timeout(),
        };

        let message = error.to_string();
        assert!(message.starts_with(r#"Failed to drop schema "app_audit""#));
        assert!(message.contains("lock timeout"));
        assert!(error.source().is_some());
    }

    #[test]
    fn test_lock_error_display() {
        let denied = LockError::Denied {
            table: r#""app"."accounts""#.to_string(),
            source: lock_timeout(),
        };
        assert!(denied.is_denied());
        assert!(denied
            .to_string()
            .starts_with(r#"Unable to lock table "app"."accounts""#));

        let unsupported = LockError::Unsupported {
            table: r#""main"."accounts""#.to_string(),
            dialect: "sqlite".to_string(),
        };
        assert!(unsupported.source().is_none());
    }

    /// SchemaErrorは下位エラーをそのまま表示する
    #[test]
    fn test_schema_error_is_transparent() {
        let metadata = MetadataError::new(r#""app""#, DatabaseError::SessionClosed);
        let expected = metadata.to_string();

        let error: SchemaError = metadata.into();

        assert_eq!(error.to_string(), expected);
        assert!(matches!(error, SchemaError::Metadata(_)));
    }

    /// CleanErrorはスキーマ名とモードを含み、原因チェーンをたどれる
    #[test]
    fn test_clean_error_chain() {
        let error = CleanError::new(
            "app_audit",
            CleanMode::Drop,
            SchemaError::Ddl(DdlError::Execution {
                operation: "drop schema".to_string(),
                object: r#""app_audit""#.to_string(),
                source: lock_timeout(),
            }),
        );

        assert!(error
            .to_string()
            .starts_with("Error while dropping schema app_audit: "));

        let ddl = error.source().unwrap();
        assert!(ddl.to_string().starts_with("Failed to drop schema"));
        let database = ddl.source().unwrap();
        assert!(database.to_string().contains("lock timeout"));
    }

    #[test]
    fn test_clean_error_for_clean_mode() {
        let error = CleanError::new(
            "app",
            CleanMode::Clean,
            SchemaError::Database(DatabaseError::SessionClosed),
        );

        assert_eq!(
            error.to_string(),
            "Error while cleaning schema app: Database session is closed"
        );
        assert_eq!(error.schema(), "app");
    }
}
