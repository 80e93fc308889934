// トランザクション実行テンプレート
//
// 単一の作業単位をトランザクション内で実行し、
// 成功時はコミット、失敗時はロールバックして元のエラーを返します。

use crate::adapters::session::TransactionalSession;
use crate::core::error::DatabaseError;
use std::future::Future;
use tracing::{debug, warn};

/// トランザクション実行テンプレート
///
/// 1回の `execute` につき、コミットかロールバックのどちらか一方だけを行います。
/// 作業単位の中で同じセッションの別トランザクションを開始してはいけません。
pub struct TransactionTemplate<'a> {
    session: &'a dyn TransactionalSession,
}

impl<'a> TransactionTemplate<'a> {
    pub fn new(session: &'a dyn TransactionalSession) -> Self {
        Self { session }
    }

    /// 作業単位をトランザクション内で実行
    ///
    /// # Errors
    ///
    /// - 開始・コミットの失敗は `E::from(DatabaseError)` として返します
    /// - 作業単位の失敗はロールバック後にそのまま返します
    pub async fn execute<T, E, F, Fut>(&self, work: F) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: From<DatabaseError>,
    {
        self.session.begin().await?;
        debug!("Transaction started");

        match work().await {
            Ok(value) => match self.session.commit().await {
                Ok(()) => {
                    debug!("Transaction committed");
                    Ok(value)
                }
                Err(commit_error) => {
                    self.rollback_quietly().await;
                    Err(commit_error.into())
                }
            },
            Err(error) => {
                self.rollback_quietly().await;
                Err(error)
            }
        }
    }

    /// ロールバックの失敗はログに残し、元のエラーを優先する
    async fn rollback_quietly(&self) {
        match self.session.rollback().await {
            Ok(()) => debug!("Transaction rolled back"),
            Err(e) => warn!(error = %e, "Rollback failed"),
        }
    }
}
