// Core Domain
// 設定、エラー型、命名ポリシーなどの純粋なドメイン定義

pub mod config;
pub mod error;
pub mod naming;
