use thiserror::Error;

use crate::google::GoogleAuthError;
use crate::store::StoreError;

use super::ConfigError;

/// 启动错误，均为致命错误
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),

    #[error("凭据错误: {0}")]
    Credentials(String),

    #[error("Google 认证失败: {0}")]
    GoogleAuth(#[from] GoogleAuthError),

    #[error("存储不可用: {0}")]
    Store(#[from] StoreError),

    #[error("HTTP 客户端初始化失败: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("IO 错误: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ServerError>;
