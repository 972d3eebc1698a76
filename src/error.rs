use thiserror::Error;

/// 마이그레이션 코어에서 발생하는 오류.
/// "트랙을 찾지 못함"은 오류가 아니라 `Option::None`으로 표현한다.
#[derive(Error, Debug)]
pub enum MigrateError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("{}", transport_message(.status, .message))]
    Transport { status: Option<u16>, message: String },

    #[error("no items: {0}")]
    NoItems(String),

    #[error("unexpected response: {0}")]
    Decode(String),

    #[error("config error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, MigrateError>;

/// Statuses worth another attempt.
pub const RETRYABLE_STATUSES: [u16; 5] = [429, 500, 502, 503, 504];

fn transport_message(status: &Option<u16>, message: &str) -> String {
    match status {
        Some(status) => format!("http error {status}: {message}"),
        None => format!("transport error: {message}"),
    }
}

impl MigrateError {
    pub fn http(status: u16, message: impl Into<String>) -> Self {
        MigrateError::Transport {
            status: Some(status),
            message: message.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        MigrateError::Transport {
            status: None,
            message: message.into(),
        }
    }

    /// 연결 실패나 재시도 가능한 상태 코드인 경우에만 true.
    pub fn is_retryable(&self) -> bool {
        match self {
            MigrateError::Transport { status: None, .. } => true,
            MigrateError::Transport {
                status: Some(status),
                ..
            } => RETRYABLE_STATUSES.contains(status),
            _ => false,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            MigrateError::Transport { status, .. } => *status,
            _ => None,
        }
    }
}

impl From<reqwest::Error> for MigrateError {
    fn from(e: reqwest::Error) -> Self {
        match e.status() {
            Some(status) => MigrateError::http(status.as_u16(), e.to_string()),
            None => MigrateError::network(e.to_string()),
        }
    }
}
