use thiserror::Error;

#[derive(Debug, Error)]
pub enum HwError {
    #[error("device not found: {0}")]
    DeviceNotFound(String),
    #[error("device timed out")]
    Timeout,
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, HwError>;
