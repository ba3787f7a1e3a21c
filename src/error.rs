use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Storage error: {0}")] Storage(#[from] std::io::Error),

    #[error("Serialization error: {0}")] Serde(#[from] serde_json::Error),

    #[error("Sensor unavailable: {0}")] SensorUnavailable(String),

    #[error("Camera unavailable: {0}")] CameraUnavailable(String),

    #[error("Location unavailable: {0}")] LocationUnavailable(String),

    #[error("Invalid input: {0}")] InvalidInput(String),

    #[error("Configuration error: {0}")] Config(String),

    #[error("Internal error: {0}")] Internal(String),
}

pub type Result<T> = std::result::Result<T, AppError>;
