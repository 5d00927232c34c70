//! Error types for the notice ingestion pipeline

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Result type alias for ingestion operations
pub type Result<T> = std::result::Result<T, Error>;

/// Ingestion errors
#[derive(Debug, Error)]
pub enum Error {
    /// Document format is not one we can normalize
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Normalization produced no text
    #[error("No text could be extracted from '{0}'")]
    ExtractionEmpty(String),

    /// No degree-minute-second pair in the text
    #[error("No coordinates found")]
    CoordinatesNotFound,

    /// Remote path resolved to something other than a single file
    #[error("Unexpected resource type at '{0}': expected a file")]
    UnexpectedResourceType(String),

    /// Version tag no longer matches the remote state
    #[error("Concurrent modification of '{0}'")]
    ConcurrentModification(String),

    /// Network, auth or backend failure
    #[error("Record store unavailable: {0}")]
    StoreUnavailable(String),

    /// Manual `/add` command could not be parsed
    #[error("Malformed manual input: {0}")]
    MalformedManualInput(String),

    /// Document link could not be downloaded
    #[error("Failed to download document: {0}")]
    Download(String),

    /// Malformed transport request
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Sender is not the configured owner
    #[error("Sender '{0}' is not allowed to add notices")]
    Unauthorized(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP request error
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Fixed reply for anyone but the owner
pub const REFUSAL_MESSAGE: &str = "⛔ Только владелец может добавлять ПРИПы.";

/// Usage line for the manual command
pub const MANUAL_USAGE: &str = "Формат: /add Название | lat | lng | описание";

impl Error {
    /// Create a store unavailable error
    pub fn store_unavailable(message: impl Into<String>) -> Self {
        Self::StoreUnavailable(message.into())
    }

    /// Create a malformed manual input error
    pub fn malformed_manual(message: impl Into<String>) -> Self {
        Self::MalformedManualInput(message.into())
    }

    /// Create an invalid request error
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Short reply shown to the sender when a submission fails
    pub fn user_message(&self) -> String {
        match self {
            Error::UnsupportedFormat(ext) => {
                format!("⚠️ Формат «{}» не поддерживается. Пришлите DOCX, RTF или DOC.", ext)
            }
            Error::ExtractionEmpty(_) => "⚠️ Не удалось извлечь текст из документа.".to_string(),
            Error::CoordinatesNotFound => "⚠️ В тексте не найдены координаты.".to_string(),
            Error::UnexpectedResourceType(_) => {
                "⚠️ Ошибка хранилища: ожидался файл, а не директория.".to_string()
            }
            Error::ConcurrentModification(_) => {
                "⚠️ Файл изменился во время записи. Отправьте ПРИП ещё раз.".to_string()
            }
            Error::MalformedManualInput(_) => MANUAL_USAGE.to_string(),
            Error::Unauthorized(_) => REFUSAL_MESSAGE.to_string(),
            Error::Download(_) => "⚠️ Не удалось скачать документ.".to_string(),
            Error::InvalidRequest(_) => "⚠️ Некорректный запрос.".to_string(),
            Error::StoreUnavailable(_) | Error::Http(_) => {
                "⚠️ Ошибка добавления. Проверь токен/права/путь.".to_string()
            }
            Error::Config(_) | Error::Io(_) | Error::Json(_) | Error::Internal(_) => {
                "⚠️ Внутренняя ошибка.".to_string()
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, error_type) = match &self {
            Error::UnsupportedFormat(_) => (StatusCode::UNSUPPORTED_MEDIA_TYPE, "unsupported_format"),
            Error::ExtractionEmpty(_) => (StatusCode::UNPROCESSABLE_ENTITY, "extraction_empty"),
            Error::CoordinatesNotFound => (StatusCode::UNPROCESSABLE_ENTITY, "coordinates_not_found"),
            Error::MalformedManualInput(_) => (StatusCode::BAD_REQUEST, "malformed_input"),
            Error::Unauthorized(_) => (StatusCode::FORBIDDEN, "unauthorized"),
            Error::Download(_) => (StatusCode::BAD_GATEWAY, "download_failed"),
            Error::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "invalid_request"),
            Error::UnexpectedResourceType(_) => (StatusCode::BAD_GATEWAY, "unexpected_resource"),
            Error::ConcurrentModification(_) => (StatusCode::CONFLICT, "concurrent_modification"),
            Error::StoreUnavailable(_) | Error::Http(_) => (StatusCode::BAD_GATEWAY, "store_unavailable"),
            Error::Json(_) => (StatusCode::BAD_REQUEST, "json_error"),
            Error::Config(_) => (StatusCode::INTERNAL_SERVER_ERROR, "config_error"),
            Error::Io(_) => (StatusCode::INTERNAL_SERVER_ERROR, "io_error"),
            Error::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        };

        let body = Json(json!({
            "error": {
                "type": error_type,
                "message": self.to_string(),
                "reply": self.user_message(),
            }
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_messages() {
        assert_eq!(
            Error::Unauthorized("42".to_string()).user_message(),
            REFUSAL_MESSAGE
        );
        assert_eq!(Error::malformed_manual("x").user_message(), MANUAL_USAGE);
        assert!(Error::UnsupportedFormat("pdf".to_string())
            .user_message()
            .contains("«pdf»"));
    }

    #[test]
    fn test_response_status() {
        let response = Error::ConcurrentModification("memory".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let response = Error::Unauthorized("42".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let response = Error::store_unavailable("down").into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }
}
