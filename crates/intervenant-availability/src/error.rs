use crate::config::ConfigError;
use crate::telemetry::TelemetryError;
use crate::workflows::availability::{
    AvailabilityServiceError, DisplayError, ImportError, KeyError, RequirementError,
};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Server(axum::Error),
    Import(ImportError),
    Requirements(RequirementError),
    Availability(AvailabilityServiceError),
    Display(DisplayError),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Server(err) => write!(f, "server error: {}", err),
            AppError::Import(err) => write!(f, "import error: {}", err),
            AppError::Requirements(err) => write!(f, "requirement error: {}", err),
            AppError::Availability(AvailabilityServiceError::Key(reason)) => {
                f.write_str(reason.message())
            }
            AppError::Availability(err) => write!(f, "availability error: {}", err),
            AppError::Display(err) => write!(f, "display error: {}", err),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Server(err) => Some(err),
            AppError::Import(err) => Some(err),
            AppError::Requirements(err) => Some(err),
            AppError::Availability(err) => Some(err),
            AppError::Display(err) => Some(err),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Availability(AvailabilityServiceError::Key(KeyError::Unknown)) => {
                StatusCode::NOT_FOUND
            }
            AppError::Availability(AvailabilityServiceError::Key(KeyError::Expired)) => {
                StatusCode::FORBIDDEN
            }
            AppError::Import(_) => StatusCode::BAD_REQUEST,
            AppError::Config(_)
            | AppError::Telemetry(_)
            | AppError::Io(_)
            | AppError::Server(_)
            | AppError::Requirements(_)
            | AppError::Availability(_)
            | AppError::Display(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<axum::Error> for AppError {
    fn from(value: axum::Error) -> Self {
        Self::Server(value)
    }
}

impl From<ImportError> for AppError {
    fn from(value: ImportError) -> Self {
        Self::Import(value)
    }
}

impl From<RequirementError> for AppError {
    fn from(value: RequirementError) -> Self {
        Self::Requirements(value)
    }
}

impl From<AvailabilityServiceError> for AppError {
    fn from(value: AvailabilityServiceError) -> Self {
        Self::Availability(value)
    }
}

impl From<DisplayError> for AppError {
    fn from(value: DisplayError) -> Self {
        Self::Display(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_errors_keep_their_user_facing_message() {
        let err = AppError::from(AvailabilityServiceError::Key(KeyError::Expired));
        assert_eq!(err.to_string(), "Clé expirée");
        assert_eq!(err.into_response().status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn requirement_errors_are_internal() {
        let err = AppError::from(RequirementError::Unavailable("offline".to_string()));
        assert_eq!(
            err.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
