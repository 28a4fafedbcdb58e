use crate::config::ConfigError;
use crate::telemetry::TelemetryError;
use crate::workflows::archive::{ArchiveExportError, ArchiveImportError};
use crate::workflows::contract::{AmortizationError, AmountLabelError, MaturityError};
use crate::workflows::roster::RosterImportError;
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
    ArchiveImport(ArchiveImportError),
    ArchiveExport(ArchiveExportError),
    Roster(RosterImportError),
    Amortization(AmortizationError),
    AmountLabel(AmountLabelError),
    Maturity(MaturityError),
    InvalidIdentifier(String),
    CustomerNotFound(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Server(err) => write!(f, "server error: {}", err),
            AppError::ArchiveImport(err) => write!(f, "archive import error: {}", err),
            AppError::ArchiveExport(err) => write!(f, "archive export error: {}", err),
            AppError::Roster(err) => write!(f, "roster error: {}", err),
            AppError::Amortization(err) => write!(f, "amortization error: {}", err),
            AppError::AmountLabel(err) => write!(f, "amount label error: {}", err),
            AppError::Maturity(err) => write!(f, "maturity error: {}", err),
            AppError::InvalidIdentifier(value) => {
                write!(f, "'{}' is not a valid 18-character identifier", value)
            }
            AppError::CustomerNotFound(value) => {
                write!(f, "no maturing customer with identifier '{}'", value)
            }
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
            AppError::ArchiveImport(err) => Some(err),
            AppError::ArchiveExport(err) => Some(err),
            AppError::Roster(err) => Some(err),
            AppError::Amortization(err) => Some(err),
            AppError::AmountLabel(err) => Some(err),
            AppError::Maturity(err) => Some(err),
            AppError::InvalidIdentifier(_) | AppError::CustomerNotFound(_) => None,
        }
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::ArchiveImport(_) | AppError::Roster(_) => StatusCode::BAD_REQUEST,
            AppError::CustomerNotFound(_) => StatusCode::NOT_FOUND,
            AppError::ArchiveExport(_)
            | AppError::Amortization(_)
            | AppError::AmountLabel(_)
            | AppError::Maturity(_)
            | AppError::InvalidIdentifier(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Config(_)
            | AppError::Telemetry(_)
            | AppError::Io(_)
            | AppError::Server(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
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

impl From<ArchiveImportError> for AppError {
    fn from(value: ArchiveImportError) -> Self {
        Self::ArchiveImport(value)
    }
}

impl From<ArchiveExportError> for AppError {
    fn from(value: ArchiveExportError) -> Self {
        Self::ArchiveExport(value)
    }
}

impl From<RosterImportError> for AppError {
    fn from(value: RosterImportError) -> Self {
        Self::Roster(value)
    }
}

impl From<AmortizationError> for AppError {
    fn from(value: AmortizationError) -> Self {
        Self::Amortization(value)
    }
}

impl From<AmountLabelError> for AppError {
    fn from(value: AmountLabelError) -> Self {
        Self::AmountLabel(value)
    }
}

impl From<MaturityError> for AppError {
    fn from(value: MaturityError) -> Self {
        Self::Maturity(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn caller_mistakes_map_to_client_statuses() {
        assert_eq!(
            AppError::from(AmortizationError::ZeroTerm).status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            AppError::from(ArchiveImportError::MissingPayload).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::from(AmortizationError::TermTooLong(361)).status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            AppError::from(ConfigError::InvalidPort).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn response_carries_the_message() {
        let response = AppError::InvalidIdentifier("123".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let missing = AppError::CustomerNotFound("110101199003070017".to_string());
        assert_eq!(
            missing.to_string(),
            "no maturing customer with identifier '110101199003070017'"
        );
        assert_eq!(missing.into_response().status(), StatusCode::NOT_FOUND);
    }
}
