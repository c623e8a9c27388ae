//! Error types for the fleetdash crates.

use thiserror::Error;

/// Platform error codes returned in the Fleet API envelope.
pub const CODE_INVALID_START_DATE: i64 = 498805;
pub const CODE_INVALID_DATE_RANGE: i64 = 498806;
pub const CODE_COMPANY_NOT_FOUND: i64 = 498807;
pub const CODE_COMPANY_NOT_ACTIVE: i64 = 498809;
pub const CODE_COMPANY_NOT_ALLOWED: i64 = 498810;

/// A business-level rejection reported by the Fleet API through its `code` field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BusinessErrorKind {
    #[error("the start date is earlier than the platform allows")]
    InvalidStartDate,

    #[error("the requested date range is too long")]
    InvalidDateRange,

    #[error("the company was not found")]
    CompanyNotFound,

    #[error("the company is not active")]
    CompanyNotActive,

    #[error("this account is not allowed to access the company")]
    CompanyNotAllowed,

    #[error("platform error {code}: {message}")]
    Other { code: i64, message: String },
}

impl BusinessErrorKind {
    /// Map a non-zero envelope code to its business error kind.
    pub fn from_code(code: i64, message: &str) -> Self {
        match code {
            CODE_INVALID_START_DATE => Self::InvalidStartDate,
            CODE_INVALID_DATE_RANGE => Self::InvalidDateRange,
            CODE_COMPANY_NOT_FOUND => Self::CompanyNotFound,
            CODE_COMPANY_NOT_ACTIVE => Self::CompanyNotActive,
            CODE_COMPANY_NOT_ALLOWED => Self::CompanyNotAllowed,
            other => Self::Other {
                code: other,
                message: message.to_string(),
            },
        }
    }

    /// Whether `code` is one of the documented platform codes.
    pub fn is_known_code(code: i64) -> bool {
        matches!(
            code,
            CODE_INVALID_START_DATE
                | CODE_INVALID_DATE_RANGE
                | CODE_COMPANY_NOT_FOUND
                | CODE_COMPANY_NOT_ACTIVE
                | CODE_COMPANY_NOT_ALLOWED
        )
    }
}

/// Top-level error type for all fleetdash operations.
#[derive(Debug, Error)]
pub enum FleetError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("token exchange rejected ({status}): {body}")]
    Auth { status: u16, body: String },

    #[error("fleet API request failed ({status}): {body}")]
    RemoteRequest { status: u16, body: String },

    #[error("fleet API protocol error: {0}")]
    RemoteProtocol(String),

    #[error("fleet API rejected the request: {0}")]
    RemoteBusiness(BusinessErrorKind),

    #[error("no companies are accessible with this account")]
    NoCompanies,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl FleetError {
    /// True for errors that originate from the remote platform or the network path to it.
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            FleetError::Auth { .. }
                | FleetError::RemoteRequest { .. }
                | FleetError::RemoteProtocol(_)
                | FleetError::RemoteBusiness(_)
                | FleetError::Http(_)
        )
    }
}

/// A convenience Result alias that defaults to [`FleetError`].
pub type Result<T> = std::result::Result<T, FleetError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_display() {
        let err = FleetError::Config("missing field".into());
        assert_eq!(err.to_string(), "configuration error: missing field");
    }

    #[test]
    fn io_error_from() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = FleetError::from(io_err);
        assert!(matches!(err, FleetError::Io(_)));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn remote_request_display_carries_status_and_body() {
        let err = FleetError::RemoteRequest {
            status: 502,
            body: "bad gateway".into(),
        };
        assert_eq!(err.to_string(), "fleet API request failed (502): bad gateway");
        assert!(err.is_remote());
    }

    #[test]
    fn auth_error_display() {
        let err = FleetError::Auth {
            status: 401,
            body: "invalid_client".into(),
        };
        assert!(err.to_string().contains("401"));
        assert!(err.to_string().contains("invalid_client"));
    }

    #[test]
    fn business_codes_map_to_distinct_kinds() {
        assert_eq!(
            BusinessErrorKind::from_code(498805, ""),
            BusinessErrorKind::InvalidStartDate
        );
        assert_eq!(
            BusinessErrorKind::from_code(498806, ""),
            BusinessErrorKind::InvalidDateRange
        );
        assert_eq!(
            BusinessErrorKind::from_code(498807, ""),
            BusinessErrorKind::CompanyNotFound
        );
        assert_eq!(
            BusinessErrorKind::from_code(498809, ""),
            BusinessErrorKind::CompanyNotActive
        );
        assert_eq!(
            BusinessErrorKind::from_code(498810, ""),
            BusinessErrorKind::CompanyNotAllowed
        );
    }

    #[test]
    fn unknown_business_code_keeps_message() {
        let kind = BusinessErrorKind::from_code(1234, "something odd");
        assert_eq!(
            kind,
            BusinessErrorKind::Other {
                code: 1234,
                message: "something odd".into()
            }
        );
        assert!(!BusinessErrorKind::is_known_code(1234));
        assert!(BusinessErrorKind::is_known_code(498807));
    }

    #[test]
    fn company_not_found_is_presentable() {
        let err = FleetError::RemoteBusiness(BusinessErrorKind::CompanyNotFound);
        assert_eq!(
            err.to_string(),
            "fleet API rejected the request: the company was not found"
        );
    }

    #[test]
    fn local_errors_are_not_remote() {
        assert!(!FleetError::NoCompanies.is_remote());
        assert!(!FleetError::Config("x".into()).is_remote());
    }

    #[test]
    fn result_alias_works() {
        let ok: Result<i32> = Ok(42);
        assert!(ok.is_ok());

        let err: Result<i32> = Err(FleetError::Config("bad".into()));
        assert!(err.is_err());
    }
}
