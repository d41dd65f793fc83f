use thiserror::Error;

/// Service layer errors - combines all error types
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error(transparent)]
    RfcError(#[from] kunai_rfc::error::RfcError),

    #[error(transparent)]
    CoreError(#[from] kunai_core::error::CoreError),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Recurrence rule error: {0}")]
    RRuleError(String),

    #[error("Timezone error: {0}")]
    TimezoneError(#[from] kunai_rfc::rfc::ical::expand::ConversionError),

    #[error("Scheduling error: {0}")]
    SchedulingError(String),
}

impl From<kunai_rfc::rfc::ical::parse::ParseError> for ServiceError {
    fn from(err: kunai_rfc::rfc::ical::parse::ParseError) -> Self {
        Self::RfcError(err.into())
    }
}

pub type ServiceResult<T> = std::result::Result<T, ServiceError>;
