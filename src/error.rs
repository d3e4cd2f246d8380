use thiserror::Error;

/// The four classes a caller can observe
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Wrong or missing shared secret
    Unauthorized,
    /// Missing/invalid field or unsupported query type
    BadRequest,
    /// Identifier resolution yielded no usable entity
    NotFound,
    /// Anything raised by the upstream registry or its transport
    Upstream,
}

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Invalid auth key")]
    Unauthorized,

    #[error("Query type '{query_type}' requires field '{field}'")]
    MissingField {
        query_type: String,
        field: &'static str,
    },

    #[error("Unsupported query type: {0}")]
    UnsupportedQueryType(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Upstream lookup failed: OpenDART API key not configured. Set DART_API_KEY or dart.api_key.")]
    NoApiKey,

    #[error("Upstream lookup failed: network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Upstream lookup failed: API error ({code}): {message}")]
    ApiError {
        code: String,
        message: String,
        hint: Option<String>,
    },

    #[error("Upstream lookup failed: rate limit exceeded")]
    RateLimit,

    #[error("Upstream lookup failed: parse error: {0}")]
    Parse(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl GatewayError {
    /// Create an API error with an optional hint
    pub fn api_error(code: impl Into<String>, message: impl Into<String>, hint: Option<String>) -> Self {
        Self::ApiError {
            code: code.into(),
            message: message.into(),
            hint,
        }
    }

    pub fn missing_field(query_type: impl Into<String>, field: &'static str) -> Self {
        Self::MissingField {
            query_type: query_type.into(),
            field,
        }
    }

    /// Classify the error into the status class reported to callers
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Unauthorized => ErrorKind::Unauthorized,
            Self::MissingField { .. } | Self::UnsupportedQueryType(_) | Self::InvalidInput(_) => {
                ErrorKind::BadRequest
            }
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::NoApiKey
            | Self::Network(_)
            | Self::ApiError { .. }
            | Self::RateLimit
            | Self::Parse(_)
            | Self::Serialization(_)
            | Self::Io(_)
            | Self::Config(_) => ErrorKind::Upstream,
        }
    }

    /// Get user-friendly hint for the error
    pub fn hint(&self) -> Option<String> {
        match self {
            Self::NoApiKey => Some(
                "Get an API key at https://opendart.fss.or.kr and export it as DART_API_KEY."
                    .to_string(),
            ),
            Self::ApiError { hint, .. } => hint.clone(),
            Self::RateLimit => Some(
                "OpenDART allows a limited number of calls per day. Please try again later."
                    .to_string(),
            ),
            Self::MissingField { field, .. } => {
                Some(format!("Add a non-empty '{}' to the request body.", field))
            }
            Self::UnsupportedQueryType(_) => {
                Some("See the query type list in the service documentation.".to_string())
            }
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, GatewayError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_field_names_field_and_tag() {
        let error = GatewayError::missing_field("report_content", "bsns_year");
        let msg = error.to_string();
        assert!(msg.contains("bsns_year"));
        assert!(msg.contains("report_content"));
        assert_eq!(error.kind(), ErrorKind::BadRequest);
        assert!(error.hint().unwrap().contains("bsns_year"));
    }

    #[test]
    fn test_unsupported_query_type_is_bad_request() {
        let error = GatewayError::UnsupportedQueryType("stock_price".to_string());
        assert!(error.to_string().contains("stock_price"));
        assert_eq!(error.kind(), ErrorKind::BadRequest);
    }

    #[test]
    fn test_upstream_errors_keep_upstream_message() {
        let error = GatewayError::api_error("100", "필드의 부적절한 값입니다.", None);
        let msg = error.to_string();
        assert!(msg.starts_with("Upstream lookup failed"));
        assert!(msg.contains("필드의 부적절한 값입니다."));
        assert_eq!(error.kind(), ErrorKind::Upstream);
    }

    #[test]
    fn test_no_api_key_is_upstream_failure_with_hint() {
        let error = GatewayError::NoApiKey;
        assert_eq!(error.kind(), ErrorKind::Upstream);
        assert!(error.hint().unwrap().contains("DART_API_KEY"));
    }

    #[test]
    fn test_classes() {
        assert_eq!(GatewayError::Unauthorized.kind(), ErrorKind::Unauthorized);
        assert_eq!(
            GatewayError::NotFound("삼성전자".to_string()).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            GatewayError::InvalidInput("bad date".to_string()).kind(),
            ErrorKind::BadRequest
        );
        assert_eq!(GatewayError::RateLimit.kind(), ErrorKind::Upstream);
    }
}
