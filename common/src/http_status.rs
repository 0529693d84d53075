//! HTTP status code classification used when mapping API responses to errors.

/// HTTP status code for error categorization.
///
/// Stored directly rather than parsed from error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HttpStatusCode(pub u16);

impl HttpStatusCode {
    pub const BAD_REQUEST: HttpStatusCode = HttpStatusCode(400);
    pub const UNAUTHORIZED: HttpStatusCode = HttpStatusCode(401);
    pub const FORBIDDEN: HttpStatusCode = HttpStatusCode(403);
    pub const TOO_MANY_REQUESTS: HttpStatusCode = HttpStatusCode(429);

    /// 2xx responses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.0)
    }

    /// 4xx client errors.
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.0)
    }

    /// 5xx server errors.
    pub fn is_server_error(&self) -> bool {
        (500..600).contains(&self.0)
    }

    /// Codes that indicate a transient failure worth retrying by the caller.
    pub fn is_retryable(&self) -> bool {
        matches!(self.0, 429 | 502 | 503 | 504)
    }
}

impl From<u16> for HttpStatusCode {
    fn from(code: u16) -> Self {
        HttpStatusCode(code)
    }
}

impl std::fmt::Display for HttpStatusCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
