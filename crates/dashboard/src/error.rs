use mcphub_api_client::ApiError;

/// Backend failures as the dashboard classifies them.
///
/// None of these ever leaves a component: each one is folded into a state
/// value (an error placeholder, a notice, a login message, a failed rebuild).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BackendError {
    /// The session cookie was rejected (HTTP 401).
    #[error("not authenticated")]
    Unauthorized,

    /// Any other non-2xx answer.
    #[error("backend rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// No HTTP answer at all.
    #[error("backend unreachable: {0}")]
    Unreachable(String),

    /// An answer that could not be understood.
    #[error("malformed response: {0}")]
    Malformed(String),
}

impl BackendError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized)
    }

    pub fn is_unreachable(&self) -> bool {
        matches!(self, Self::Unreachable(_))
    }
}

impl From<ApiError> for BackendError {
    fn from(err: ApiError) -> Self {
        if err.is_unauthorized() {
            return Self::Unauthorized;
        }
        match err {
            ApiError::Status { status, body } => Self::Rejected {
                status: status.as_u16(),
                message: body,
            },
            ApiError::Transport(e) if e.is_decode() => Self::Malformed(e.to_string()),
            ApiError::Transport(e) => Self::Unreachable(e.to_string()),
            ApiError::Stream(msg) => Self::Unreachable(msg),
            ApiError::Decode(msg) => Self::Malformed(msg),
        }
    }
}
