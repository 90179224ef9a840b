use reqwest::StatusCode;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("{status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("invalid response: {0}")]
    Decode(String),

    #[error("event stream error: {0}")]
    Stream(String),
}

impl ApiError {
    /// The backend rejected the dashboard session cookie.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Status { status, .. } if *status == StatusCode::UNAUTHORIZED)
    }

    /// The request never produced an HTTP response (DNS, refused, reset, ...).
    pub fn is_transport(&self) -> bool {
        match self {
            Self::Transport(e) => !e.is_decode() && !e.is_status(),
            Self::Stream(_) => true,
            _ => false,
        }
    }

    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Transport(e) => e.status(),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ApiError>;
