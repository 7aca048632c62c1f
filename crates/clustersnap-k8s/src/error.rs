use thiserror::Error;

/// Failure talking to a cluster's API
///
/// `code` carries the HTTP status when the API answered; transport failures
/// have no code.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cluster API error{}: {message}", format_code(*code))]
pub struct ClusterApiError {
    pub code: Option<u16>,
    pub message: String,
}

impl ClusterApiError {
    pub fn new(code: Option<u16>, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(Some(401), message)
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(None, message)
    }

    /// Whether the cluster rejected our bearer token
    pub fn is_unauthorized(&self) -> bool {
        self.code == Some(401)
    }
}

fn format_code(code: Option<u16>) -> String {
    code.map(|c| format!(" ({})", c)).unwrap_or_default()
}

impl From<kube::Error> for ClusterApiError {
    fn from(e: kube::Error) -> Self {
        match e {
            kube::Error::Api(ae) => Self::new(Some(ae.code), ae.message),
            other => Self::transport(other.to_string()),
        }
    }
}
