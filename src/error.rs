#[derive(thiserror::Error, Debug)]
pub enum ClientError {
    #[error("network error reaching the ledger endpoint: {0}")]
    Network(String),
    #[error("malformed rpc response: {0}")]
    Protocol(String),
    #[error("failed to decode trade payload: {0}")]
    Decode(String),
    #[error("invalid argument for entry point '{entry_point}': {reason}")]
    InvalidArgument { entry_point: String, reason: String },
    #[error("signing collaborator returned an unusable payload: {0}")]
    Signature(String),
    #[error("simulation rejected: {0}")]
    SimulationRejected(String),
    #[error("submission failed with status: {0}")]
    SubmissionFailed(String),
    #[error("account {0} not found on the ledger")]
    AccountNotFound(String),
    #[error("transaction was not finalized within {0} poll attempts")]
    Timeout(u32),
}

impl ClientError {
    pub fn invalid_argument(entry_point: &str, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            entry_point: entry_point.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        ClientError::Network(err.to_string())
    }
}
