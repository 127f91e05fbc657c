use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("malformed document: {reason}")]
    Malformed { reason: String },
}

impl DomainError {
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::Malformed {
            reason: reason.into(),
        }
    }
}
