use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    /// A `bids_subject_session` value that cannot be split into subject and session.
    #[error("improperly formatted bids_subject_session \"{label}\": {reason}")]
    MalformedLabel { label: String, reason: String },
}

pub type Result<T> = std::result::Result<T, ModelError>;
