use thiserror::Error;

/// Failures surfaced by the social core. Every variant except `Storage` is a
/// terminal outcome for the caller and is never retried.
#[derive(Debug, Error)]
pub enum SocialError {
    #[error("You cannot send a connection request to yourself")]
    SelfReference,

    #[error("Connection request already sent")]
    DuplicateRequest,

    #[error("You already have a pending request from this user")]
    IncomingRequestExists,

    #[error("You are already connected with this user")]
    AlreadyConnected,

    #[error("Connection request has already been answered")]
    RequestAlreadyAnswered,

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    InvalidInput(String),

    #[error("Authentication required")]
    Unauthenticated,

    #[error("storage failure: {0}")]
    Storage(#[from] anyhow::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Conflict,
    Unauthenticated,
    Internal,
}

impl SocialError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::SelfReference | Self::InvalidInput(_) => ErrorKind::Validation,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::DuplicateRequest
            | Self::IncomingRequestExists
            | Self::AlreadyConnected
            | Self::RequestAlreadyAnswered => ErrorKind::Conflict,
            Self::Unauthenticated => ErrorKind::Unauthenticated,
            Self::Storage(_) => ErrorKind::Internal,
        }
    }
}
