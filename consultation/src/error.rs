use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Local storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Errors reported by an [`AuthProvider`](crate::AuthProvider).
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Auth provider rejected the request: {0}")]
    Rejected(String),

    #[error("Not a sign-in link")]
    InvalidLink,
}

/// User-facing failures of the sign-in flow. The messages are shown as is.
#[derive(Error, Debug)]
pub enum SignInError {
    #[error("Please enter a valid email address")]
    InvalidEmail,

    #[error("Failed to send email. Please try again.")]
    SendFailed(#[source] AuthError),

    #[error("Invalid verification link.")]
    InvalidLink,

    #[error("No email provided for verification.")]
    MissingEmail,

    #[error("Failed to verify your email. Please try again.")]
    VerificationFailed(#[source] AuthError),

    #[error("An unexpected error occurred. Please try again.")]
    Storage(#[from] StoreError),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormError {
    #[error("{0} is required.")]
    MissingField(&'static str),

    #[error("Address is required for at-home consultations.")]
    AddressRequired,
}

#[derive(Error, Debug)]
pub enum SubmitError {
    #[error("You must be signed in to submit a consultation request.")]
    NotAuthenticated,

    #[error(transparent)]
    Invalid(#[from] FormError),

    #[error("Failed to submit consultation request. Please try again.")]
    Persistence(#[source] StoreError),
}
