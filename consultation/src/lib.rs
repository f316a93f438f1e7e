pub mod auth;
pub mod error;
pub mod form;
pub mod local;
pub mod models;
pub mod store;

pub use auth::{
    AuthProvider, IdentityToolkitAuthProvider, InMemoryAuthProvider, SignInFlow, SignInState,
    Verification,
};
pub use error::{AuthError, FormError, SignInError, StoreError, SubmitError};
pub use form::{
    CONFIRMATION_BODY, CONFIRMATION_TITLE, ConsultationForm, ConsultationIntake, SubmissionOutcome,
};
pub use local::{DraftStash, FileLocalStore, InMemoryLocalStore, LocalStore, keys};
pub use models::{
    ConsultationCategory, ConsultationDraft, ConsultationRequest, ConsultationStatus,
    ConsultationType, Urgency, UserSession,
};
pub use store::{
    ConsultationStore, FallbackStore, InMemoryConsultationStore, LocalFallbackStore,
    PostgresConsultationStore,
};
