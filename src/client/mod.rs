//! Typed client for the auth API: an HTTP invoker plus the form-controller
//! state machine that drives the registration and change-password pages.

pub mod api;
pub mod form;

pub use api::{AuthClient, ClientError};
pub use form::{
    FormField, FormOutcome, FormState, PasswordForm, Redirect, StagedRegistration, REDIRECT_DELAY,
};
