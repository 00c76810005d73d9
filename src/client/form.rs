use std::time::Duration;

use tracing::debug;

use crate::auth::dto::{ChangePasswordRequest, CreateAccountRequest};
use crate::auth::handlers::MIN_PASSWORD_LEN;
use crate::auth::repo_types::UserRole;

use super::api::{AuthClient, ClientError};

/// Delay before the post-success redirect fires.
pub const REDIRECT_DELAY: Duration = Duration::from_secs(2);

/// Registration data staged between the signup step and the password-setup
/// step. Owned by the form and consumed on successful account creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedRegistration {
    pub name: String,
    pub email: String,
    /// The provisional password handed out at the signup step; the user must
    /// retype it as the "old" password and replace it.
    pub provisional_password: String,
    pub role: Option<UserRole>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    OldPassword,
    NewPassword,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormState {
    Idle,
    Validating,
    Submitting,
    Success,
    FieldError,
    GeneralError,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Redirect {
    Login,
}

/// What the page should do after a successful submit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormOutcome {
    pub redirect: Redirect,
    pub after: Duration,
    pub clear_session: bool,
}

#[derive(Debug, Default)]
struct FieldErrors {
    old_password: Option<String>,
    new_password: Option<String>,
}

/// Controller for the password form. Runs in *registration* mode when staged
/// registration data is present, otherwise in *change* mode against the
/// session's bearer token. Field validation mirrors the server rules and runs
/// on blur and on submit; submission is blocked until every field passes.
pub struct PasswordForm {
    staged: Option<StagedRegistration>,
    token: Option<String>,
    old_password: String,
    new_password: String,
    errors: FieldErrors,
    general_error: Option<String>,
    state: FormState,
}

impl PasswordForm {
    pub fn registration(staged: StagedRegistration) -> Self {
        Self::new(Some(staged), None)
    }

    pub fn change(token: impl Into<String>) -> Self {
        Self::new(None, Some(token.into()))
    }

    fn new(staged: Option<StagedRegistration>, token: Option<String>) -> Self {
        Self {
            staged,
            token,
            old_password: String::new(),
            new_password: String::new(),
            errors: FieldErrors::default(),
            general_error: None,
            state: FormState::Idle,
        }
    }

    pub fn state(&self) -> FormState {
        self.state
    }

    pub fn field_error(&self, field: FormField) -> Option<&str> {
        match field {
            FormField::OldPassword => self.errors.old_password.as_deref(),
            FormField::NewPassword => self.errors.new_password.as_deref(),
        }
    }

    pub fn general_error(&self) -> Option<&str> {
        self.general_error.as_deref()
    }

    pub fn staged_registration(&self) -> Option<&StagedRegistration> {
        self.staged.as_ref()
    }

    pub fn set_old_password(&mut self, value: impl Into<String>) {
        self.old_password = value.into();
        self.errors.old_password = None;
    }

    pub fn set_new_password(&mut self, value: impl Into<String>) {
        self.new_password = value.into();
        self.errors.new_password = None;
    }

    /// Field-level validation, run when the input loses focus.
    pub fn blur(&mut self, field: FormField) {
        let error = self.validate_field(field);
        match field {
            FormField::OldPassword => self.errors.old_password = error,
            FormField::NewPassword => self.errors.new_password = error,
        }
    }

    fn validate_field(&self, field: FormField) -> Option<String> {
        match field {
            FormField::OldPassword => {
                if self.old_password.is_empty() {
                    return Some("Old password is required".to_string());
                }
                if let Some(staged) = &self.staged {
                    if self.old_password != staged.provisional_password {
                        return Some("Old password does not match".to_string());
                    }
                }
                None
            }
            FormField::NewPassword => {
                if self.new_password.is_empty() {
                    return Some("New password is required".to_string());
                }
                if self.new_password.len() < MIN_PASSWORD_LEN {
                    return Some(format!(
                        "Password must be at least {MIN_PASSWORD_LEN} characters"
                    ));
                }
                if !self.old_password.is_empty() && self.new_password == self.old_password {
                    return Some(
                        "New password must be different from the old password".to_string(),
                    );
                }
                None
            }
        }
    }

    fn validate_all(&mut self) -> bool {
        self.errors.old_password = self.validate_field(FormField::OldPassword);
        self.errors.new_password = self.validate_field(FormField::NewPassword);
        self.errors.old_password.is_none() && self.errors.new_password.is_none()
    }

    /// Validates every field and, if all pass, submits to the matching
    /// endpoint. Returns the post-success outcome, or `None` with the form
    /// left in an error state.
    pub async fn submit(&mut self, client: &AuthClient) -> Option<FormOutcome> {
        self.general_error = None;
        self.state = FormState::Validating;
        if !self.validate_all() {
            self.state = FormState::FieldError;
            return None;
        }

        self.state = FormState::Submitting;
        let result = match (&self.staged, &self.token) {
            (Some(staged), _) => {
                let req = CreateAccountRequest {
                    name: staged.name.clone(),
                    email: staged.email.clone(),
                    old_password: self.old_password.clone(),
                    new_password: self.new_password.clone(),
                    role: staged.role,
                };
                client.create_account(&req).await.map(|_| FormOutcome {
                    redirect: Redirect::Login,
                    after: REDIRECT_DELAY,
                    clear_session: false,
                })
            }
            (None, Some(token)) => {
                let req = ChangePasswordRequest {
                    old_password: self.old_password.clone(),
                    new_password: self.new_password.clone(),
                };
                client.change_password(token, &req).await.map(|_| FormOutcome {
                    redirect: Redirect::Login,
                    after: REDIRECT_DELAY,
                    clear_session: true,
                })
            }
            (None, None) => {
                self.state = FormState::GeneralError;
                self.general_error = Some("No session".to_string());
                return None;
            }
        };

        match result {
            Ok(outcome) => {
                // The staged payload is single-use.
                self.staged.take();
                self.state = FormState::Success;
                debug!("form submitted");
                Some(outcome)
            }
            Err(err) => {
                self.apply_server_error(err);
                None
            }
        }
    }

    /// Routes a server failure to the tagged field, or surfaces it as a
    /// general error when no tag names one of this form's inputs.
    fn apply_server_error(&mut self, err: ClientError) {
        match err {
            ClientError::Api {
                field: Some(field),
                message,
                ..
            } if field == "oldPassword" => {
                self.errors.old_password = Some(message);
                self.state = FormState::FieldError;
            }
            ClientError::Api {
                field: Some(field),
                message,
                ..
            } if field == "newPassword" => {
                self.errors.new_password = Some(message);
                self.state = FormState::FieldError;
            }
            ClientError::Api { message, .. } => {
                self.general_error = Some(message);
                self.state = FormState::GeneralError;
            }
            ClientError::Transport(err) => {
                self.general_error = Some(err.to_string());
                self.state = FormState::GeneralError;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn staged() -> StagedRegistration {
        StagedRegistration {
            name: "A".into(),
            email: "a@x.com".into(),
            provisional_password: "default1".into(),
            role: None,
        }
    }

    fn unreachable_client() -> AuthClient {
        // Only used on paths where validation blocks the request.
        AuthClient::new("http://127.0.0.1:9")
    }

    #[test]
    fn blur_flags_missing_fields() {
        let mut form = PasswordForm::change("tok");
        form.blur(FormField::OldPassword);
        form.blur(FormField::NewPassword);
        assert_eq!(
            form.field_error(FormField::OldPassword),
            Some("Old password is required")
        );
        assert_eq!(
            form.field_error(FormField::NewPassword),
            Some("New password is required")
        );
    }

    #[test]
    fn blur_flags_short_and_equal_passwords() {
        let mut form = PasswordForm::change("tok");
        form.set_old_password("default1");
        form.set_new_password("short");
        form.blur(FormField::NewPassword);
        assert_eq!(
            form.field_error(FormField::NewPassword),
            Some("Password must be at least 6 characters")
        );

        form.set_new_password("default1");
        form.blur(FormField::NewPassword);
        assert_eq!(
            form.field_error(FormField::NewPassword),
            Some("New password must be different from the old password")
        );
    }

    #[test]
    fn editing_a_field_clears_its_error() {
        let mut form = PasswordForm::change("tok");
        form.blur(FormField::OldPassword);
        assert!(form.field_error(FormField::OldPassword).is_some());
        form.set_old_password("default1");
        assert!(form.field_error(FormField::OldPassword).is_none());
    }

    #[tokio::test]
    async fn submit_is_blocked_until_fields_pass() {
        let mut form = PasswordForm::change("tok");
        form.set_old_password("default1");
        form.set_new_password("short");
        let outcome = form.submit(&unreachable_client()).await;
        assert!(outcome.is_none());
        assert_eq!(form.state(), FormState::FieldError);
        assert!(form.field_error(FormField::NewPassword).is_some());
    }

    #[tokio::test]
    async fn registration_rejects_mismatched_provisional_password() {
        let mut form = PasswordForm::registration(staged());
        form.set_old_password("something-else");
        form.set_new_password("secret1");
        let outcome = form.submit(&unreachable_client()).await;
        assert!(outcome.is_none());
        assert_eq!(form.state(), FormState::FieldError);
        assert_eq!(
            form.field_error(FormField::OldPassword),
            Some("Old password does not match")
        );
    }

    #[tokio::test]
    async fn registration_success_consumes_the_staged_payload() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/auth/create-account"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "success": true,
                "data": {"user": {
                    "id": uuid::Uuid::new_v4(),
                    "name": "A",
                    "email": "a@x.com",
                    "role": "tester",
                    "isActive": true
                }},
                "message": "Account created"
            })))
            .mount(&server)
            .await;

        let mut form = PasswordForm::registration(staged());
        form.set_old_password("default1");
        form.set_new_password("secret1");
        let outcome = form
            .submit(&AuthClient::new(server.uri()))
            .await
            .expect("submit should succeed");

        assert_eq!(form.state(), FormState::Success);
        assert!(form.staged_registration().is_none());
        assert_eq!(outcome.redirect, Redirect::Login);
        assert_eq!(outcome.after, REDIRECT_DELAY);
        assert!(!outcome.clear_session);
    }

    #[tokio::test]
    async fn change_success_clears_the_session() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/api/auth/change-password"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "success": true,
                "message": "Password changed"
            })))
            .mount(&server)
            .await;

        let mut form = PasswordForm::change("tok");
        form.set_old_password("default1");
        form.set_new_password("secret1");
        let outcome = form
            .submit(&AuthClient::new(server.uri()))
            .await
            .expect("submit should succeed");

        assert_eq!(form.state(), FormState::Success);
        assert!(outcome.clear_session);
    }

    #[tokio::test]
    async fn tagged_server_errors_land_on_the_field() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/api/auth/change-password"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "success": false,
                "error": "Old password is incorrect",
                "field": "oldPassword"
            })))
            .mount(&server)
            .await;

        let mut form = PasswordForm::change("tok");
        form.set_old_password("wrong-pass");
        form.set_new_password("secret1");
        assert!(form.submit(&AuthClient::new(server.uri())).await.is_none());

        assert_eq!(form.state(), FormState::FieldError);
        assert_eq!(
            form.field_error(FormField::OldPassword),
            Some("Old password is incorrect")
        );
    }

    #[tokio::test]
    async fn untagged_server_errors_are_general() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/api/auth/change-password"))
            .respond_with(ResponseTemplate::new(500).set_body_json(serde_json::json!({
                "success": false,
                "error": "Internal server error"
            })))
            .mount(&server)
            .await;

        let mut form = PasswordForm::change("tok");
        form.set_old_password("default1");
        form.set_new_password("secret1");
        assert!(form.submit(&AuthClient::new(server.uri())).await.is_none());

        assert_eq!(form.state(), FormState::GeneralError);
        assert_eq!(form.general_error(), Some("Internal server error"));
    }
}
