//! Authentication route handlers.
//!
//! Handles login, registration, and logout against the remote API. A
//! successful login or registration stores the API token in the `authToken`
//! cookie and the returned profile in the session.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Multipart, State},
    http::header::SET_COOKIE,
    response::{AppendHeaders, IntoResponse, Redirect, Response},
};
use secrecy::SecretString;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::api::{ApiError, AuthResponse, AuthToken, AvatarUpload, Registration};
use crate::error::{AppError, Result, clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::middleware::{
    OptionalAuth, auth_cookie, clear_auth_cookie, clear_current_user, set_current_user, set_flash,
};
use crate::models::Flash;
use crate::routes::{Layout, PRODUCTS_PATH};
use crate::state::AppState;

const REQUIRED: &str = "This field is required";

// =============================================================================
// Form Types
// =============================================================================

/// Login form data.
#[derive(Debug, Default, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Registration form data, read from a multipart body.
#[derive(Debug, Default)]
pub struct RegisterForm {
    pub username: String,
    pub email: String,
    pub password: String,
    pub password_confirmation: String,
    pub avatar: Option<AvatarUpload>,
}

impl RegisterForm {
    /// Read the form fields and the optional avatar file. Unknown fields are
    /// ignored; an avatar with no file name or no content counts as absent.
    async fn from_multipart(mut multipart: Multipart) -> Result<Self> {
        let mut form = Self::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::BadRequest(e.to_string()))?
        {
            let name = field.name().unwrap_or_default().to_string();
            if name == "avatar" {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let content_type = field.content_type().map(String::from);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
                if !file_name.is_empty() && !bytes.is_empty() {
                    form.avatar = Some(AvatarUpload {
                        file_name,
                        content_type,
                        bytes: bytes.to_vec(),
                    });
                }
                continue;
            }

            let slot = match name.as_str() {
                "username" => &mut form.username,
                "email" => &mut form.email,
                "password" => &mut form.password,
                "password_confirmation" => &mut form.password_confirmation,
                _ => continue,
            };
            *slot = field
                .text()
                .await
                .map_err(|e| AppError::BadRequest(e.to_string()))?;
        }

        Ok(form)
    }
}

// =============================================================================
// Templates
// =============================================================================

/// Per-field messages on the login page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoginErrors {
    pub email: Option<String>,
    pub password: Option<String>,
}

impl LoginErrors {
    fn required(form: &LoginForm) -> Self {
        Self {
            email: form.email.trim().is_empty().then(|| REQUIRED.to_string()),
            password: form.password.trim().is_empty().then(|| REQUIRED.to_string()),
        }
    }

    fn is_empty(&self) -> bool {
        self.email.is_none() && self.password.is_none()
    }

    /// Messages for a failed login call. Anything but field validation lands
    /// under the password field.
    fn from_api(err: &ApiError) -> Self {
        let password = |message: &str| Self {
            email: None,
            password: Some(message.to_string()),
        };

        match err {
            ApiError::Validation { .. } => Self {
                email: err.first_field_error("email").map(String::from),
                password: err.first_field_error("password").map(String::from),
            },
            ApiError::Unauthorized(_) => password("Invalid email or password."),
            e if e.is_network() => password("Network error. Please try again."),
            _ => password("Something went wrong. Try again."),
        }
    }
}

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub layout: Layout,
    pub email: String,
    pub errors: LoginErrors,
}

/// Per-field messages on the registration page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegisterErrors {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub password_confirmation: Option<String>,
    pub avatar: Option<String>,
    /// Message not tied to a field.
    pub general: Option<String>,
}

impl RegisterErrors {
    fn required(form: &RegisterForm) -> Self {
        let required = |value: &str| value.trim().is_empty().then(|| REQUIRED.to_string());
        Self {
            username: required(&form.username),
            email: required(&form.email),
            password: required(&form.password),
            password_confirmation: required(&form.password_confirmation),
            ..Self::default()
        }
    }

    fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Messages for a failed registration call.
    fn from_api(err: &ApiError) -> Self {
        match err {
            ApiError::Validation { .. } => {
                let field = |name: &str| err.first_field_error(name).map(String::from);
                Self {
                    username: field("username"),
                    email: field("email"),
                    password: field("password"),
                    password_confirmation: field("password_confirmation"),
                    avatar: field("avatar"),
                    general: None,
                }
            }
            e if e.is_network() => Self {
                general: Some("Network error. Please check your connection.".to_string()),
                ..Self::default()
            },
            _ => Self {
                general: Some("An error occurred. Please try again later.".to_string()),
                ..Self::default()
            },
        }
    }
}

/// Register page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/register.html")]
pub struct RegisterTemplate {
    pub layout: Layout,
    pub username: String,
    pub email: String,
    pub errors: RegisterErrors,
}

// =============================================================================
// Session Helpers
// =============================================================================

/// Remember the login and send the visitor to the listing.
async fn start_session(
    state: &AppState,
    session: &Session,
    auth: AuthResponse,
    message: &str,
) -> Result<Response> {
    set_current_user(session, &auth.user).await?;
    set_sentry_user(auth.user.id, auth.user.email.as_deref());
    set_flash(session, Flash::success(message)).await?;

    let token = AuthToken::new(auth.token);
    let cookie = auth_cookie(&token, state.config().is_secure());
    Ok((AppendHeaders([(SET_COOKIE, cookie)]), Redirect::to(PRODUCTS_PATH)).into_response())
}

// =============================================================================
// Login Routes
// =============================================================================

/// Display the login page.
pub async fn login_page(auth: OptionalAuth, session: Session) -> impl IntoResponse {
    LoginTemplate {
        layout: Layout::load(&auth, &session).await,
        email: String::new(),
        errors: LoginErrors::default(),
    }
}

/// Handle login form submission.
#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    auth: OptionalAuth,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Response> {
    let mut errors = LoginErrors::required(&form);

    if errors.is_empty() {
        let email = form.email.trim();
        let password = SecretString::from(form.password.trim().to_string());
        match state.api().login(email, &password).await {
            Ok(response) => {
                tracing::info!("Login succeeded");
                return start_session(&state, &session, response, "Login successful!").await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Login failed");
                errors = LoginErrors::from_api(&e);
            }
        }
    }

    Ok(LoginTemplate {
        layout: Layout::load(&auth, &session).await,
        email: form.email,
        errors,
    }
    .into_response())
}

// =============================================================================
// Registration Routes
// =============================================================================

/// Display the registration page.
pub async fn register_page(auth: OptionalAuth, session: Session) -> impl IntoResponse {
    RegisterTemplate {
        layout: Layout::load(&auth, &session).await,
        username: String::new(),
        email: String::new(),
        errors: RegisterErrors::default(),
    }
}

/// Handle registration form submission.
///
/// The form (and avatar, if any) is forwarded to the API as multipart.
#[instrument(skip_all)]
pub async fn register(
    State(state): State<AppState>,
    auth: OptionalAuth,
    session: Session,
    multipart: Multipart,
) -> Result<Response> {
    let form = RegisterForm::from_multipart(multipart).await?;
    let mut errors = RegisterErrors::required(&form);
    let username = form.username.clone();
    let email = form.email.clone();

    if errors.is_empty() {
        let registration = Registration {
            username: form.username,
            email: form.email,
            password: SecretString::from(form.password),
            password_confirmation: SecretString::from(form.password_confirmation),
            avatar: form.avatar,
        };
        match state.api().register(registration).await {
            Ok(response) => {
                tracing::info!(username = %username, "Registration succeeded");
                return start_session(&state, &session, response, "Registration successful!")
                    .await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Registration failed");
                errors = RegisterErrors::from_api(&e);
            }
        }
    }

    Ok(RegisterTemplate {
        layout: Layout::load(&auth, &session).await,
        username,
        email,
        errors,
    }
    .into_response())
}

// =============================================================================
// Logout
// =============================================================================

/// Handle logout.
pub async fn logout(State(state): State<AppState>, session: Session) -> Result<Response> {
    clear_current_user(&session).await?;
    clear_sentry_user();

    let cookie = clear_auth_cookie(state.config().is_secure());
    Ok((AppendHeaders([(SET_COOKIE, cookie)]), Redirect::to("/auth/login")).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::FieldErrors;

    fn validation(fields: &[(&str, &str)]) -> ApiError {
        let mut errors = FieldErrors::new();
        for (field, message) in fields {
            errors.insert((*field).to_string(), vec![(*message).to_string()]);
        }
        ApiError::Validation {
            message: "The given data was invalid.".to_string(),
            errors,
        }
    }

    #[test]
    fn test_login_required_fields() {
        let errors = LoginErrors::required(&LoginForm {
            email: "   ".to_string(),
            password: "secret".to_string(),
        });
        assert_eq!(errors.email.as_deref(), Some(REQUIRED));
        assert!(errors.password.is_none());
        assert!(!errors.is_empty());
    }

    #[test]
    fn test_login_errors_from_api() {
        let errors = LoginErrors::from_api(&validation(&[("email", "Email is invalid")]));
        assert_eq!(errors.email.as_deref(), Some("Email is invalid"));
        assert!(errors.password.is_none());

        let errors = LoginErrors::from_api(&ApiError::Unauthorized("nope".to_string()));
        assert_eq!(errors.password.as_deref(), Some("Invalid email or password."));

        let errors = LoginErrors::from_api(&ApiError::Status {
            status: 500,
            message: "Server Error".to_string(),
        });
        assert_eq!(errors.password.as_deref(), Some("Something went wrong. Try again."));
    }

    #[test]
    fn test_register_required_fields() {
        let errors = RegisterErrors::required(&RegisterForm {
            username: "nino".to_string(),
            ..RegisterForm::default()
        });
        assert!(errors.username.is_none());
        assert_eq!(errors.email.as_deref(), Some(REQUIRED));
        assert_eq!(errors.password.as_deref(), Some(REQUIRED));
        assert_eq!(errors.password_confirmation.as_deref(), Some(REQUIRED));
        assert!(errors.avatar.is_none());
    }

    #[test]
    fn test_register_errors_from_api() {
        let errors = RegisterErrors::from_api(&validation(&[
            ("username", "The username has already been taken."),
            ("avatar", "The avatar must be an image."),
        ]));
        assert_eq!(
            errors.username.as_deref(),
            Some("The username has already been taken.")
        );
        assert_eq!(errors.avatar.as_deref(), Some("The avatar must be an image."));
        assert!(errors.general.is_none());

        let errors = RegisterErrors::from_api(&ApiError::Status {
            status: 500,
            message: "Server Error".to_string(),
        });
        assert_eq!(
            errors.general.as_deref(),
            Some("An error occurred. Please try again later.")
        );
    }
}
