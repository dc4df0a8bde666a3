//! Authentication extractors and cookie helpers.
//!
//! The bearer token issued by the remote API is kept in the `authToken`
//! cookie; its presence is what makes a visitor logged in. The profile that
//! came with it is kept in the session for the header avatar.

use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, header::COOKIE, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;
use tower_sessions::cookie::{Cookie, SameSite, time::Duration};

use crate::api::AuthToken;
use crate::models::{CurrentUser, session_keys};

/// Name of the cookie carrying the API token.
pub const AUTH_COOKIE: &str = "authToken";

/// Lifetime of the auth cookie in days.
const AUTH_COOKIE_DAYS: i64 = 7;

/// Read the API token from the request's `Cookie` headers.
#[must_use]
pub fn token_from_headers(headers: &HeaderMap) -> Option<AuthToken> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(Cookie::split_parse)
        .filter_map(Result::ok)
        .find(|cookie| cookie.name() == AUTH_COOKIE && !cookie.value().is_empty())
        .map(|cookie| AuthToken::new(cookie.value()))
}

/// `Set-Cookie` value storing the token for seven days.
#[must_use]
pub fn auth_cookie(token: &AuthToken, secure: bool) -> String {
    Cookie::build((AUTH_COOKIE, token.expose().to_owned()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Strict)
        .secure(secure)
        .max_age(Duration::days(AUTH_COOKIE_DAYS))
        .build()
        .to_string()
}

/// `Set-Cookie` value that deletes the token cookie.
#[must_use]
pub fn clear_auth_cookie(secure: bool) -> String {
    Cookie::build((AUTH_COOKIE, ""))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Strict)
        .secure(secure)
        .max_age(Duration::ZERO)
        .build()
        .to_string()
}

async fn session_user(parts: &Parts) -> Option<CurrentUser> {
    let session = parts.extensions.get::<Session>()?;
    session
        .get::<CurrentUser>(session_keys::USER)
        .await
        .ok()
        .flatten()
}

/// Extractor that requires a logged-in visitor.
///
/// If there is no token cookie, returns a redirect to the login page.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(RequireAuth { token }: RequireAuth) -> impl IntoResponse {
///     state.api().get_cart(&token).await
/// }
/// ```
pub struct RequireAuth {
    pub token: AuthToken,
}

/// Rejection when a logged-in visitor is required.
pub struct AuthRejection;

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        Redirect::to("/auth/login").into_response()
    }
}

impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let token = token_from_headers(&parts.headers).ok_or(AuthRejection)?;
        Ok(Self { token })
    }
}

/// Extractor that reads the token and profile if present.
///
/// Unlike `RequireAuth`, this does not reject anonymous visitors.
pub struct OptionalAuth {
    pub token: Option<AuthToken>,
    pub user: Option<CurrentUser>,
}

impl OptionalAuth {
    /// Whether the visitor has a token.
    #[must_use]
    pub const fn is_logged_in(&self) -> bool {
        self.token.is_some()
    }
}

impl<S> FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let token = token_from_headers(&parts.headers);
        let user = if token.is_some() {
            session_user(parts).await
        } else {
            None
        };
        Ok(Self { token, user })
    }
}

/// Helper to store the logged-in user's profile in the session.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_user(
    session: &Session,
    user: &CurrentUser,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(session_keys::USER, user).await
}

/// Helper to clear the profile from the session (logout).
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_user(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.remove::<CurrentUser>(session_keys::USER).await?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_token_from_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_static("theme=dark; authToken=abc123; other=1"),
        );
        assert_eq!(token_from_headers(&headers).unwrap().expose(), "abc123");
    }

    #[test]
    fn test_token_from_multiple_cookie_headers() {
        let mut headers = HeaderMap::new();
        headers.append(COOKIE, HeaderValue::from_static("theme=dark"));
        headers.append(COOKIE, HeaderValue::from_static("authToken=xyz"));
        assert_eq!(token_from_headers(&headers).unwrap().expose(), "xyz");
    }

    #[test]
    fn test_missing_or_empty_token() {
        let mut headers = HeaderMap::new();
        assert!(token_from_headers(&headers).is_none());
        headers.insert(COOKIE, HeaderValue::from_static("authToken="));
        assert!(token_from_headers(&headers).is_none());
    }

    #[test]
    fn test_auth_cookie_attributes() {
        let cookie = auth_cookie(&AuthToken::new("tok"), true);
        assert!(cookie.starts_with("authToken=tok"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("SameSite=Strict"));
        assert!(cookie.contains("Secure"));
        assert!(cookie.contains("Path=/"));
        assert!(cookie.contains("Max-Age=604800"));

        let cookie = auth_cookie(&AuthToken::new("tok"), false);
        assert!(!cookie.contains("Secure"));
    }

    #[test]
    fn test_clear_auth_cookie_expires_immediately() {
        let cookie = clear_auth_cookie(false);
        assert!(cookie.starts_with("authToken=;"));
        assert!(cookie.contains("Max-Age=0"));
    }
}
