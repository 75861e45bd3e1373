use axum::extract::Request;
use axum::extract::State;
use axum::middleware::Next;
use axum::response::IntoResponse;
use axum::response::Redirect;
use axum::response::Response;
use axum_extra::extract::cookie::Cookie;
use axum_extra::extract::cookie::SameSite;
use axum_extra::extract::CookieJar;

use super::flash;
use super::flash::FlashMessage;
use super::handlers::ApiError;
use crate::domain::session::models::Identity;
use crate::domain::session::models::SessionId;
use crate::domain::session::models::SessionToken;
use crate::domain::user::models::User;
use crate::inbound::http::router::AppState;

/// Cookie carrying the signed session token
pub const SESSION_COOKIE: &str = "portal_session";

/// Extension type holding the identity resolved for the current request
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub session_id: SessionId,
    pub user: User,
}

impl From<Identity> for AuthenticatedUser {
    fn from(identity: Identity) -> Self {
        Self {
            session_id: identity.session_id,
            user: identity.user,
        }
    }
}

pub fn session_cookie(token: SessionToken, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token.as_str().to_string()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .build()
}

pub fn session_cookie_removal() -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE).path("/").build()
}

/// Middleware that resolves the session cookie, once per request, into an
/// [`AuthenticatedUser`] extension. Requests without a live session pass through
/// anonymously.
pub async fn resolve_identity(
    State(state): State<AppState>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Response {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        let token = SessionToken::new(cookie.value());

        match state.session_service.current_identity(&token).await {
            Ok(Some(identity)) => {
                req.extensions_mut().insert(AuthenticatedUser::from(identity));
            }
            Ok(None) => {}
            Err(e) => return ApiError::from(e).into_response(),
        }
    }

    next.run(req).await
}

/// Route layer that sends anonymous requests to the login page, remembering
/// where they were headed.
pub async fn require_identity(
    State(state): State<AppState>,
    jar: CookieJar,
    req: Request,
    next: Next,
) -> Response {
    if req.extensions().get::<AuthenticatedUser>().is_some() {
        return next.run(req).await;
    }

    let target = req
        .uri()
        .path_and_query()
        .map(|path| path.as_str())
        .unwrap_or("/");
    let location = format!("/login?next={}", urlencoding::encode(target));
    tracing::debug!(target = %target, "Anonymous request redirected to login");

    let jar = flash::push(
        jar,
        &state.authenticator,
        [FlashMessage::info("Please log in to access this page.")],
    );

    (jar, Redirect::to(&location)).into_response()
}
