use axum::extract::State;
use axum::response::IntoResponse;
use axum::response::Redirect;
use axum::response::Response;
use axum::Extension;
use axum_extra::extract::CookieJar;

use super::ApiError;
use crate::inbound::http::flash;
use crate::inbound::http::flash::FlashMessage;
use crate::inbound::http::middleware::session_cookie_removal;
use crate::inbound::http::middleware::AuthenticatedUser;
use crate::inbound::http::router::AppState;

pub async fn logout(
    State(state): State<AppState>,
    Extension(current): Extension<AuthenticatedUser>,
    jar: CookieJar,
) -> Result<Response, ApiError> {
    state
        .session_service
        .terminate(&current.session_id)
        .await?;

    let jar = jar.remove(session_cookie_removal());
    let jar = flash::push(jar, &state.authenticator, [FlashMessage::info("Logged out.")]);

    Ok((jar, Redirect::to("/login")).into_response())
}
