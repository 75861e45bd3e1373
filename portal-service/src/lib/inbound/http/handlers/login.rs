use axum::extract::Query;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Redirect;
use axum::response::Response;
use axum::Extension;
use axum::Form;
use axum_extra::extract::CookieJar;
use serde::Deserialize;
use serde::Serialize;

use super::ApiError;
use super::Page;
use crate::domain::user::models::Credentials;
use crate::domain::user::models::Password;
use crate::inbound::http::flash;
use crate::inbound::http::flash::FlashMessage;
use crate::inbound::http::middleware::session_cookie;
use crate::inbound::http::middleware::AuthenticatedUser;
use crate::inbound::http::router::AppState;
use crate::user::errors::FieldErrors;
use crate::user::errors::UserError;
use crate::user::errors::UsernameError;

const DEFAULT_LANDING: &str = "/dashboard";

pub async fn root() -> Redirect {
    Redirect::to("/login")
}

pub async fn login_page(
    State(state): State<AppState>,
    identity: Option<Extension<AuthenticatedUser>>,
    Query(query): Query<LoginQuery>,
    jar: CookieJar,
) -> Response {
    if identity.is_some() {
        return Redirect::to(DEFAULT_LANDING).into_response();
    }

    let (jar, flashes) = flash::take(jar, &state.authenticator);
    let page = LoginPageData {
        form: LoginFormState::default(),
        errors: FieldErrors::new(),
        next: query.next,
    };

    (jar, Page::new(StatusCode::OK, "login", flashes, page)).into_response()
}

pub async fn login(
    State(state): State<AppState>,
    identity: Option<Extension<AuthenticatedUser>>,
    Query(query): Query<LoginQuery>,
    jar: CookieJar,
    Form(body): Form<LoginRequestBody>,
) -> Result<Response, ApiError> {
    if identity.is_some() {
        return Ok(Redirect::to(DEFAULT_LANDING).into_response());
    }

    let form = LoginFormState {
        username: body.username.trim().to_string(),
    };

    let mut errors = FieldErrors::new();
    if form.username.is_empty() {
        errors.add("username", UsernameError::Missing);
    }
    let password = errors.check("password", Password::submitted(body.password));

    let render = |jar: CookieJar,
                  status: StatusCode,
                  notice: Option<FlashMessage>,
                  errors: FieldErrors| {
        let (jar, mut flashes) = flash::take(jar, &state.authenticator);
        flashes.extend(notice);
        let page = LoginPageData {
            form: form.clone(),
            errors,
            next: query.next.clone(),
        };
        (jar, Page::new(status, "login", flashes, page)).into_response()
    };

    let Some(password) = password.filter(|_| errors.is_empty()) else {
        return Ok(render(jar, StatusCode::UNPROCESSABLE_ENTITY, None, errors));
    };

    let credentials = Credentials {
        username: form.username.clone(),
        password,
    };

    match state.user_service.authenticate(credentials).await {
        Ok(user) => {
            let token = state.session_service.establish(user.id).await?;
            let jar = jar.add(session_cookie(token, state.secure_cookies));
            let target = local_redirect_target(query.next.as_deref());

            Ok((jar, Redirect::to(target)).into_response())
        }
        Err(UserError::InvalidCredentials) => Ok(render(
            jar,
            StatusCode::UNAUTHORIZED,
            Some(FlashMessage::danger("Invalid username or password.")),
            FieldErrors::new(),
        )),
        Err(e) => Err(ApiError::from(e)),
    }
}

/// Where to send a user after login: `next` if it is a plain local path.
fn local_redirect_target(next: Option<&str>) -> &str {
    match next {
        Some(target)
            if target.starts_with('/')
                && !target.starts_with("//")
                && target.chars().all(|c| c.is_ascii_graphic() && c != '\\') =>
        {
            target
        }
        _ => DEFAULT_LANDING,
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginQuery {
    next: Option<String>,
}

/// HTTP request body for logging in (urlencoded form)
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequestBody {
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoginFormState {
    pub username: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoginPageData {
    pub form: LoginFormState,
    pub errors: FieldErrors,
    pub next: Option<String>,
}
