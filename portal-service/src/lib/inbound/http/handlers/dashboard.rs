use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Redirect;
use axum::response::Response;
use axum::Extension;
use axum_extra::extract::CookieJar;
use chrono::DateTime;
use chrono::Utc;
use serde::Serialize;

use super::Page;
use crate::domain::user::models::Role;
use crate::domain::user::models::User;
use crate::inbound::http::flash;
use crate::inbound::http::flash::FlashMessage;
use crate::inbound::http::middleware::AuthenticatedUser;
use crate::inbound::http::router::AppState;

/// Send the current user to the view for their role.
pub async fn dashboard(Extension(current): Extension<AuthenticatedUser>) -> Redirect {
    Redirect::to(view_path(current.user.role))
}

pub async fn patient_view(
    State(state): State<AppState>,
    Extension(current): Extension<AuthenticatedUser>,
    jar: CookieJar,
) -> Response {
    role_view(&state, current, jar, Role::Patient)
}

pub async fn doctor_view(
    State(state): State<AppState>,
    Extension(current): Extension<AuthenticatedUser>,
    jar: CookieJar,
) -> Response {
    role_view(&state, current, jar, Role::Doctor)
}

fn view_path(role: Role) -> &'static str {
    match role {
        Role::Doctor => "/doctor",
        Role::Patient => "/patient",
    }
}

fn role_view(state: &AppState, current: AuthenticatedUser, jar: CookieJar, required: Role) -> Response {
    if current.user.role != required {
        let notice = match required {
            Role::Patient => "Patients only.",
            Role::Doctor => "Doctors only.",
        };
        tracing::debug!(
            user_id = %current.user.id,
            required = ?required,
            "Role view refused"
        );
        let jar = flash::push(jar, &state.authenticator, [FlashMessage::warning(notice)]);
        return (jar, Redirect::to("/dashboard")).into_response();
    }

    let view = match required {
        Role::Patient => "patient",
        Role::Doctor => "doctor",
    };
    let (jar, flashes) = flash::take(jar, &state.authenticator);
    let page = ProfilePageData {
        user: (&current.user).into(),
    };

    (jar, Page::new(StatusCode::OK, view, flashes, page)).into_response()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProfilePageData {
    pub user: UserData,
}

/// Public profile of a user; never carries the password hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserData {
    pub id: i64,
    pub role: Role,
    pub first_name: String,
    pub last_name: String,
    pub username: String,
    pub email: String,
    pub profile_image_url: Option<String>,
    pub address: AddressData,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AddressData {
    pub line1: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
}

impl From<&User> for UserData {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.0,
            role: user.role,
            first_name: user.first_name.as_str().to_string(),
            last_name: user.last_name.as_str().to_string(),
            username: user.username.as_str().to_string(),
            email: user.email.as_str().to_string(),
            profile_image_url: user
                .profile_image
                .as_ref()
                .map(|image| format!("/uploads/{}", image.as_str())),
            address: AddressData {
                line1: user.address.line1().to_string(),
                city: user.address.city().to_string(),
                state: user.address.state().to_string(),
                postal_code: user.address.postal_code().to_string(),
            },
            created_at: user.created_at,
        }
    }
}
