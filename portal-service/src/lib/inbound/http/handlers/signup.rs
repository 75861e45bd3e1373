use axum::extract::Multipart;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Redirect;
use axum::response::Response;
use axum::Extension;
use axum_extra::extract::CookieJar;
use serde::Serialize;

use super::ApiError;
use super::Page;
use crate::domain::user::models::EmailAddress;
use crate::domain::user::models::ImageUpload;
use crate::domain::user::models::Password;
use crate::domain::user::models::PersonName;
use crate::domain::user::models::PostalAddress;
use crate::domain::user::models::RegisterUserCommand;
use crate::domain::user::models::Role;
use crate::domain::user::models::Username;
use crate::inbound::http::flash;
use crate::inbound::http::flash::FlashMessage;
use crate::inbound::http::middleware::AuthenticatedUser;
use crate::inbound::http::router::AppState;
use crate::user::errors::FieldErrors;
use crate::user::errors::PasswordError;
use crate::user::errors::UserError;

pub async fn signup_page(
    State(state): State<AppState>,
    identity: Option<Extension<AuthenticatedUser>>,
    jar: CookieJar,
) -> Response {
    if identity.is_some() {
        return Redirect::to("/dashboard").into_response();
    }

    let (jar, flashes) = flash::take(jar, &state.authenticator);
    let page = SignupPageData {
        form: SignupFormState::default(),
        errors: FieldErrors::new(),
    };

    (jar, Page::new(StatusCode::OK, "signup", flashes, page)).into_response()
}

pub async fn signup(
    State(state): State<AppState>,
    identity: Option<Extension<AuthenticatedUser>>,
    jar: CookieJar,
    multipart: Multipart,
) -> Result<Response, ApiError> {
    if identity.is_some() {
        return Ok(Redirect::to("/dashboard").into_response());
    }

    let request = SignupRequest::read(multipart).await?;
    let form = SignupFormState::from(&request);

    let render = |jar: CookieJar,
                  status: StatusCode,
                  notice: Option<FlashMessage>,
                  errors: FieldErrors| {
        let (jar, mut flashes) = flash::take(jar, &state.authenticator);
        flashes.extend(notice);
        let page = SignupPageData {
            form: form.clone(),
            errors,
        };
        (jar, Page::new(status, "signup", flashes, page)).into_response()
    };

    let command = match request.try_into_command() {
        Ok(command) => command,
        Err(errors) => {
            return Ok(render(jar, StatusCode::UNPROCESSABLE_ENTITY, None, errors));
        }
    };

    let conflict = |field: &'static str, message: &str| {
        let mut errors = FieldErrors::new();
        errors.add(field, message);
        (Some(FlashMessage::danger(message)), errors)
    };

    match state.user_service.register(command).await {
        Ok(registration) => {
            let notices = registration
                .warnings
                .iter()
                .map(|warning| FlashMessage::warning(warning.to_string()))
                .chain([FlashMessage::success("Account created! Please log in.")]);
            let jar = flash::push(jar, &state.authenticator, notices);

            Ok((jar, Redirect::to("/login")).into_response())
        }
        Err(UserError::UsernameAlreadyExists(_)) => {
            let (notice, errors) = conflict("username", "Username is already taken.");
            Ok(render(jar, StatusCode::CONFLICT, notice, errors))
        }
        Err(UserError::EmailAlreadyExists(_)) => {
            let (notice, errors) = conflict("email", "Email is already registered.");
            Ok(render(jar, StatusCode::CONFLICT, notice, errors))
        }
        Err(e) => Err(ApiError::from(e)),
    }
}

/// Raw registration form as submitted (multipart)
#[derive(Debug, Default)]
pub struct SignupRequest {
    role: String,
    first_name: String,
    last_name: String,
    username: String,
    email: String,
    password: String,
    confirm_password: String,
    address_line1: String,
    city: String,
    state: String,
    postal_code: String,
    profile_image: Option<ImageUpload>,
}

impl SignupRequest {
    async fn read(mut multipart: Multipart) -> Result<Self, ApiError> {
        let mut request = Self::default();

        while let Some(field) = multipart.next_field().await? {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };

            if name == "profile_image" {
                let filename = field.file_name().unwrap_or_default().to_string();
                let bytes = field.bytes().await?;
                // Browsers send an empty part when no file was chosen
                if !filename.is_empty() && !bytes.is_empty() {
                    request.profile_image = Some(ImageUpload {
                        filename,
                        bytes: bytes.to_vec(),
                    });
                }
                continue;
            }

            let value = field.text().await?;
            let slot = match name.as_str() {
                "role" => &mut request.role,
                "first_name" => &mut request.first_name,
                "last_name" => &mut request.last_name,
                "username" => &mut request.username,
                "email" => &mut request.email,
                "password" => &mut request.password,
                "confirm_password" => &mut request.confirm_password,
                "address_line1" => &mut request.address_line1,
                "city" => &mut request.city,
                "state" => &mut request.state,
                "postal_code" => &mut request.postal_code,
                _ => continue,
            };
            *slot = value;
        }

        Ok(request)
    }

    /// Validate every field, collecting all errors rather than stopping at the first.
    fn try_into_command(self) -> Result<RegisterUserCommand, FieldErrors> {
        let mut errors = FieldErrors::new();

        let role = errors.check("role", Role::from_code(&self.role));
        let first_name = errors.check("first_name", PersonName::new(self.first_name));
        let last_name = errors.check("last_name", PersonName::new(self.last_name));
        let username = errors.check("username", Username::new(self.username));
        let email = errors.check("email", EmailAddress::new(self.email));
        let password = match Password::new(self.password, &self.confirm_password) {
            Ok(password) => Some(password),
            Err(e @ PasswordError::Mismatch) => {
                errors.add("confirm_password", e);
                None
            }
            Err(e) => {
                errors.add("password", e);
                None
            }
        };
        let line1 = errors.check(
            "address_line1",
            PostalAddress::validate_line1(self.address_line1),
        );
        let city = errors.check("city", PostalAddress::validate_city(self.city));
        let state = errors.check("state", PostalAddress::validate_state(self.state));
        let postal_code = errors.check(
            "postal_code",
            PostalAddress::validate_postal_code(self.postal_code),
        );

        let (
            Some(role),
            Some(first_name),
            Some(last_name),
            Some(username),
            Some(email),
            Some(password),
            Some(line1),
            Some(city),
            Some(state),
            Some(postal_code),
        ) = (
            role,
            first_name,
            last_name,
            username,
            email,
            password,
            line1,
            city,
            state,
            postal_code,
        )
        else {
            return Err(errors);
        };

        let address = match PostalAddress::new(line1, city, state, postal_code) {
            Ok(address) => address,
            Err(e) => {
                errors.add("address_line1", e);
                return Err(errors);
            }
        };

        Ok(RegisterUserCommand {
            role,
            first_name,
            last_name,
            username,
            email,
            password,
            address,
            profile_image: self.profile_image,
        })
    }
}

/// Submitted values echoed back on redisplay; never includes passwords.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SignupFormState {
    pub role: String,
    pub first_name: String,
    pub last_name: String,
    pub username: String,
    pub email: String,
    pub address_line1: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
}

impl From<&SignupRequest> for SignupFormState {
    fn from(request: &SignupRequest) -> Self {
        Self {
            role: request.role.clone(),
            first_name: request.first_name.clone(),
            last_name: request.last_name.clone(),
            username: request.username.clone(),
            email: request.email.clone(),
            address_line1: request.address_line1.clone(),
            city: request.city.clone(),
            state: request.state.clone(),
            postal_code: request.postal_code.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SignupPageData {
    pub form: SignupFormState,
    pub errors: FieldErrors,
}
