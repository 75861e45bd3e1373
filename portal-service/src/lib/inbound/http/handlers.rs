use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::Json;
use serde::Serialize;

use super::flash::FlashMessage;
use crate::domain::session::errors::SessionError;
use crate::user::errors::UserError;

pub mod dashboard;
pub mod login;
pub mod logout;
pub mod signup;

/// The only detail a client ever sees about an internal failure.
pub const GENERIC_FAILURE: &str = "Something went wrong. Please try again later.";

/// A page document: view name, pending flashes and view-specific content.
#[derive(Debug, Clone)]
pub struct Page<T: Serialize + PartialEq>(StatusCode, Json<ApiResponseBody<PageData<T>>>);

impl<T> PartialEq for Page<T>
where
    T: Serialize + PartialEq,
{
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0 && self.1 .0 == other.1 .0
    }
}

impl<T: Serialize + PartialEq> Page<T> {
    pub fn new(
        status: StatusCode,
        view: &'static str,
        flashes: Vec<FlashMessage>,
        content: T,
    ) -> Self {
        Page(
            status,
            Json(ApiResponseBody::new(
                status,
                PageData {
                    view,
                    flashes,
                    content,
                },
            )),
        )
    }
}

impl<T: Serialize + PartialEq> IntoResponse for Page<T> {
    fn into_response(self) -> Response {
        (self.0, self.1).into_response()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageData<T: Serialize + PartialEq> {
    view: &'static str,
    flashes: Vec<FlashMessage>,
    #[serde(flatten)]
    content: T,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    InternalServerError(String),
    BadRequest(String),
    PayloadTooLarge(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::InternalServerError(detail) => {
                tracing::error!(error = %detail, "Request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, GENERIC_FAILURE.to_string())
            }
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::PayloadTooLarge(msg) => (StatusCode::PAYLOAD_TOO_LARGE, msg),
        };

        (status, Json(ApiResponseBody::new_error(status, message))).into_response()
    }
}

impl From<UserError> for ApiError {
    fn from(err: UserError) -> Self {
        // Conflicts and bad credentials are rendered by the handlers themselves;
        // anything reaching this point is a fault on our side.
        ApiError::InternalServerError(err.to_string())
    }
}

impl From<SessionError> for ApiError {
    fn from(err: SessionError) -> Self {
        ApiError::InternalServerError(err.to_string())
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::PayloadTooLarge(err.body_text())
        } else {
            ApiError::BadRequest(err.body_text())
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiResponseBody<T: Serialize + PartialEq> {
    status_code: u16,
    data: T,
}

impl<T: Serialize + PartialEq> ApiResponseBody<T> {
    pub fn new(status_code: StatusCode, data: T) -> Self {
        Self {
            status_code: status_code.as_u16(),
            data,
        }
    }
}

impl ApiResponseBody<ApiErrorData> {
    pub fn new_error(status_code: StatusCode, message: String) -> Self {
        Self {
            status_code: status_code.as_u16(),
            data: ApiErrorData { message },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiErrorData {
    pub message: String,
}
