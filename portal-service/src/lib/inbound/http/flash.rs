use auth::Authenticator;
use axum_extra::extract::cookie::Cookie;
use axum_extra::extract::cookie::SameSite;
use axum_extra::extract::CookieJar;
use serde::Deserialize;
use serde::Serialize;

/// Cookie carrying pending flash messages as a signed token.
pub const FLASH_COOKIE: &str = "portal_flash";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashLevel {
    Success,
    Info,
    Warning,
    Danger,
}

/// One-shot notice shown on the next rendered page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlashMessage {
    pub level: FlashLevel,
    pub message: String,
}

impl FlashMessage {
    pub fn new(level: FlashLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(FlashLevel::Success, message)
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(FlashLevel::Info, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(FlashLevel::Warning, message)
    }

    pub fn danger(message: impl Into<String>) -> Self {
        Self::new(FlashLevel::Danger, message)
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct PendingFlashes {
    flashes: Vec<FlashMessage>,
}

fn pending(jar: &CookieJar, authenticator: &Authenticator) -> Vec<FlashMessage> {
    let Some(cookie) = jar.get(FLASH_COOKIE) else {
        return Vec::new();
    };

    match authenticator.validate_token::<PendingFlashes>(cookie.value()) {
        Ok(pending) => pending.flashes,
        Err(e) => {
            tracing::debug!(error = %e, "Discarding unreadable flash cookie");
            Vec::new()
        }
    }
}

/// Queue messages for the next page, keeping any already pending.
pub fn push(
    jar: CookieJar,
    authenticator: &Authenticator,
    messages: impl IntoIterator<Item = FlashMessage>,
) -> CookieJar {
    let mut flashes = pending(&jar, authenticator);
    flashes.extend(messages);

    match authenticator.issue_token(&PendingFlashes { flashes }) {
        Ok(token) => jar.add(
            Cookie::build((FLASH_COOKIE, token))
                .path("/")
                .http_only(true)
                .same_site(SameSite::Lax),
        ),
        Err(e) => {
            tracing::error!(error = %e, "Failed to sign flash messages");
            jar
        }
    }
}

/// Consume pending messages and clear the cookie.
pub fn take(jar: CookieJar, authenticator: &Authenticator) -> (CookieJar, Vec<FlashMessage>) {
    if jar.get(FLASH_COOKIE).is_none() {
        return (jar, Vec::new());
    }

    let flashes = pending(&jar, authenticator);
    (jar.remove(Cookie::build(FLASH_COOKIE).path("/")), flashes)
}
