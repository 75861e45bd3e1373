use std::fmt;
use std::str::FromStr;

use chrono::DateTime;
use chrono::Utc;
use serde::Serialize;
use unicode_normalization::UnicodeNormalization;

use crate::user::errors::EmailError;
use crate::user::errors::PasswordError;
use crate::user::errors::RoleError;
use crate::user::errors::TextFieldError;
use crate::user::errors::UsernameError;

/// User aggregate entity.
///
/// Represents a registered patient or doctor. Created once by registration and
/// never mutated afterwards.
#[derive(Debug, Clone)]
pub struct User {
    pub id: UserId,
    pub role: Role,
    pub first_name: PersonName,
    pub last_name: PersonName,
    pub username: Username,
    pub email: EmailAddress,
    pub password_hash: String,
    pub profile_image: Option<ImageFilename>,
    pub address: PostalAddress,
    pub created_at: DateTime<Utc>,
}

/// A user that has passed validation and hashing but has no identity yet.
///
/// Storage assigns the [`UserId`] on insert.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub role: Role,
    pub first_name: PersonName,
    pub last_name: PersonName,
    pub username: Username,
    pub email: EmailAddress,
    pub password_hash: String,
    pub profile_image: Option<ImageFilename>,
    pub address: PostalAddress,
    pub created_at: DateTime<Utc>,
}

impl NewUser {
    pub fn with_id(self, id: UserId) -> User {
        User {
            id,
            role: self.role,
            first_name: self.first_name,
            last_name: self.last_name,
            username: self.username,
            email: self.email,
            password_hash: self.password_hash,
            profile_image: self.profile_image,
            address: self.address,
            created_at: self.created_at,
        }
    }
}

/// User unique identifier type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UserId(pub i64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for UserId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(UserId)
    }
}

/// Access class deciding which dashboard a user is routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Patient,
    Doctor,
}

impl Role {
    /// Parse the single-letter storage/form code (`P` or `D`).
    pub fn from_code(code: &str) -> Result<Self, RoleError> {
        match code.trim() {
            "" => Err(RoleError::Missing),
            "P" => Ok(Role::Patient),
            "D" => Ok(Role::Doctor),
            other => Err(RoleError::Unknown(other.to_string())),
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Role::Patient => "P",
            Role::Doctor => "D",
        }
    }
}

/// Username value type
///
/// 3-80 characters from `[A-Za-z0-9_.-]`, surrounding whitespace trimmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Username(String);

impl Username {
    const MIN_LENGTH: usize = 3;
    const MAX_LENGTH: usize = 80;

    /// Create a new valid username.
    ///
    /// # Errors
    /// * `Missing` - Blank input
    /// * `InvalidLength` - Outside 3-80 characters
    /// * `InvalidCharacters` - Anything other than ASCII letters, digits, `.`, `_` or `-`
    pub fn new(username: String) -> Result<Self, UsernameError> {
        let username = username.trim();
        if username.is_empty() {
            return Err(UsernameError::Missing);
        }

        let length = username.chars().count();
        if !(Self::MIN_LENGTH..=Self::MAX_LENGTH).contains(&length) {
            return Err(UsernameError::InvalidLength {
                min: Self::MIN_LENGTH,
                max: Self::MAX_LENGTH,
            });
        }

        if !username
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
        {
            return Err(UsernameError::InvalidCharacters);
        }

        Ok(Self(username.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Email address type
///
/// Trimmed and lower-cased, at most 120 characters, RFC 5322 syntax.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailAddress(String);

impl EmailAddress {
    const MAX_LENGTH: usize = 120;

    /// Create a new validated email address.
    ///
    /// # Errors
    /// * `Missing` - Blank input
    /// * `TooLong` - Longer than 120 characters
    /// * `InvalidFormat` - Not a syntactically valid address
    pub fn new(email: String) -> Result<Self, EmailError> {
        let email = email.trim().to_lowercase();
        if email.is_empty() {
            return Err(EmailError::Missing);
        }
        if email.chars().count() > Self::MAX_LENGTH {
            return Err(EmailError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }

        email_address::EmailAddress::from_str(&email)
            .map(|_| EmailAddress(email))
            .map_err(|_| EmailError::InvalidFormat)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A plaintext password held only long enough to be hashed or verified.
///
/// `Debug` never prints the contents.
#[derive(Clone)]
pub struct Password(String);

impl Password {
    const MIN_LENGTH: usize = 6;

    /// Validate a new password and its confirmation.
    ///
    /// # Errors
    /// * `Missing` - Empty password
    /// * `TooShort` - Fewer than 6 characters
    /// * `Mismatch` - Confirmation differs
    pub fn new(password: String, confirmation: &str) -> Result<Self, PasswordError> {
        if password.is_empty() {
            return Err(PasswordError::Missing);
        }
        if password.chars().count() < Self::MIN_LENGTH {
            return Err(PasswordError::TooShort {
                min: Self::MIN_LENGTH,
            });
        }
        if password != confirmation {
            return Err(PasswordError::Mismatch);
        }
        Ok(Self(password))
    }

    /// Wrap a password submitted for login; no policy applies beyond presence.
    pub fn submitted(password: String) -> Result<Self, PasswordError> {
        if password.is_empty() {
            return Err(PasswordError::Missing);
        }
        Ok(Self(password))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Password(<redacted>)")
    }
}

/// Required, trimmed free text with a length window.
fn bounded_text(value: String, min: usize, max: usize) -> Result<String, TextFieldError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(TextFieldError::Missing);
    }
    let length = value.chars().count();
    if length < min || length > max {
        return Err(TextFieldError::InvalidLength { min, max });
    }
    Ok(value.to_string())
}

/// First or last name, 1-80 characters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonName(String);

impl PersonName {
    pub fn new(name: String) -> Result<Self, TextFieldError> {
        bounded_text(name, 1, 80).map(Self)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Postal address of a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostalAddress {
    line1: String,
    city: String,
    state: String,
    postal_code: String,
}

impl PostalAddress {
    pub fn validate_line1(line1: String) -> Result<String, TextFieldError> {
        bounded_text(line1, 1, 255)
    }

    pub fn validate_city(city: String) -> Result<String, TextFieldError> {
        bounded_text(city, 1, 80)
    }

    pub fn validate_state(state: String) -> Result<String, TextFieldError> {
        bounded_text(state, 1, 80)
    }

    pub fn validate_postal_code(postal_code: String) -> Result<String, TextFieldError> {
        bounded_text(postal_code, 4, 12)
    }

    /// Build an address, validating every part.
    ///
    /// # Errors
    /// * `TextFieldError` - The first part failing validation
    pub fn new(
        line1: String,
        city: String,
        state: String,
        postal_code: String,
    ) -> Result<Self, TextFieldError> {
        Ok(Self {
            line1: Self::validate_line1(line1)?,
            city: Self::validate_city(city)?,
            state: Self::validate_state(state)?,
            postal_code: Self::validate_postal_code(postal_code)?,
        })
    }

    pub fn line1(&self) -> &str {
        &self.line1
    }

    pub fn city(&self) -> &str {
        &self.city
    }

    pub fn state(&self) -> &str {
        &self.state
    }

    pub fn postal_code(&self) -> &str {
        &self.postal_code
    }
}

/// Generated name of a stored profile image, relative to the upload area.
///
/// Always a single path component made of `[A-Za-z0-9_.-]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFilename(String);

impl ImageFilename {
    /// Derive a collision-resistant storage name from a client-supplied filename.
    ///
    /// The stem is sanitized, then the upload time and a random nonce are appended
    /// ahead of the (already validated, lower-cased) extension.
    pub fn generate(original: &str, extension: &str, uploaded_at: DateTime<Utc>) -> Self {
        let stem = original
            .rsplit_once('.')
            .map(|(stem, _)| stem)
            .unwrap_or(original);
        let mut stem = secure_filename(stem);
        if stem.is_empty() {
            stem = "image".to_string();
        }
        let nonce = uuid::Uuid::new_v4().simple().to_string();

        Self(format!(
            "{}_{}_{}.{}",
            stem,
            uploaded_at.timestamp(),
            &nonce[..8],
            extension
        ))
    }

    /// Re-validate a name read back from storage.
    pub fn from_stored(name: String) -> Option<Self> {
        if !name.is_empty() && secure_filename(&name) == name {
            Some(Self(name))
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Reduce an arbitrary client filename to a safe single path component.
///
/// Characters are NFKD-folded so accented letters keep their ASCII base. Path
/// separators become spaces, whitespace runs become `_`, anything outside
/// `[A-Za-z0-9_.-]` is dropped and leading dots/underscores are stripped.
pub fn secure_filename(filename: &str) -> String {
    let flattened: String = filename
        .nfkd()
        .map(|c| if c == '/' || c == '\\' { ' ' } else { c })
        .collect();

    let joined = flattened.split_whitespace().collect::<Vec<_>>().join("_");

    joined
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
        .collect::<String>()
        .trim_start_matches(['.', '_'])
        .trim_end_matches(['.', '_'])
        .to_string()
}

/// Which image types registration accepts.
#[derive(Debug, Clone)]
pub struct ImagePolicy {
    allowed_extensions: Vec<String>,
}

impl ImagePolicy {
    pub fn new(allowed_extensions: impl IntoIterator<Item = impl AsRef<str>>) -> Self {
        Self {
            allowed_extensions: allowed_extensions
                .into_iter()
                .map(|ext| ext.as_ref().trim().trim_start_matches('.').to_lowercase())
                .filter(|ext| !ext.is_empty())
                .collect(),
        }
    }

    /// Lower-cased extension of `filename` if it is on the allow-list.
    pub fn accepted_extension(&self, filename: &str) -> Option<String> {
        let (_, extension) = filename.rsplit_once('.')?;
        let extension = extension.to_lowercase();
        self.allowed_extensions
            .contains(&extension)
            .then_some(extension)
    }

    pub fn allowed_extensions(&self) -> &[String] {
        &self.allowed_extensions
    }
}

/// Raw image upload as received from the client.
#[derive(Clone)]
pub struct ImageUpload {
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl fmt::Debug for ImageUpload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageUpload")
            .field("filename", &self.filename)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Command to register a new user with validated domain types
#[derive(Debug)]
pub struct RegisterUserCommand {
    pub role: Role,
    pub first_name: PersonName,
    pub last_name: PersonName,
    pub username: Username,
    pub email: EmailAddress,
    pub password: Password,
    pub address: PostalAddress,
    pub profile_image: Option<ImageUpload>,
}

/// Non-fatal problems noticed while registering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrationWarning {
    UnsupportedImageType { allowed: Vec<String> },
}

impl fmt::Display for RegistrationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistrationWarning::UnsupportedImageType { allowed } => {
                write!(f, "Unsupported image type. Allowed: {}", allowed.join(", "))
            }
        }
    }
}

/// Outcome of a successful registration.
#[derive(Debug)]
pub struct Registration {
    pub user: User,
    pub warnings: Vec<RegistrationWarning>,
}

/// Credentials submitted to the login form.
#[derive(Debug)]
pub struct Credentials {
    pub username: String,
    pub password: Password,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_username_accepts_allowed_charset() {
        let username = Username::new("  dr.jane_doe-2  ".to_string()).unwrap();
        assert_eq!(username.as_str(), "dr.jane_doe-2");
    }

    #[test]
    fn test_username_length_bounds() {
        assert_eq!(
            Username::new("ab".to_string()),
            Err(UsernameError::InvalidLength { min: 3, max: 80 })
        );
        assert!(Username::new("a".repeat(80)).is_ok());
        assert!(Username::new("a".repeat(81)).is_err());
        assert_eq!(Username::new("   ".to_string()), Err(UsernameError::Missing));
    }

    #[test]
    fn test_username_rejects_other_characters() {
        assert_eq!(
            Username::new("jane doe".to_string()),
            Err(UsernameError::InvalidCharacters)
        );
        assert_eq!(
            Username::new("jané".to_string()),
            Err(UsernameError::InvalidCharacters)
        );
    }

    #[test]
    fn test_email_is_lowercased_and_trimmed() {
        let email = EmailAddress::new(" Jane.Doe@Example.COM ".to_string()).unwrap();
        assert_eq!(email.as_str(), "jane.doe@example.com");
    }

    #[test]
    fn test_email_rejects_invalid_and_long() {
        assert_eq!(
            EmailAddress::new("not-an-email".to_string()),
            Err(EmailError::InvalidFormat)
        );
        let long = format!("{}@example.com", "a".repeat(110));
        assert_eq!(
            EmailAddress::new(long),
            Err(EmailError::TooLong { max: 120 })
        );
    }

    #[test]
    fn test_password_rules() {
        assert!(Password::new("secret1".to_string(), "secret1").is_ok());
        assert_eq!(
            Password::new("short".to_string(), "short").err(),
            Some(PasswordError::TooShort { min: 6 })
        );
        assert_eq!(
            Password::new("secret1".to_string(), "secret2").err(),
            Some(PasswordError::Mismatch)
        );
    }

    #[test]
    fn test_password_debug_is_redacted() {
        let password = Password::new("hunter22".to_string(), "hunter22").unwrap();
        assert!(!format!("{:?}", password).contains("hunter22"));
    }

    #[test]
    fn test_role_codes() {
        assert_eq!(Role::from_code("P"), Ok(Role::Patient));
        assert_eq!(Role::from_code("D"), Ok(Role::Doctor));
        assert_eq!(Role::from_code(""), Err(RoleError::Missing));
        assert_eq!(
            Role::from_code("X"),
            Err(RoleError::Unknown("X".to_string()))
        );
        assert_eq!(Role::Doctor.code(), "D");
    }

    #[test]
    fn test_postal_address_bounds() {
        assert!(PostalAddress::new(
            "1 Main St".to_string(),
            "Springfield".to_string(),
            "IL".to_string(),
            "62701".to_string()
        )
        .is_ok());
        assert_eq!(
            PostalAddress::validate_postal_code("123".to_string()),
            Err(TextFieldError::InvalidLength { min: 4, max: 12 })
        );
        assert_eq!(
            PostalAddress::validate_city(" ".to_string()),
            Err(TextFieldError::Missing)
        );
    }

    #[test]
    fn test_secure_filename() {
        assert_eq!(secure_filename("My cool photo"), "My_cool_photo");
        assert_eq!(secure_filename("../../etc/passwd"), "etc_passwd");
        assert_eq!(secure_filename("C:\\Users\\me\\face"), "C_Users_me_face");
        assert_eq!(secure_filename("..hidden"), "hidden");
        assert_eq!(secure_filename("ünïcödé"), "unicode");
        assert_eq!(secure_filename("ﬁlé naïve"), "file_naive");
        assert_eq!(secure_filename("日本"), "");
        assert_eq!(secure_filename("***"), "");
    }

    #[test]
    fn test_image_policy_is_case_insensitive() {
        let policy = ImagePolicy::new(["png", "JPG", ".gif"]);

        assert_eq!(policy.accepted_extension("photo.PNG"), Some("png".to_string()));
        assert_eq!(policy.accepted_extension("photo.jpg"), Some("jpg".to_string()));
        assert_eq!(policy.accepted_extension("anim.gif"), Some("gif".to_string()));
        assert_eq!(policy.accepted_extension("photo.EXE"), None);
        assert_eq!(policy.accepted_extension("no_extension"), None);
    }

    #[test]
    fn test_generated_image_filename_shape() {
        let uploaded_at = DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap();
        let name = ImageFilename::generate("../my photo.PNG", "png", uploaded_at);

        assert!(name.as_str().starts_with("my_photo_1700000000_"));
        assert!(name.as_str().ends_with(".png"));
        assert!(!name.as_str().contains('/'));
        assert_eq!(ImageFilename::from_stored(name.as_str().to_string()), Some(name));
    }

    #[test]
    fn test_generated_image_filenames_do_not_collide() {
        let uploaded_at = Utc::now();
        let first = ImageFilename::generate("photo.png", "png", uploaded_at);
        let second = ImageFilename::generate("photo.png", "png", uploaded_at);

        assert_ne!(first, second);
    }

    #[test]
    fn test_generated_image_filename_falls_back_for_empty_stem() {
        let name = ImageFilename::generate("***.gif", "gif", Utc::now());
        assert!(name.as_str().starts_with("image_"));
    }

    #[test]
    fn test_stored_image_filename_rejects_paths() {
        assert_eq!(ImageFilename::from_stored("../secret.png".to_string()), None);
        assert_eq!(ImageFilename::from_stored(String::new()), None);
    }

    #[test]
    fn test_unsupported_image_warning_message() {
        let warning = RegistrationWarning::UnsupportedImageType {
            allowed: vec!["png".into(), "jpg".into(), "jpeg".into(), "gif".into()],
        };
        assert_eq!(
            warning.to_string(),
            "Unsupported image type. Allowed: png, jpg, jpeg, gif"
        );
    }
}
