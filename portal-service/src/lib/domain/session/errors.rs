use thiserror::Error;

use crate::user::errors::UserError;

/// Error for session management operations
#[derive(Debug, Clone, Error)]
pub enum SessionError {
    #[error("Failed to sign session token: {0}")]
    TokenSigning(String),

    #[error("Failed to load session user: {0}")]
    UserLookup(#[from] UserError),

    #[error("Database error: {0}")]
    DatabaseError(String),
}
