pub mod session;
pub mod user;

pub use session::SqliteSessionRepository;
pub use user::SqliteUserRepository;
