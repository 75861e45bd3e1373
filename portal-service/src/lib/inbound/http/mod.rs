pub mod flash;
pub mod handlers;
pub mod middleware;
pub mod router;
