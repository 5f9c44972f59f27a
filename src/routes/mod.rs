mod auth;
mod health_check;
mod users;

pub use auth::{login, refresh, REFRESH_HEADER};
pub use health_check::health_check;
pub use users::{current_user, register, RegisterRequest};
