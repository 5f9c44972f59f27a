/// Middleware module
///
/// Access control for protected routes.

mod jwt_middleware;

pub use jwt_middleware::JwtMiddleware;
