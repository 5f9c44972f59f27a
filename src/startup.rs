use actix_web::dev::Server;
use actix_web::{middleware::Logger, web, App, HttpServer};
use std::net::TcpListener;
use std::sync::Arc;

use crate::auth::AuthContext;
use crate::error::AppError;
use crate::middleware::JwtMiddleware;
use crate::routes::{current_user, health_check, login, refresh, register};
use crate::store::CredentialStore;

/// Start serving on `listener`.
///
/// `auth` is built once by the caller and shared read-only by every worker.
pub fn run(
    listener: TcpListener,
    store: Arc<dyn CredentialStore>,
    auth: AuthContext,
) -> Result<Server, std::io::Error> {
    let store: web::Data<dyn CredentialStore> = web::Data::from(store);
    let codec = auth.codec().clone();
    let auth = web::Data::new(auth);

    let server = HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .app_data(store.clone())
            .app_data(auth.clone())
            .app_data(web::JsonConfig::default().error_handler(|err, _req| {
                AppError::BadRequest(format!("Invalid payload: {}", err)).into()
            }))
            // Public routes
            .route("/health_check", web::get().to(health_check))
            .route("/users", web::post().to(register))
            .route("/api/token", web::post().to(login))
            .route("/api/refresh", web::get().to(refresh))
            // Protected routes
            .service(
                web::scope("/api/users")
                    .wrap(JwtMiddleware::new(codec.clone()))
                    .route("/me", web::get().to(current_user)),
            )
    })
    .listen(listener)?
    .run();

    Ok(server)
}
