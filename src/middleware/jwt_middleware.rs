/// Access-Control Middleware
///
/// Gate in front of protected routes. A request reaches the wrapped service
/// only with `Authorization: Bearer <token>` carrying a correctly signed,
/// unexpired token; the token's user id is then bound to the request as an
/// `AuthenticatedUser` for handlers to authorize against.

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header::AUTHORIZATION,
    Error, HttpMessage,
};
use futures::future::LocalBoxFuture;
use std::rc::Rc;

use crate::auth::{AuthenticatedUser, TokenCodec};
use crate::error::AppError;

const BEARER_PREFIX: &str = "Bearer ";

pub struct JwtMiddleware {
    codec: TokenCodec,
}

impl JwtMiddleware {
    pub fn new(codec: TokenCodec) -> Self {
        Self { codec }
    }
}

impl<S, B> Transform<S, ServiceRequest> for JwtMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = JwtMiddlewareService<S>;
    type Future = std::future::Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        std::future::ready(Ok(JwtMiddlewareService {
            service: Rc::new(service),
            codec: self.codec.clone(),
        }))
    }
}

pub struct JwtMiddlewareService<S> {
    service: Rc<S>,
    codec: TokenCodec,
}

impl<S, B> Service<ServiceRequest> for JwtMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        match authorize(&req, &self.codec) {
            Ok(user) => {
                req.extensions_mut().insert(user);
                tracing::debug!(user_id = user.user_id, path = %req.path(), "Request authorized");

                let service = self.service.clone();
                Box::pin(async move { service.call(req).await })
            }
            Err(e) => Box::pin(async move { Err(e.into()) }),
        }
    }
}

/// Authenticate one request from its headers alone.
///
/// # Errors
/// - `Unauthorized` if there is no `Authorization` header or the token expired
/// - `BadRequest` if the header is not `Bearer <token>`
/// - `Token(..)` if the token fails to parse or verify
fn authorize(req: &ServiceRequest, codec: &TokenCodec) -> Result<AuthenticatedUser, AppError> {
    let header = req
        .headers()
        .get(AUTHORIZATION)
        .ok_or_else(|| AppError::Unauthorized("Unauthorized".to_string()))?;

    let token = header
        .to_str()
        .ok()
        .and_then(|value| value.strip_prefix(BEARER_PREFIX))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| AppError::BadRequest("Wrong Authorization header format".to_string()))?;

    let claims = codec.parse(token)?;

    if claims.is_expired() {
        return Err(AppError::Unauthorized("Token expired".to_string()));
    }

    Ok(AuthenticatedUser {
        user_id: claims.user_id,
    })
}
