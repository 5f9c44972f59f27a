/// Token Codec
///
/// Signs and verifies HS256 tokens carrying `Claims`.
///
/// Parsing checks structure, algorithm and signature only. Expiry is left to
/// the caller so that each flow decides what an expired token means for it.

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{
    decode, decode_header, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde_json::error::Category;

use crate::auth::claims::Claims;
use crate::error::{AppError, TokenError};

const ALGORITHM: Algorithm = Algorithm::HS256;

#[derive(Clone)]
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenCodec {
    /// Build a codec around the process-wide secret.
    ///
    /// An empty secret is accepted; every token is then signed with an
    /// empty key.
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(ALGORITHM);
        validation.validate_exp = false;
        validation.leeway = 0;

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    /// Serialize and sign `claims`.
    pub fn issue(&self, claims: &Claims) -> Result<String, AppError> {
        encode(&Header::new(ALGORITHM), claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(format!("Token generation failed: {}", e)))
    }

    /// Decode `token` and verify its signature.
    ///
    /// # Errors
    /// - `InvalidSignature` if the signature does not match or the header
    ///   names any algorithm other than HS256
    /// - `Malformed` if the token cannot be decoded
    /// - `Other` for anything else the decoder reports
    pub fn parse(&self, token: &str) -> Result<Claims, TokenError> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                let error = if names_unsupported_algorithm(token) {
                    TokenError::InvalidSignature
                } else {
                    classify(e.kind())
                };
                tracing::debug!(error = %error, "Token rejected by codec");
                error
            })
    }
}

/// True when the header decodes as JSON but does not name an algorithm
/// this crate knows (`"alg": "none"`, an unknown name, or no `alg` at all).
fn names_unsupported_algorithm(token: &str) -> bool {
    match decode_header(token) {
        Ok(_) => false,
        Err(e) => matches!(e.kind(), ErrorKind::Json(inner) if inner.classify() == Category::Data),
    }
}

fn classify(kind: &ErrorKind) -> TokenError {
    match kind {
        ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => TokenError::InvalidSignature,
        ErrorKind::InvalidToken
        | ErrorKind::Base64(_)
        | ErrorKind::Json(_)
        | ErrorKind::Utf8(_)
        | ErrorKind::MissingRequiredClaim(_) => TokenError::Malformed(format!("{:?}", kind)),
        other => TokenError::Other(format!("{:?}", other)),
    }
}
