use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;

/// Claims of the bearer tokens issued by the auth provider.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid, // Author ID
    pub exp: i64,  // Expiration timestamp
    #[serde(default)]
    pub iat: Option<i64>,
}

pub fn verify_access_token(token: &str, secret: &str) -> Result<Claims, AppError> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| {
        tracing::debug!("Token verification failed: {}", e);
        AppError::Unauthorized
    })?;

    Ok(token_data.claims)
}

/// Mints a token the way the auth provider does.
#[cfg(test)]
pub fn create_access_token(author_id: Uuid, secret: &str, expires_in_secs: i64) -> String {
    use chrono::{Duration, Utc};
    use jsonwebtoken::{encode, EncodingKey, Header};

    let now = Utc::now();
    let claims = Claims {
        sub: author_id,
        exp: (now + Duration::seconds(expires_in_secs)).timestamp(),
        iat: Some(now.timestamp()),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .expect("test token encodes")
}
