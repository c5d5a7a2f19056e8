mod claims;
mod token;

use thiserror::Error;

use crate::config::ConfigError;

pub use claims::{ADMIN_ROLE, Claims, CurrentUser};
pub use token::{
    DEFAULT_SCHEME, RESERVED_CLAIMS, TokenDescriptor, TokenIssuer, TokenValidator,
    generate_signing_key,
};

#[derive(Debug, Error)]
pub enum AuthError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("token rejected: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),
    #[error("custom claim `{0}` collides with a registered claim")]
    ReservedClaim(String),
}
