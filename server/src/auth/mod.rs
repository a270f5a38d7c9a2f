pub mod admin;
pub mod claims;
pub mod credentials;
pub mod preferences;
pub mod token;

pub use self::claims::{ClaimsSource, ResolvedClaims, SessionState, load_session};
pub use self::token::TokenCodec;
