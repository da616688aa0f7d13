//! Token decoding.

mod jwt_decoder;

pub use jwt_decoder::JwtDecoder;
