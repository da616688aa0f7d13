//! Authentication domain types

mod event;
mod session;
mod types;

pub use event::AuthEvent;
pub use session::{Session, SessionStatus};
pub use types::{
    ApiMessage, AuthTokens, ChangePasswordRequest, ForgotPasswordRequest, LoginRequest, RegisterRequest,
    ResetPasswordRequest, TokenClaims, User,
};
