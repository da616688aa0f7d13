//! API paths, relative to the configured base URL.

/// `POST` credentials, returns a token pair.
pub const LOGIN: &str = "/auth/login";
/// `POST` a new account.
pub const REGISTER: &str = "/auth/register";
/// `PUT /auth/confirmation/{email}?code=`.
pub const CONFIRMATION: &str = "/auth/confirmation";
/// `PUT` an email to receive a reset link.
pub const FORGOT_PASSWORD: &str = "/auth/forgot-password";
/// `PUT /auth/reset-password/{token}`.
pub const RESET_PASSWORD: &str = "/auth/reset-password";
/// `PUT` old and new password.
pub const CHANGE_PASSWORD: &str = "/auth/change-password";
/// `POST` with the refresh token as bearer.
pub const REFRESH: &str = "/auth/refresh";
/// `POST` to end the server-side session.
pub const LOGOUT: &str = "/auth/logout";
/// `GET` the current user.
pub const ME: &str = "/auth/me";
/// `POST` origin/destination, returns two routes.
pub const CALCULATE_ROUTES: &str = "/routes/calculate";
/// `GET` search history, `DELETE /searches/{id}`.
pub const SEARCHES: &str = "/searches";
/// `GET` search history statistics.
pub const SEARCH_STATS: &str = "/searches/stats";
/// `GET` full-text search.
pub const SEARCH: &str = "/search";
