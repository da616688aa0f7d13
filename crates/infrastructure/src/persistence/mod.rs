//! File-backed persistence.

mod file_session_store;

pub use file_session_store::{FileSessionStore, REDIRECT_FILE, SESSION_FILE};
