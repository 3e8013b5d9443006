pub mod account;
pub mod middleware;
pub mod password;
pub mod session;

pub use account::{login, logout, register, resolve_session, SignedIn};
pub use middleware::{request_token, MaybeSession, RequireSession};
pub use password::{hash_password, validate_password_strength, verify_password};
pub use session::{
    clear_session_cookie, generate_session_token, session_cookie, validate_username,
};
