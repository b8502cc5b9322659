//! Authentication: register, login, JWT, password reset.

mod handlers;
mod jwt;
mod reset;
mod service;

pub use handlers::{login, register};
pub use jwt::{Claims, JwtSecret};
pub use reset::{
    request_password_reset, reset_password, reset_password_with_path_token, verify_reset_token,
    RESET_REQUESTED_MESSAGE,
};
pub use service::AuthAppService;
