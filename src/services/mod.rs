//! Business logic: reset tokens, mail, like toggle, post/comment input rules.

pub mod email_templates;
pub mod likes;
pub mod mail;
pub mod posts;
pub mod reset;

pub use likes::{toggle_like, LikeOutcome};
pub use mail::{mailer_from_config, HttpMailer, LogMailer, Mailer, OutgoingEmail};
pub use reset::{IssuedResetToken, ResetTokenService};
