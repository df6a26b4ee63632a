//! Outbound email: template rendering and SMTP delivery.

pub mod email;
pub mod templates;

pub use email::{EmailError, EmailSender, SmtpEmailSender};
pub use templates::RenderedEmail;
