//! Outbound integrations: transactional email and source-control activity.

pub mod github;
pub mod mailer;
pub mod templates;

pub use github::GithubClient;
pub use mailer::{LogMailer, ResendMailer};
