use async_trait::async_trait;
use thiserror::Error;
use tracing::info;

use crate::config::EmailConfig;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub text: String,
}

#[derive(Debug, Error)]
pub enum EmailError {
    #[error("Invalid link base URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Email delivery failed: {0}")]
    Delivery(String),
}

/// Outgoing mail transport.
#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(&self, message: EmailMessage) -> Result<(), EmailError>;
}

/// Writes messages to the log instead of delivering them.
pub struct LogMailer;

#[async_trait]
impl EmailSender for LogMailer {
    async fn send(&self, message: EmailMessage) -> Result<(), EmailError> {
        info!(
            from = %message.from,
            to = %message.to,
            subject = %message.subject,
            "email: {}",
            message.text
        );
        Ok(())
    }
}

/// Builds the messages the auth flow sends.
pub struct EmailComposer<'a> {
    config: &'a EmailConfig,
}

impl<'a> EmailComposer<'a> {
    pub fn new(config: &'a EmailConfig) -> Self {
        Self { config }
    }

    /// `<app_url>/<path>?token=<token>`
    pub fn link(&self, path: &str, token: &str) -> Result<String, EmailError> {
        let mut url = url::Url::parse(&self.config.app_url)?.join(path)?;
        url.query_pairs_mut().append_pair("token", token);
        Ok(url.into())
    }

    pub fn reset_password(&self, to: &str, token: &str) -> Result<EmailMessage, EmailError> {
        let link = self.link("reset-password", token)?;
        Ok(EmailMessage {
            from: self.config.from.clone(),
            to: to.to_string(),
            subject: "Reset password".to_string(),
            text: format!(
                "Dear user,\nTo reset your password, click on this link: {}\n\
                 If you did not request any password resets, then ignore this email.",
                link
            ),
        })
    }

    pub fn verify_email(&self, to: &str, token: &str) -> Result<EmailMessage, EmailError> {
        let link = self.link("verify-email", token)?;
        Ok(EmailMessage {
            from: self.config.from.clone(),
            to: to.to_string(),
            subject: "Email Verification".to_string(),
            text: format!(
                "Dear user,\nTo verify your email, click on this link: {}\n\
                 If you did not create an account, then ignore this email.",
                link
            ),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(app_url: &str) -> EmailConfig {
        EmailConfig {
            from: "noreply@example.com".to_string(),
            app_url: app_url.to_string(),
        }
    }

    #[test]
    fn builds_links_with_encoded_token() {
        let config = config("https://app.example.com/");
        let composer = EmailComposer::new(&config);
        assert_eq!(
            composer.link("reset-password", "a.b+c").unwrap(),
            "https://app.example.com/reset-password?token=a.b%2Bc"
        );
    }

    #[test]
    fn reset_message_contains_link() {
        let config = config("http://localhost:3000");
        let msg = EmailComposer::new(&config).reset_password("ada@example.com", "tok").unwrap();
        assert_eq!(msg.to, "ada@example.com");
        assert_eq!(msg.subject, "Reset password");
        assert!(msg.text.contains("http://localhost:3000/reset-password?token=tok"));
    }

    #[test]
    fn rejects_relative_base() {
        let config = config("not a url");
        assert!(EmailComposer::new(&config).verify_email("a@b.co", "t").is_err());
    }
}
