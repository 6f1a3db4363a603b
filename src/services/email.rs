//! Email notifications
//!
//! Moderation results and welcome mail over SMTP. Failures are logged and
//! never propagate into the triggering operation.

use anyhow::{anyhow, Result};
use lettre::{
    message::header::ContentType,
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};

use crate::config::EmailConfig;
use crate::models::{AiModule, User};

/// Email service for outbound notifications
pub struct EmailService {
    config: EmailConfig,
}

impl EmailService {
    pub fn new(config: EmailConfig) -> Self {
        Self { config }
    }

    /// Notify the creator that their module was approved.
    pub async fn notify_module_approved(&self, user: &User, module: &AiModule) {
        let subject = format!("[{}] Your AI module has been approved", self.config.site_name);
        let body = format!(
            "Hello {},\n\nYour module \"{}\" has been approved and is now publicly visible:\n{}/modules/{}\n\n{} team",
            display_name(user),
            module.name,
            self.config.site_url,
            module.slug,
            self.config.site_name,
        );
        self.send_logged(user, &subject, &body).await;
    }

    /// Notify the creator that their module was rejected, with the
    /// moderator's comment.
    pub async fn notify_module_rejected(&self, user: &User, module: &AiModule, comment: &str) {
        let subject = format!("[{}] Your AI module has been rejected", self.config.site_name);
        let body = format!(
            "Hello {},\n\nYour module \"{}\" was rejected by a moderator.\n\nReason: {}\n\nYou can edit the module and submit it again.\n\n{} team",
            display_name(user),
            module.name,
            comment,
            self.config.site_name,
        );
        self.send_logged(user, &subject, &body).await;
    }

    /// Welcome mail after registration.
    pub async fn send_welcome(&self, user: &User) {
        let subject = format!("Welcome to {}", self.config.site_name);
        let body = format!(
            "Hello {},\n\nYour account has been created. You can now register AI modules at {}.\n\n{} team",
            display_name(user),
            self.config.site_url,
            self.config.site_name,
        );
        self.send_logged(user, &subject, &body).await;
    }

    async fn send_logged(&self, user: &User, subject: &str, body: &str) {
        if user.email.is_empty() {
            tracing::warn!("User {} has no email address", user.username);
            return;
        }
        if !self.config.enabled {
            tracing::debug!("Email disabled, skipping \"{}\" to {}", subject, user.email);
            return;
        }

        match self.send(&user.email, subject, body).await {
            Ok(()) => tracing::info!("Email sent to {}: {}", user.email, subject),
            Err(e) => tracing::error!("Failed to send email to {}: {}", user.email, e),
        }
    }

    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<()> {
        let from = format!("{} <{}>", self.config.from_name, self.config.from_address);

        let email = Message::builder()
            .from(from.parse().map_err(|e| anyhow!("Invalid from address: {}", e))?)
            .to(to.parse().map_err(|e| anyhow!("Invalid to address: {}", e))?)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())
            .map_err(|e| anyhow!("Failed to build email: {}", e))?;

        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::relay(&self.config.smtp_host)
            .map_err(|e| anyhow!("Failed to create SMTP transport: {}", e))?
            .port(self.config.smtp_port);

        if !self.config.smtp_username.is_empty() {
            builder = builder.credentials(Credentials::new(
                self.config.smtp_username.clone(),
                self.config.smtp_password.clone(),
            ));
        }

        let mailer = builder.build();
        mailer
            .send(email)
            .await
            .map_err(|e| anyhow!("Failed to send email: {}", e))?;

        Ok(())
    }
}

fn display_name(user: &User) -> &str {
    if user.first_name.is_empty() {
        &user.username
    } else {
        &user.first_name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UserRole;

    #[tokio::test]
    async fn test_disabled_email_is_a_noop() {
        let service = EmailService::new(EmailConfig::default());
        let user = User::new(
            "u".to_string(),
            "u@example.com".to_string(),
            "h".to_string(),
            UserRole::User,
        );
        // Must not panic or attempt a connection
        service.send_welcome(&user).await;
    }

    #[test]
    fn test_display_name_prefers_first_name() {
        let mut user = User::new(
            "login".to_string(),
            "u@example.com".to_string(),
            "h".to_string(),
            UserRole::User,
        );
        assert_eq!(display_name(&user), "login");
        user.first_name = "Anna".to_string();
        assert_eq!(display_name(&user), "Anna");
    }
}
