//! Outbound notifications (SMS with email fallback)
//!
//! Delivery is best-effort by contract: callers go through the side-effect
//! dispatcher, which logs and swallows any error raised here.

use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox, Message},
    transport::smtp::authentication::Credentials,
    SmtpTransport, Transport,
};
use std::str::FromStr;

use crate::{
    config::{EmailConfig, SmsConfig},
    error::{AppError, AppResult},
};

/// Who a notification goes to
#[derive(Debug, Clone)]
pub struct Recipient {
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
}

/// Fire-and-forget notification channel
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn deliver(&self, recipient: &Recipient, subject: &str, body: &str) -> AppResult<()>;
}

#[derive(Clone)]
pub struct NotificationService {
    email: EmailConfig,
    sms: SmsConfig,
    http: reqwest::Client,
}

impl NotificationService {
    pub fn new(email: EmailConfig, sms: SmsConfig) -> Self {
        Self {
            email,
            sms,
            http: reqwest::Client::new(),
        }
    }

    /// Send an SMS through the Twilio Messages API
    async fn send_sms(&self, to: &str, body: &str) -> AppResult<()> {
        let url = format!(
            "https://api.twilio.com/2010-04-01/Accounts/{}/Messages.json",
            self.sms.account_sid
        );

        let form = [
            ("To", to),
            ("From", self.sms.from_number.as_str()),
            ("Body", body),
        ];

        let response = self
            .http
            .post(url)
            .basic_auth(&self.sms.account_sid, Some(&self.sms.auth_token))
            .form(&form)
            .send()
            .await
            .map_err(|e| AppError::Internal(format!("SMS request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_body = response.text().await.unwrap_or_default();
            return Err(AppError::Internal(format!(
                "SMS gateway error ({}): {}",
                status, error_body
            )));
        }

        Ok(())
    }

    /// Send a plain-text email over SMTP
    async fn send_email(&self, to: &str, subject: &str, body: &str) -> AppResult<()> {
        let from_name = self.email.smtp_from_name.as_deref().unwrap_or("StuffLibrary");
        let from_mailbox = Mailbox::from_str(&format!("{} <{}>", from_name, self.email.smtp_from))
            .map_err(|e| AppError::Internal(format!("Invalid from address: {}", e)))?;

        let to_mailbox = Mailbox::from_str(to)
            .map_err(|e| AppError::Internal(format!("Invalid to address: {}", e)))?;

        let message = Message::builder()
            .from(from_mailbox)
            .to(to_mailbox)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())
            .map_err(|e| AppError::Internal(format!("Failed to build email: {}", e)))?;

        let mailer_builder = if self.email.smtp_use_tls {
            SmtpTransport::starttls_relay(&self.email.smtp_host)
                .map_err(|e| AppError::Internal(format!("Failed to create SMTP transport: {}", e)))?
        } else {
            SmtpTransport::builder_dangerous(&self.email.smtp_host)
        }
        .port(self.email.smtp_port);

        let mailer_builder = if let (Some(username), Some(password)) =
            (&self.email.smtp_username, &self.email.smtp_password)
        {
            mailer_builder.credentials(Credentials::new(username.clone(), password.clone()))
        } else {
            mailer_builder
        };

        mailer_builder
            .build()
            .send(&message)
            .map_err(|e| AppError::Internal(format!("Failed to send email: {}", e)))?;

        Ok(())
    }
}

#[async_trait]
impl Notifier for NotificationService {
    /// SMS first when enabled and a phone number is on file, falling back
    /// to email; an unreachable recipient is an error for the dispatcher
    /// to log
    async fn deliver(&self, recipient: &Recipient, subject: &str, body: &str) -> AppResult<()> {
        if self.sms.enabled {
            if let Some(phone) = recipient.phone.as_deref().filter(|p| !p.trim().is_empty()) {
                match self.send_sms(phone, body).await {
                    Ok(()) => return Ok(()),
                    Err(e) => {
                        tracing::warn!("SMS to {} failed, trying email: {}", recipient.name, e);
                    }
                }
            }
        }

        if let Some(email) = recipient.email.as_deref().filter(|e| !e.trim().is_empty()) {
            return self.send_email(email, subject, body).await;
        }

        Err(AppError::Internal(format!(
            "no deliverable contact for {}",
            recipient.name
        )))
    }
}
