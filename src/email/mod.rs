pub mod templates;

use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::config::SmtpConfig;

/// Transactional mail sent on behalf of the platform.
pub struct SystemMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: String,
}

impl SystemMailer {
    pub fn new(config: &SmtpConfig) -> Result<Self, String> {
        let creds = Credentials::new(config.user.clone(), config.pass.clone());

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
            .map_err(|e| format!("System SMTP error: {e}"))?
            .port(config.port)
            .credentials(creds)
            .build();

        Ok(Self {
            transport,
            from: config.from.clone(),
        })
    }

    pub async fn send_password_reset(&self, to_email: &str, reset_url: &str) -> Result<(), String> {
        let html = templates::render_password_reset(reset_url);
        self.send(to_email, "Redefinição de senha - ISA", &html).await
    }

    pub async fn send_request_received(
        &self,
        to_email: &str,
        name: &str,
        matricula: &str,
    ) -> Result<(), String> {
        let html = templates::render_request_received(name, matricula);
        self.send(to_email, "Recebemos sua solicitação - ISA", &html)
            .await
    }

    pub async fn send_request_approved(
        &self,
        to_email: &str,
        name: &str,
        matricula: &str,
        login_url: &str,
    ) -> Result<(), String> {
        let html = templates::render_request_approved(name, matricula, login_url);
        self.send(to_email, "Sua conta ISA foi aprovada", &html).await
    }

    pub async fn send_request_rejected(
        &self,
        to_email: &str,
        name: &str,
        reason: Option<&str>,
    ) -> Result<(), String> {
        let html = templates::render_request_rejected(name, reason);
        self.send(to_email, "Atualização da sua solicitação - ISA", &html)
            .await
    }

    async fn send(&self, to: &str, subject: &str, html_body: &str) -> Result<(), String> {
        let message = Message::builder()
            .from(
                self.from
                    .parse()
                    .map_err(|e| format!("Invalid from address: {e}"))?,
            )
            .to(to.parse().map_err(|e| format!("Invalid to address: {e}"))?)
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(html_body.to_string())
            .map_err(|e| format!("Failed to build email: {e}"))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| format!("Failed to send email: {e}"))?;

        Ok(())
    }
}
