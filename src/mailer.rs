use anyhow::Context;
use async_trait::async_trait;
use lettre::{
    message::Mailbox, transport::smtp::authentication::Credentials, AsyncSmtpTransport,
    AsyncTransport, Message, Tokio1Executor,
};
use tracing::info;

use crate::config::SmtpConfig;

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, to: &str, subject: &str, body: &str) -> anyhow::Result<()>;
}

#[derive(Debug)]
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(cfg: &SmtpConfig) -> anyhow::Result<Self> {
        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&cfg.host)
            .context("smtp relay")?
            .port(cfg.port);
        if !cfg.username.is_empty() {
            builder = builder.credentials(Credentials::new(
                cfg.username.clone(),
                cfg.password.clone(),
            ));
        }
        let from = cfg
            .from
            .parse::<Mailbox>()
            .context("parse smtp from address")?;

        Ok(Self {
            transport: builder.build(),
            from,
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, to: &str, subject: &str, body: &str) -> anyhow::Result<()> {
        let message = Message::builder()
            .from(self.from.clone())
            .to(to.parse().context("parse recipient address")?)
            .subject(subject)
            .body(body.to_string())
            .context("build email")?;

        self.transport.send(message).await.context("smtp send")?;
        info!(%to, %subject, "email sent");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn local_cfg(from: &str) -> SmtpConfig {
        SmtpConfig {
            host: "localhost".into(),
            port: 1025,
            username: String::new(),
            password: String::new(),
            from: from.into(),
        }
    }

    #[tokio::test]
    async fn builds_without_credentials() {
        SmtpMailer::new(&local_cfg("TStore <noreply@tstore.dev>")).expect("mailer should build");
    }

    #[test]
    fn rejects_malformed_from_address() {
        let err = SmtpMailer::new(&local_cfg("not an address")).unwrap_err();
        assert!(err.to_string().contains("from address"));
    }
}
