use crate::config::{SmtpConfig, EHI_BASE_URL};
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::time::Duration;
use thiserror::Error;

pub const CHANGE_SUBJECT: &str = "一嗨租车价格变动通知";
pub const TEST_SUBJECT: &str = "一嗨租车价格测试通知";

const SMTP_TIMEOUT: Duration = Duration::from_secs(20);
const IMPLICIT_TLS_PORT: u16 = 465;
const STARTTLS_PORT: u16 = 587;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("invalid mail address {0:?}: {1}")]
    Address(String, lettre::address::AddressError),

    #[error("could not build message: {0}")]
    Message(#[from] lettre::error::Error),

    #[error("smtp: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TlsMode {
    /// TLS from the first byte (SMTPS).
    Implicit,
    StartTls,
}

/// Transports to try in order: the configured port in its natural mode, then
/// the other mode on its standard port.
pub fn transport_plan(port: u16) -> [(TlsMode, u16); 2] {
    if port == IMPLICIT_TLS_PORT {
        [
            (TlsMode::Implicit, port),
            (TlsMode::StartTls, STARTTLS_PORT),
        ]
    } else {
        [
            (TlsMode::StartTls, port),
            (TlsMode::Implicit, IMPLICIT_TLS_PORT),
        ]
    }
}

/// Prices print like the rest of the report: always with a fractional part.
pub fn format_price(price: f64) -> String {
    if price.fract() == 0.0 {
        format!("{:.1}", price)
    } else {
        format!("{}", price)
    }
}

pub fn render_change_body(car_name: &str, old_price: Option<f64>, new_price: f64) -> String {
    let mut lines = vec![format!("车型：{}", car_name), format!("链接：{}", EHI_BASE_URL)];
    match old_price {
        None => lines.push(format!("当前价格：{}", format_price(new_price))),
        Some(old) => {
            let delta = new_price - old;
            let sign = if delta >= 0.0 { "+" } else { "-" };
            lines.push(format!("原价：{}", format_price(old)));
            lines.push(format!(
                "现价：{}（{}{}）",
                format_price(new_price),
                sign,
                format_price(delta.abs())
            ));
        }
    }
    lines.join("\n")
}

pub fn render_current_body(car_name: &str, price: f64) -> String {
    [
        format!("车型：{}", car_name),
        "模式：firstStep 自动填表".to_string(),
        format!("链接：{}", EHI_BASE_URL),
        format!("当前价格：{}", format_price(price)),
    ]
    .join("\n")
}

/// Plain-text price mails over SMTP.
pub struct EmailService {
    smtp: SmtpConfig,
    car_name: String,
}

impl EmailService {
    pub fn new(smtp: SmtpConfig, car_name: impl Into<String>) -> Self {
        Self {
            smtp,
            car_name: car_name.into(),
        }
    }

    pub async fn send_price_change(
        &self,
        old_price: Option<f64>,
        new_price: f64,
    ) -> Result<(), NotifyError> {
        let body = render_change_body(&self.car_name, old_price, new_price);
        self.send(CHANGE_SUBJECT, body).await
    }

    pub async fn send_current_price(&self, price: f64) -> Result<(), NotifyError> {
        let body = render_current_body(&self.car_name, price);
        self.send(TEST_SUBJECT, body).await
    }

    async fn send(&self, subject: &str, body: String) -> Result<(), NotifyError> {
        let message = Message::builder()
            .from(mailbox(&self.smtp.from)?)
            .to(mailbox(&self.smtp.to)?)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body)?;

        let mut last_err = None;
        for (mode, port) in transport_plan(self.smtp.port) {
            match self.send_via(mode, port, message.clone()).await {
                Ok(()) => {
                    tracing::info!("📧 mail '{}' sent via {:?}:{}", subject, mode, port);
                    return Ok(());
                }
                Err(e) => {
                    tracing::warn!("⚠️ smtp {:?}:{} failed: {}", mode, port, e);
                    last_err = Some(e);
                }
            }
        }
        // transport_plan always yields attempts, so last_err is set here
        match last_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    async fn send_via(&self, mode: TlsMode, port: u16, message: Message) -> Result<(), NotifyError> {
        let builder = match mode {
            TlsMode::Implicit => AsyncSmtpTransport::<Tokio1Executor>::relay(&self.smtp.host)?,
            TlsMode::StartTls => {
                AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.smtp.host)?
            }
        };
        let transport = builder
            .port(port)
            .credentials(Credentials::new(
                self.smtp.user.clone(),
                self.smtp.pass.clone(),
            ))
            .timeout(Some(SMTP_TIMEOUT))
            .build();
        transport.send(message).await?;
        Ok(())
    }
}

fn mailbox(address: &str) -> Result<Mailbox, NotifyError> {
    address
        .parse()
        .map_err(|e| NotifyError::Address(address.to_string(), e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn implicit_tls_port_falls_back_to_starttls() {
        assert_eq!(
            transport_plan(465),
            [(TlsMode::Implicit, 465), (TlsMode::StartTls, 587)]
        );
        assert_eq!(
            transport_plan(587),
            [(TlsMode::StartTls, 587), (TlsMode::Implicit, 465)]
        );
        assert_eq!(
            transport_plan(2525),
            [(TlsMode::StartTls, 2525), (TlsMode::Implicit, 465)]
        );
    }

    #[test]
    fn first_change_mail_shows_current_price() {
        let body = render_change_body("大众新探影", None, 698.0);
        assert_eq!(
            body,
            format!("车型：大众新探影\n链接：{}\n当前价格：698.0", EHI_BASE_URL)
        );
    }

    #[test]
    fn change_mail_shows_signed_delta() {
        let down = render_change_body("大众新探影", Some(698.0), 650.0);
        assert!(down.ends_with("原价：698.0\n现价：650.0（-48.0）"));

        let up = render_change_body("大众新探影", Some(650.0), 720.5);
        assert!(up.ends_with("现价：720.5（+70.5）"));
    }

    #[test]
    fn current_price_mail_names_the_mode() {
        let body = render_current_body("Model X", 698.0);
        assert!(body.contains("模式：firstStep 自动填表"));
        assert!(body.ends_with("当前价格：698.0"));
    }

    #[test]
    fn bad_addresses_are_reported() {
        assert!(matches!(mailbox("not an address"), Err(NotifyError::Address(..))));
        assert!(mailbox("ops@example.com").is_ok());
    }
}
