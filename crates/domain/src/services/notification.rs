//! Outgoing mail abstraction and booking notification messages.
//!
//! Mail is best-effort: a [`Mailer`] never returns an error, it reports the
//! outcome in a [`DeliveryReport`] that callers log and otherwise ignore.

use serde::Serialize;
use std::sync::{Arc, Mutex};

use crate::models::booking::BookingRequest;

/// Email message to be sent.
#[derive(Debug, Clone, PartialEq)]
pub struct MailMessage {
    pub to: String,
    pub to_name: Option<String>,
    pub subject: String,
    pub body_text: String,
    pub body_html: Option<String>,
}

/// Outcome of a send attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeliveryReport {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl DeliveryReport {
    pub fn delivered() -> Self {
        Self {
            success: true,
            reason: None,
        }
    }

    pub fn failed(reason: impl Into<String>) -> Self {
        Self {
            success: false,
            reason: Some(reason.into()),
        }
    }
}

/// Mail transport.
#[async_trait::async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: MailMessage) -> DeliveryReport;
}

/// In-process mailer for development and testing.
///
/// Records every message it is asked to send.
#[derive(Debug, Clone, Default)]
pub struct MockMailer {
    /// Whether to simulate failures for testing.
    pub simulate_failure: bool,
    sent: Arc<Mutex<Vec<MailMessage>>>,
}

impl MockMailer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mailer that reports every send as failed.
    pub fn failing() -> Self {
        Self {
            simulate_failure: true,
            ..Self::default()
        }
    }

    /// Messages passed to `send`, including failed ones.
    pub fn sent(&self) -> Vec<MailMessage> {
        self.sent.lock().map(|sent| sent.clone()).unwrap_or_default()
    }
}

#[async_trait::async_trait]
impl Mailer for MockMailer {
    async fn send(&self, message: MailMessage) -> DeliveryReport {
        if let Ok(mut sent) = self.sent.lock() {
            sent.push(message.clone());
        }

        if self.simulate_failure {
            tracing::warn!(
                to = %message.to,
                subject = %message.subject,
                "Mock mailer simulating failure"
            );
            return DeliveryReport::failed("Simulated failure");
        }

        tracing::info!(
            to = %message.to,
            subject = %message.subject,
            "Mock: Would send email"
        );
        DeliveryReport::delivered()
    }
}

fn booking_summary(booking: &BookingRequest, tour_title: &str) -> String {
    let mut lines = vec![
        format!("Tour: {}", tour_title),
        format!("Preferred date: {}", booking.preferred_date),
        format!("Number of people: {}", booking.number_of_people),
        format!("Total price: {:.2}", booking.total_price),
    ];
    if let Some(notes) = &booking.notes {
        lines.push(format!("Notes: {}", notes));
    }
    lines.join("\n")
}

/// Alert sent to the operator's inbox for a new booking request.
pub fn booking_admin_alert(
    booking: &BookingRequest,
    tour_title: &str,
    admin_email: &str,
) -> MailMessage {
    let body_text = format!(
        "New booking request #{id}\n\nCustomer: {name}\nEmail: {email}\nPhone: {phone}\n\n{summary}",
        id = booking.id,
        name = booking.customer_name,
        email = booking.customer_email,
        phone = booking.customer_phone.as_deref().unwrap_or("-"),
        summary = booking_summary(booking, tour_title),
    );

    MailMessage {
        to: admin_email.to_string(),
        to_name: None,
        subject: format!("New booking request: {}", tour_title),
        body_text,
        body_html: None,
    }
}

/// Confirmation sent to the customer who submitted a booking request.
pub fn booking_confirmation(booking: &BookingRequest, tour_title: &str) -> MailMessage {
    let body_text = format!(
        r#"Hi {name},

Thank you for your booking request. We have received it and will contact you shortly to confirm the details.

{summary}

Best regards,
The Tajik Trails Team"#,
        name = booking.customer_name,
        summary = booking_summary(booking, tour_title),
    );

    MailMessage {
        to: booking.customer_email.clone(),
        to_name: Some(booking.customer_name.clone()),
        subject: format!("Your booking request - {}", tour_title),
        body_text,
        body_html: None,
    }
}
