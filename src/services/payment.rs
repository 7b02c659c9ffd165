use super::{country, duration_ms, known_id, pick, random_id, user_agent};
use crate::producer::{Event, Producer};
use rand::rngs::StdRng;
use rand::Rng;

const ACTIONS: &[&str] = &[
    "payment_initiated",
    "payment_completed",
    "payment_failed",
    "payment_refunded",
    "payment_cancelled",
];
const PAYMENT_METHODS: &[&str] = &["credit_card", "paypal", "bank_transfer", "crypto"];
const CURRENCIES: &[&str] = &["USD", "EUR", "PLN", "GBP", "JPY"];
const REGIONS: &[&str] = &["EU", "NA", "APAC"];

/// Payment processing: initiation, completion, failures, refunds.
///
/// `payment_failed` always reports an error status.
#[derive(Debug, Default)]
pub struct PaymentService;

impl Producer for PaymentService {
    fn service(&self) -> &'static str {
        "payment-service"
    }

    fn next_event(&mut self, rng: &mut StdRng) -> Event {
        let action = pick(rng, ACTIONS);
        let mut event = Event::new(format!("Payment action: {action}"));
        event.duration_ms = duration_ms(rng);
        event.status_code = 200;
        event
            .label("action", action)
            .label("payment_method", pick(rng, PAYMENT_METHODS))
            .label("country", country(rng))
            .label("currency", pick(rng, CURRENCIES))
            .label("region", pick(rng, REGIONS))
            .label("transaction_id", random_id(rng, "txn"))
            .label("customer_id", random_id(rng, "customer"))
            .label("user_agent", user_agent(rng));

        event.label("transaction_id", known_id(rng, "txn", 100000));

        match action {
            "payment_initiated" => {
                event
                    .label("customer_id", known_id(rng, "customer", 10000))
                    .label("status", "pending");
            }
            "payment_completed" => {
                event.label("status", "completed");
                if rng.random_bool(0.05) {
                    event.fail(500, "Payment gateway timeout");
                }
            }
            "payment_failed" => {
                event.label("status", "failed");
                if rng.random_bool(0.1) {
                    event.fail(400, "Invalid payment method");
                } else {
                    event.fail(402, "Insufficient funds");
                }
            }
            "payment_refunded" => {
                event.label("status", "refunded");
                if rng.random_bool(0.2) {
                    event.fail(404, "Fraud detection triggered");
                }
            }
            "payment_cancelled" => {
                event.label("status", "cancelled");
                if rng.random_bool(0.15) {
                    event.fail(401, "Payment declined");
                }
            }
            _ => {}
        }

        event
    }
}
