use super::{country, duration_ms, known_id, pick, random_id, user_agent};
use crate::producer::{Event, Producer};
use rand::rngs::StdRng;
use rand::Rng;

const ACTIONS: &[&str] = &[
    "order_placed",
    "order_updated",
    "order_shipped",
    "order_cancelled",
    "order_delivered",
];
const ORDER_STATUSES: &[&str] = &["pending", "shipped", "delivered", "cancelled", "returned"];
const SHIPMENT_METHODS: &[&str] = &["standard", "express", "overnight"];
const SHIPPING_ADDRESSES: &[&str] = &["123 Main St", "456 Elm St", "789 Oak Ave", "101 Pine Blvd"];

/// Order lifecycle: placement, updates, shipping, cancellation, delivery.
#[derive(Debug, Default)]
pub struct OrderService;

impl Producer for OrderService {
    fn service(&self) -> &'static str {
        "order-service"
    }

    fn next_event(&mut self, rng: &mut StdRng) -> Event {
        let action = pick(rng, ACTIONS);
        let mut event = Event::new(format!("Order action: {action}"));
        event.duration_ms = duration_ms(rng);
        event.status_code = 200;
        event
            .label("action", action)
            .label("order_status", pick(rng, ORDER_STATUSES))
            .label("country", country(rng))
            .label("shipment_method", pick(rng, SHIPMENT_METHODS))
            .label("shipping_address", pick(rng, SHIPPING_ADDRESSES))
            .label("order_id", random_id(rng, "order"))
            .label("customer_id", random_id(rng, "customer"))
            .label("user_agent", user_agent(rng));

        // Every action refers to one of the known orders.
        event.label("order_id", known_id(rng, "order", 10000));

        match action {
            "order_placed" => {
                event.label("status", "pending");
                if rng.random_bool(0.1) {
                    event.fail(402, "Payment failed");
                }
            }
            "order_updated" => {
                if rng.random_bool(0.2) {
                    event.fail(404, "Order not found");
                }
            }
            "order_shipped" => {
                event.label("status", "shipped");
                if rng.random_bool(0.05) {
                    event.fail(400, "Item out of stock");
                }
            }
            "order_cancelled" => {
                event.label("status", "cancelled");
                if rng.random_bool(0.15) {
                    event.fail(404, "Invalid order ID");
                }
            }
            "order_delivered" => {
                event.label("status", "delivered");
                if rng.random_bool(0.1) {
                    event.fail(400, "Address not valid");
                }
            }
            _ => {}
        }

        event
    }
}
