use super::{country, duration_ms, known_id, pick, random_id, user_agent};
use crate::producer::{Event, Producer};
use rand::rngs::StdRng;
use rand::Rng;

const ACTIONS: &[&str] = &[
    "product_added",
    "product_updated",
    "product_removed",
    "product_viewed",
    "product_out_of_stock",
];
const CATEGORIES: &[&str] = &["electronics", "clothing", "home_appliances", "books", "toys"];
const AVAILABILITY: &[&str] = &["in_stock", "out_of_stock", "pre_order", "discontinued"];

/// Catalogue changes and product views.
#[derive(Debug, Default)]
pub struct ProductService;

impl Producer for ProductService {
    fn service(&self) -> &'static str {
        "product-service"
    }

    fn next_event(&mut self, rng: &mut StdRng) -> Event {
        let action = pick(rng, ACTIONS);
        let mut event = Event::new(format!("Product action: {action}"));
        event.duration_ms = duration_ms(rng);
        event.status_code = 200;
        event
            .label("action", action)
            .label("category", pick(rng, CATEGORIES))
            .label("country", country(rng))
            .label("availability", pick(rng, AVAILABILITY))
            .label("product_id", random_id(rng, "product"))
            .label("customer_id", random_id(rng, "customer"))
            .label("user_agent", user_agent(rng));

        event.label("product_id", known_id(rng, "product", 10000));

        match action {
            "product_added" => {
                event.label("status", "in_stock");
            }
            "product_updated" => {
                if rng.random_bool(0.1) {
                    event.fail(400, "Invalid product details");
                }
            }
            "product_removed" => {
                if rng.random_bool(0.2) {
                    event.fail(404, "Product not found");
                }
            }
            "product_out_of_stock" => {
                event.label("status", "out_of_stock");
                if rng.random_bool(0.15) {
                    event.fail(500, "Insufficient stock");
                }
            }
            _ => {}
        }

        event
    }
}
