//! Simulated domain services.
//!
//! Each producer picks an action, fills in domain labels, rolls for one of
//! the failure outcomes tied to that action and reports a simulated latency.

use rand::rngs::StdRng;
use rand::Rng;

mod order;
mod payment;
mod product;
mod user;

pub use order::OrderService;
pub use payment::PaymentService;
pub use product::ProductService;
pub use user::UserService;

const COUNTRIES: &[&str] = &["PL", "US", "DE", "FR", "UK", "JP"];

const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (iPhone; CPU iPhone OS 15_0 like Mac OS X)",
    "Mozilla/5.0 (Linux; Android 12; SM-G991B)",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64)",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 12_0)",
];

/// Size of each pre-generated pool of "known" ids.
const KNOWN_IDS: u32 = 1000;

fn pick<'a>(rng: &mut StdRng, items: &[&'a str]) -> &'a str {
    items[rng.random_range(0..items.len())]
}

/// Simulated operation latency in milliseconds, uniform in `[200, 1000)`.
fn duration_ms(rng: &mut StdRng) -> u64 {
    rng.random_range(200..1000)
}

/// One of the `KNOWN_IDS` ids of the form `{prefix}_{base + n}`.
fn known_id(rng: &mut StdRng, prefix: &str, base: u32) -> String {
    format!("{prefix}_{}", base + rng.random_range(0..KNOWN_IDS))
}

/// A random id of the form `{prefix}_{n}` with `n < 1_000_000`.
fn random_id(rng: &mut StdRng, prefix: &str) -> String {
    format!("{prefix}_{}", rng.random_range(0..1_000_000u32))
}

fn user_agent(rng: &mut StdRng) -> &'static str {
    pick(rng, USER_AGENTS)
}

fn country(rng: &mut StdRng) -> &'static str {
    pick(rng, COUNTRIES)
}
