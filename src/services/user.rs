use super::{country, duration_ms, known_id, pick, user_agent};
use crate::producer::{Event, Producer};
use rand::rngs::StdRng;
use rand::seq::IteratorRandom;
use rand::Rng;
use std::collections::HashSet;

const ACTIONS: &[&str] = &[
    "login",
    "logout",
    "register",
    "profile_update",
    "password_reset",
    "account_delete",
];
const DEVICES: &[&str] = &["iOS", "Android", "Web", "Desktop"];
const USER_TYPES: &[&str] = &["guest", "free", "premium", "admin"];

/// Account activity: logins, registrations, password resets, deletions.
///
/// Users who log in are remembered so a later `account_delete` can remove
/// one of them.
#[derive(Debug, Default)]
pub struct UserService {
    active_users: HashSet<String>,
}

impl UserService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active_users(&self) -> usize {
        self.active_users.len()
    }
}

impl Producer for UserService {
    fn service(&self) -> &'static str {
        "user-service"
    }

    fn next_event(&mut self, rng: &mut StdRng) -> Event {
        let action = pick(rng, ACTIONS);
        let mut event = Event::new(format!("User action: {action}"));
        event.duration_ms = duration_ms(rng);
        event.status_code = 200;
        event
            .label("action", action)
            .label("device", pick(rng, DEVICES))
            .label("country", country(rng))
            .label("user_type", pick(rng, USER_TYPES))
            .label("user_agent", user_agent(rng));

        match action {
            "login" => {
                let user_id = known_id(rng, "user", 10000);
                self.active_users.insert(user_id.clone());
                event.label("user_id", user_id);
                if rng.random_bool(0.15) {
                    event.fail(401, "Invalid credentials");
                }
            }
            "register" => {
                if rng.random_bool(0.1) {
                    event.fail(409, "Email already exists");
                }
            }
            "password_reset" => {
                if rng.random_bool(0.2) {
                    event.fail(400, "Password too weak");
                }
            }
            "account_delete" => {
                if let Some(user_id) = self.active_users.iter().choose(rng).cloned() {
                    self.active_users.remove(&user_id);
                    event.label("user_id", user_id);
                }
            }
            _ => {}
        }

        event
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::{assert_well_formed, sample};
    use rand::SeedableRng;

    #[test]
    fn events_are_well_formed() {
        let mut service = UserService::new();
        let events = sample(&mut service, 2_000);
        assert_well_formed(&events, "User action: ");

        for event in &events {
            match event.labels["action"].as_str() {
                "login" => {
                    assert!(event.labels.contains_key("user_id"));
                    assert!(matches!(event.status_code, 200 | 401));
                }
                "register" => assert!(matches!(event.status_code, 200 | 409)),
                "password_reset" => assert!(matches!(event.status_code, 200 | 400)),
                _ => assert_eq!(event.status_code, 200),
            }
        }
    }

    #[test]
    fn deleted_accounts_come_from_logged_in_users() {
        let mut service = UserService::new();
        let mut logged_in = HashSet::new();
        let mut rng = StdRng::seed_from_u64(7);

        for _ in 0..2_000 {
            let event = service.next_event(&mut rng);
            match event.labels["action"].as_str() {
                "login" => {
                    logged_in.insert(event.labels["user_id"].clone());
                }
                "account_delete" => {
                    if let Some(user_id) = event.labels.get("user_id") {
                        assert!(logged_in.contains(user_id));
                    }
                }
                _ => {}
            }
        }
        assert!(service.active_users() <= logged_in.len());
    }

    #[test]
    fn account_delete_without_active_users_has_no_user_id() {
        let mut service = UserService::new();
        let mut rng = StdRng::seed_from_u64(3);

        let event = loop {
            let event = service.next_event(&mut rng);
            if event.labels["action"] == "account_delete" {
                break event;
            }
            service.active_users.clear();
        };

        assert!(!event.labels.contains_key("user_id"));
    }
}
