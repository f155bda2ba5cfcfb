// tests/support/mod.rs
//
// Monta o AppState sobre o store em memória e um relógio controlável.

#![allow(dead_code)]

use std::sync::Arc;

use asset_tracker::{
    common::clock::FixedClock,
    config::AppState,
    db::MemoryStore,
    models::{
        inventory::{Item, NewItem},
        people::{Certificate, NewProfile, Profile, Role},
    },
};
use chrono::{DateTime, FixedOffset, TimeZone, Utc};

pub struct Harness {
    pub state: AppState,
    pub clock: FixedClock,
    // Mesmo store do AppState (clone compartilha o estado)
    pub store: MemoryStore,
}

pub fn start_of_2024() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
}

pub fn harness() -> Harness {
    harness_at(start_of_2024())
}

pub fn harness_at(now: DateTime<Utc>) -> Harness {
    let clock = FixedClock::new(now);
    let offset = FixedOffset::east_opt(60 * 60).unwrap();
    let store = MemoryStore::new();
    let state = AppState::with_store(Arc::new(store.clone()), Arc::new(clock.clone()), offset);
    Harness { state, clock, store }
}

impl Harness {
    pub async fn profile(&self, name: &str, role: Role) -> Profile {
        self.state
            .catalog_service
            .create_profile(NewProfile {
                name: name.to_string(),
                role,
                ..Default::default()
            })
            .await
            .unwrap()
    }

    pub async fn admin(&self) -> Profile {
        self.profile("Anna Admin", Role::Admin).await
    }

    pub async fn user(&self, name: &str) -> Profile {
        self.profile(name, Role::User).await
    }

    pub async fn item(&self, name: &str, actor: &Profile) -> Item {
        self.state
            .lifecycle_service
            .create_item(
                NewItem {
                    name: name.to_string(),
                    ..Default::default()
                },
                actor.id,
            )
            .await
            .unwrap()
    }

    pub async fn certificate(&self, name: &str) -> Certificate {
        self.state
            .certificate_service
            .create_certificate(name, None)
            .await
            .unwrap()
    }
}
