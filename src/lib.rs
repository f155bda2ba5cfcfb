// src/lib.rs

use axum::{
    routing::{get, patch, post},
    Router,
};

pub mod common;
pub mod config;
pub mod db;
pub mod docs;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;

use crate::config::AppState;

// Monta todas as rotas da API sobre o estado já inicializado
pub fn app(app_state: AppState) -> Router {
    let people_routes = Router::new()
        .route("/profiles"
               ,post(handlers::people::create_profile)
               .get(handlers::people::list_profiles)
        )
        .route("/profiles/{id}", patch(handlers::people::update_profile))
        .route("/me", get(handlers::people::get_me));

    let certificate_routes = Router::new()
        .route("/certificates"
               ,post(handlers::certificates::create_certificate)
               .get(handlers::certificates::list_certificates)
        )
        .route("/user-certificates"
               ,post(handlers::certificates::grant_certificate)
               .get(handlers::certificates::list_user_certificates)
        )
        .route("/user-certificates/expiring", get(handlers::certificates::list_expiring_certificates));

    let inventory_routes = Router::new()
        .route("/categories"
               ,post(handlers::inventory::create_category)
               .get(handlers::inventory::get_all_categories)
        )
        .route("/items"
               ,post(handlers::inventory::create_item)
               .get(handlers::inventory::get_all_items)
        )
        .route("/items/{id}", patch(handlers::inventory::update_item))
        .route("/items/{id}/checkout", post(handlers::inventory::checkout_item))
        .route("/items/{id}/checkin", post(handlers::inventory::checkin_item))
        .route("/items/{id}/status", post(handlers::inventory::set_item_status))
        .route("/items/{id}/maintenance"
               ,post(handlers::inventory::log_maintenance)
               .get(handlers::inventory::get_item_maintenance)
        )
        .route("/maintenance", get(handlers::inventory::get_all_maintenance))
        .route("/assignments", get(handlers::inventory::get_assignments));

    let activity_routes = Router::new()
        .route("/activities"
               ,post(handlers::activities::create_activity)
               .get(handlers::activities::list_activities)
        )
        .route("/overview", get(handlers::dashboard::get_overview));

    let api_routes = Router::new()
        .route("/health", get(|| async { "OK" }))
        .merge(people_routes)
        .merge(certificate_routes)
        .merge(inventory_routes)
        .merge(activity_routes);

    Router::new()
        .nest("/api", api_routes)
        .with_state(app_state)
}
