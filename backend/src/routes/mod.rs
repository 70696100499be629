//! Route definitions for the EasyStock backend

use axum::{
    middleware,
    routing::{get, patch, post},
    Router,
};

use crate::{handlers, middleware::auth_middleware, AppState};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Health check (public)
        .route("/health", get(handlers::health_check))
        // Auth routes (login/refresh public, the rest protected)
        .nest("/auth", auth_routes())
        // Protected routes - product store
        .nest("/products", product_routes())
        // Protected routes - categories
        .nest("/categories", category_routes())
        // Protected routes - sales catalog
        .nest("/listings", listing_routes())
        // Protected routes - movement ledger
        .merge(movement_routes())
        // Protected routes - dashboards
        .merge(dashboard_routes())
        // Protected routes - task assignment
        .nest("/tasks", task_routes())
        // Protected routes - festival calendar
        .nest("/festivals", festival_routes())
        // Protected routes - personal events
        .nest("/custom-events", event_routes())
}

/// Authentication routes
fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", post(handlers::login))
        .route("/refresh", post(handlers::refresh))
        .merge(
            Router::new()
                .route("/register", post(handlers::register))
                .route("/me", get(handlers::me))
                .route("/users", get(handlers::list_users))
                .route_layer(middleware::from_fn(auth_middleware)),
        )
}

/// Product store routes (protected)
fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_products).post(handlers::create_product))
        .route(
            "/:product_id",
            get(handlers::get_product)
                .patch(handlers::update_product)
                .delete(handlers::delete_product),
        )
        .route("/:product_id/unlist", post(handlers::unlist_product))
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Category routes (protected)
fn category_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_categories).post(handlers::create_category))
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Sales catalog routes (protected)
fn listing_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_listings).post(handlers::create_listing))
        .route(
            "/:listing_id",
            get(handlers::get_listing)
                .patch(handlers::update_listing)
                .delete(handlers::delete_listing),
        )
        .route("/:listing_id/unlist", post(handlers::unlist_listing))
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Movement ledger routes (protected)
fn movement_routes() -> Router<AppState> {
    Router::new()
        .route("/receive-products", post(handlers::receive_products))
        .route("/issue-products", post(handlers::issue_products))
        .route("/movement-history", get(handlers::movement_history))
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Dashboard routes (protected; admin endpoints guard themselves)
fn dashboard_routes() -> Router<AppState> {
    Router::new()
        .route("/dashboard-stats", get(handlers::dashboard_stats))
        .route("/low-stock", get(handlers::low_stock))
        .route("/out-of-stock", get(handlers::out_of_stock))
        .route("/daily-totals", get(handlers::daily_totals))
        .route("/best-sellers/top_products", get(handlers::best_sellers))
        .route("/admin-dashboard/financial", get(handlers::admin_financial))
        .route(
            "/admin-dashboard/category_breakdown",
            get(handlers::admin_category_breakdown),
        )
        .route("/admin-dashboard/top_products", get(handlers::admin_top_products))
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Task assignment routes (protected)
fn task_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_tasks).post(handlers::create_task))
        .route("/my_tasks", get(handlers::my_tasks))
        .route("/stats", get(handlers::task_stats))
        .route(
            "/:task_id",
            get(handlers::get_task).patch(handlers::update_task),
        )
        .route("/:task_id/update_status", patch(handlers::update_task_status))
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Festival calendar routes (protected)
fn festival_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_festivals).post(handlers::create_festival))
        .route("/upcoming", get(handlers::upcoming_festivals))
        .route("/calendar", get(handlers::festival_calendar))
        .route(
            "/:festival_id",
            get(handlers::get_festival)
                .patch(handlers::update_festival)
                .delete(handlers::delete_festival),
        )
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Personal event routes (protected)
fn event_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_events).post(handlers::create_event))
        .route("/upcoming", get(handlers::upcoming_events))
        .route("/calendar", get(handlers::event_calendar))
        .route(
            "/:event_id",
            patch(handlers::update_event).delete(handlers::delete_event),
        )
        .route_layer(middleware::from_fn(auth_middleware))
}
