// region:    --- Imports
use axum::routing::{delete, get, post};
use axum::Router;
use marketplace_service::config::Config;
use marketplace_service::scheduler::Sweeper;
use marketplace_service::{handlers, AppState};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};

// endregion: --- Imports

// region:    --- Main
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // logging
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .without_time()
        .with_target(false)
        .init();

    let config = Config::from_env();
    let bind_addr = config.bind_addr.clone();
    let state = Arc::new(AppState::new(config).await);

    // destructive: drops and recreates the schema
    if std::env::var("RECREATE_DB").as_deref() == Ok("1") {
        if let Err(e) = state.db.initialize_database().await {
            error!("{:<12} --> database initialization failed: {:?}", "Main", e);
            return Err(e.into());
        }
        info!("{:<12} --> database schema recreated", "Main");
    }

    // background tasks + expiry sweep
    let sweeper = Sweeper::new(Arc::clone(&state));
    sweeper.start().await;

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let routes_all = Router::new()
        // auth
        .route("/auth/login", post(handlers::auth::login))
        .route("/auth/logout", post(handlers::auth::logout))
        // item gallery + owner CRUD
        .route("/items/get_relative", get(handlers::catalog::items_get_relative))
        .route("/items/mine", get(handlers::catalog::list_own_items))
        .route("/items", post(handlers::catalog::create_item))
        .route(
            "/items/:pk",
            get(handlers::catalog::get_item)
                .put(handlers::catalog::edit_item)
                .delete(handlers::catalog::delete_item),
        )
        .route("/items/:pk/flag", post(handlers::catalog::flag_item))
        // item request gallery + owner CRUD
        .route(
            "/item_requests/get_relative",
            get(handlers::catalog::item_requests_get_relative),
        )
        .route("/item_requests/mine", get(handlers::catalog::list_own_item_requests))
        .route("/item_requests", post(handlers::catalog::create_item_request))
        .route(
            "/item_requests/:pk",
            get(handlers::catalog::get_item_request)
                .put(handlers::catalog::edit_item_request)
                .delete(handlers::catalog::delete_item_request),
        )
        .route(
            "/item_requests/:pk/flag",
            post(handlers::catalog::flag_item_request),
        )
        .route("/categories", get(handlers::catalog::list_categories))
        // purchase/sale lifecycle
        .route("/purchases", post(handlers::trade::create_purchase))
        .route("/purchases/list", get(handlers::trade::list_purchases))
        .route("/purchases/:pk/confirm", post(handlers::trade::confirm_purchase))
        .route("/purchases/:pk/cancel", post(handlers::trade::cancel_purchase))
        .route("/sales/list", get(handlers::trade::list_sales))
        .route("/sales/:pk/acknowledge", post(handlers::trade::acknowledge_sale))
        .route("/sales/:pk/confirm", post(handlers::trade::confirm_sale))
        .route("/sales/:pk/cancel", post(handlers::trade::cancel_sale))
        // notifications
        .route("/notifications/count", get(handlers::notify::count_unseen))
        .route("/notifications/see", post(handlers::notify::see))
        .route("/notifications/get_relative", get(handlers::notify::get_relative))
        // messages
        .route("/messages/get_relative", get(handlers::messaging::get_relative))
        .route("/messages", post(handlers::messaging::send))
        .route("/contacts", get(handlers::messaging::list_contacts))
        // account
        .route(
            "/account",
            get(handlers::account::get_account).put(handlers::account::update_account),
        )
        .route("/account/verify_email", get(handlers::account::verify_email))
        .route("/account/activity", get(handlers::account::activity))
        // moderation
        .route("/admin/flags", get(handlers::admin::list_flags))
        .route(
            "/admin/flags/item/:pk",
            delete(handlers::admin::dismiss_item_flag),
        )
        .route(
            "/admin/flags/item_request/:pk",
            delete(handlers::admin::dismiss_item_request_flag),
        )
        .route("/admin/items/:pk", delete(handlers::admin::delete_item))
        .route(
            "/admin/item_requests/:pk",
            delete(handlers::admin::delete_item_request),
        )
        .layer(cors)
        .with_state(state);

    let listener = TcpListener::bind(&bind_addr).await?;
    info!(
        "{:<12} --> Web Server: Listening on {}",
        "Main",
        listener.local_addr()?
    );

    if let Err(err) = axum::serve(listener, routes_all.into_make_service()).await {
        error!("{:<12} --> Server error: {}", "Main", err);
    }
    Ok(())
}
// endregion: --- Main
