pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod images;
pub mod listing;
pub mod models;
pub mod schema;
pub mod seed;
pub mod store;

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::http::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderValue, Method};
use axum::routing::{delete, get, patch, post, put};
use axum::{middleware, Router};
use tower_http::cors::CorsLayer;

use crate::config::AppConfig;
use crate::handlers::{
    auth as auth_routes, brands, dashboard, enquiries, leads, public, sell_requests, users,
    vehicles,
};
use crate::images::blob::LocalBlobStore;
use crate::images::{ImageIntake, UploadSettings};
use crate::store::Store;

/// Headroom over the upload cap so oversize files reach the intake and get a proper error.
const BODY_LIMIT_SLACK: usize = 1024 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub store: Arc<dyn Store>,
    pub images: ImageIntake,
}

impl AppState {
    /// State backed by the local upload directory named in `config`.
    pub fn new(config: AppConfig, store: Arc<dyn Store>) -> Self {
        let images = ImageIntake::new(
            Arc::new(LocalBlobStore::new(&config.upload_dir)),
            UploadSettings::from(&config),
        );
        Self {
            config,
            store,
            images,
        }
    }
}

fn cors(config: &AppConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .cors_origins()
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                log::warn!("ignoring invalid CORS origin {origin}");
                None
            }
        })
        .collect();
    CorsLayer::new()
        .allow_origin(origins)
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE, ACCEPT])
}

fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(dashboard::stats))
        .route(
            "/vehicles",
            get(vehicles::admin_list).post(vehicles::create),
        )
        .route(
            "/vehicles/:id",
            get(vehicles::admin_show)
                .put(vehicles::update)
                .delete(vehicles::delete),
        )
        .route("/vehicles/:id/feature", patch(vehicles::toggle_featured))
        .route("/vehicles/:id/upload-image", post(vehicles::upload_image))
        .route("/vehicles/images/:image_id", delete(vehicles::delete_image))
        .route("/enquiries", get(enquiries::list))
        .route(
            "/enquiries/:id",
            get(enquiries::show).delete(enquiries::delete),
        )
        .route("/enquiries/:id/status", patch(enquiries::update_status))
        .route("/sell-requests", get(sell_requests::list))
        .route(
            "/sell-requests/:id",
            get(sell_requests::show).delete(sell_requests::delete),
        )
        .route(
            "/sell-requests/:id/status",
            patch(sell_requests::update_status),
        )
        .route(
            "/sell-requests/:id/valuation",
            patch(sell_requests::set_valuation),
        )
        .route("/brands", get(brands::list_all).post(brands::create))
        .route("/brands/:id", put(brands::update).delete(brands::delete))
        .route("/users", get(users::list).post(users::create))
        .route("/users/:id", put(users::update))
}

pub fn router(state: AppState) -> Router {
    let authenticated = Router::new()
        .route("/api/auth/me", get(auth_routes::me))
        .nest("/api/admin", admin_routes())
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::authenticate,
        ));

    Router::new()
        .route("/", get(public::root))
        .route("/health", get(public::health))
        .route("/uploads/*path", get(public::upload))
        .route("/api/vehicles", get(vehicles::list))
        .route("/api/vehicles/featured", get(vehicles::featured))
        .route("/api/vehicles/recent", get(vehicles::recent))
        .route("/api/vehicles/makes", get(vehicles::makes))
        .route("/api/vehicles/models/:make", get(vehicles::models))
        .route("/api/vehicles/:id", get(vehicles::show))
        .route("/api/enquiries", post(enquiries::create))
        .route("/api/sell-requests", post(sell_requests::create))
        .route(
            "/api/sell-requests/:id/upload-image",
            post(sell_requests::upload_image),
        )
        .route("/api/brands", get(brands::list_active))
        .route("/api/stats/public", get(public::stats))
        .route("/api/newsletter/subscribe", post(public::subscribe))
        .route("/api/leads/capture", post(leads::capture))
        .route("/api/auth/login", post(auth_routes::login))
        .route("/api/auth/logout", post(auth_routes::logout))
        .merge(authenticated)
        .layer(DefaultBodyLimit::max(
            state.config.max_file_size + BODY_LIMIT_SLACK,
        ))
        .layer(cors(&state.config))
        .with_state(state)
}
