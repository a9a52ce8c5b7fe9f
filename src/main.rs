use std::sync::Arc;

use actix_cors::Cors;
use actix_web::middleware::NormalizePath;
use actix_web::web::Data;
use actix_web::{App, HttpServer};
use dotenvy::dotenv;

mod api;
mod auth;
mod config;
mod docs;
mod model;
mod models;
mod resolver;
mod routes;
mod store;
mod supabase;
mod utils;

use auth::provider::IdentityProvider;
use auth::session::SessionContext;
use config::Config;
use routes::RateLimits;
use store::AttendanceStore;
use supabase::SupabaseClient;
use supabase::auth::SupabaseAuth;

use crate::docs::ApiDoc;
use tracing::{info, warn};
use tracing_appender::rolling;
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi; // ← needed for ApiDoc::openapi()
use utoipa_swagger_ui::SwaggerUi;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let config = Config::from_env()?;

    // Rolling daily log
    let file_appender = rolling::daily(&config.log_dir, "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
        )
        .with_ansi(false)
        .with_target(false) // removes module path
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .pretty()
        .init();

    info!("Server starting...");

    let client = SupabaseClient::from_config(&config)?;
    let store: Arc<dyn AttendanceStore> = Arc::new(client.clone());
    let identity: Arc<dyn IdentityProvider> = Arc::new(SupabaseAuth::new(client));
    let session = Data::new(SessionContext::new(identity, config.site_url.clone()));
    let limits = RateLimits::from_config(&config)?;

    // lives for the whole process
    let _auth_subscription = session.subscribe();

    let session_for_warmup = session.clone();
    actix_web::rt::spawn(async move {
        session_for_warmup.ensure_loaded().await;
        if session_for_warmup.user().is_none() {
            warn!("No stored session; pages will redirect to login");
        }
    });

    let server_addr = config.server_addr.clone();
    let store_data: Data<dyn AttendanceStore> = Data::from(store);

    HttpServer::new(move || {
        App::new()
            .wrap(actix_web::middleware::Logger::default())
            .wrap(Cors::permissive())
            .wrap(NormalizePath::trim())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}") // ← important: wildcard {_:.*} to match JS/CSS files
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .app_data(store_data.clone())
            .app_data(session.clone())
            .configure(|cfg| routes::configure(cfg, &limits))
    })
    .bind(&server_addr)?
    .run()
    .await?;

    Ok(())
}
