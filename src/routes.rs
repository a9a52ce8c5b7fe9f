use crate::{
    api::{self, attendance, json_error_handler, pages},
    auth::{handlers, middleware::session_guard},
    config::{Config, ConfigError},
};
use actix_governor::{
    Governor, GovernorConfig, GovernorConfigBuilder, PeerIpKeyExtractor,
    governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};

type LimiterConfig = GovernorConfig<PeerIpKeyExtractor, NoOpMiddleware>;

/// Limiter state is built once and shared by every worker.
#[derive(Clone)]
pub struct RateLimits {
    scan: LimiterConfig,
    auth: LimiterConfig,
}

impl RateLimits {
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        Ok(Self {
            scan: build_limiter("RATE_SCAN_PER_MIN", config.rate_scan_per_min)?,
            auth: build_limiter("RATE_AUTH_PER_MIN", config.rate_auth_per_min)?,
        })
    }
}

fn build_limiter(name: &'static str, requests_per_min: u32) -> Result<LimiterConfig, ConfigError> {
    let per_ms = if requests_per_min == 0 {
        1
    } else {
        60_000 / requests_per_min as u64
    };
    GovernorConfigBuilder::default()
        .per_millisecond(per_ms.max(1))
        .burst_size(requests_per_min)
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        .ok_or(ConfigError::Invalid {
            name,
            value: requests_per_min.to_string(),
        })
}

pub fn configure(cfg: &mut web::ServiceConfig, limits: &RateLimits) {
    cfg.service(api::health);

    // Scanner endpoint
    cfg.service(
        web::resource("/attendance")
            .app_data(web::JsonConfig::default().error_handler(json_error_handler))
            .wrap(Governor::new(&limits.scan))
            .route(web::post().to(attendance::scan)),
    );

    cfg.service(
        web::scope("/auth")
            .app_data(web::JsonConfig::default().error_handler(json_error_handler))
            .wrap(Governor::new(&limits.auth))
            .service(web::resource("/login").route(web::post().to(handlers::login)))
            .service(web::resource("/register").route(web::post().to(handlers::register)))
            .service(web::resource("/logout").route(web::post().to(handlers::logout)))
            .service(web::resource("/session").route(web::get().to(handlers::current_session)))
            .service(web::resource("/recover").route(web::post().to(handlers::recover)))
            .service(
                web::resource("/reset-password").route(web::post().to(handlers::reset_password)),
            ),
    );

    configure_pages(cfg);
}

/// Front-end pages, all behind the session guard. Must be registered last:
/// the empty scope catches every remaining path.
pub fn configure_pages(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("")
            .wrap(from_fn(session_guard))
            .service(web::resource("/").route(web::get().to(pages::page)))
            .service(web::resource("/login").route(web::get().to(pages::page)))
            .service(web::resource("/register-admin").route(web::get().to(pages::page)))
            .service(web::resource("/forgot-password").route(web::get().to(pages::page)))
            .service(web::resource("/reset-password").route(web::get().to(pages::page)))
            .service(web::resource("/dashboard").route(web::get().to(pages::page)))
            .service(web::resource("/attendance/{id}").route(web::get().to(pages::page)))
            .service(web::resource("/employees").route(web::get().to(pages::page)))
            .service(web::resource("/reports/{id}").route(web::get().to(pages::page)))
            .service(web::resource("/schedules/{id}").route(web::get().to(pages::page)))
            .default_service(web::to(pages::not_found)),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::provider::fake::{FakeIdentity, session};
    use crate::auth::session::SessionContext;
    use actix_web::{App, http::StatusCode, http::header::LOCATION, test};
    use serde_json::Value;
    use std::sync::Arc;

    fn context(signed_in: bool) -> web::Data<SessionContext> {
        let current = signed_in.then(|| session("a@b.c"));
        web::Data::new(SessionContext::new(
            Arc::new(FakeIdentity::new(current)),
            "http://localhost:5173",
        ))
    }

    #[actix_web::test]
    async fn signed_out_visitor_is_sent_to_login() {
        let app = test::init_service(
            App::new()
                .app_data(context(false))
                .configure(configure_pages),
        )
        .await;

        let req = test::TestRequest::get().uri("/schedules/3").to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::FOUND);
        assert_eq!(resp.headers().get(LOCATION).unwrap(), "/login");
    }

    #[actix_web::test]
    async fn signed_in_user_reaches_pages_and_skips_login() {
        let app = test::init_service(
            App::new()
                .app_data(context(true))
                .configure(configure_pages),
        )
        .await;

        let req = test::TestRequest::get().uri("/reports/7").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["page"], "reports");

        let req = test::TestRequest::get().uri("/login").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FOUND);
        assert_eq!(resp.headers().get(LOCATION).unwrap(), "/dashboard");
    }

    #[actix_web::test]
    async fn unknown_page_renders_not_found_for_signed_in_user() {
        let app = test::init_service(
            App::new()
                .app_data(context(true))
                .configure(configure_pages),
        )
        .await;

        let req = test::TestRequest::get().uri("/no/such/page").to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn limiter_rejects_zero_rate() {
        assert!(build_limiter("RATE_SCAN_PER_MIN", 0).is_err());
        assert!(build_limiter("RATE_SCAN_PER_MIN", 120).is_ok());
    }
}
