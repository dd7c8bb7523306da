use crate::{
    api::{balance, calendar, export, leave_request},
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::web;
use std::sync::Arc;

pub fn configure(cfg: &mut web::ServiceConfig, config: Config) {
    // Helper to build per-route limiter
    fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
        let per_ms = if requests_per_min == 0 {
            1
        } else {
            60_000 / requests_per_min as u64
        };
        let cfg = GovernorConfigBuilder::default()
            .per_millisecond(per_ms)
            .burst_size(requests_per_min)
            .key_extractor(PeerIpKeyExtractor)
            .finish()
            .unwrap();
        Governor::new(&cfg)
    }

    let protected_limiter = Arc::new(build_limiter(config.rate_protected_per_min));
    let export_limiter = Arc::new(build_limiter(config.rate_export_per_min));

    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(protected_limiter) // rate limiting; JWT checked per-handler
            .service(
                web::scope("/leave")
                    // /leave
                    .service(
                        web::resource("")
                            .route(web::get().to(leave_request::leave_list))
                            .route(web::post().to(leave_request::create_leave)),
                    )
                    // fixed segments must register before /{id}
                    .service(
                        web::resource("/balances").route(web::get().to(balance::balance_list)),
                    )
                    .service(
                        web::resource("/calendar").route(web::get().to(calendar::calendar_view)),
                    )
                    .service(
                        web::resource("/export")
                            .wrap(export_limiter)
                            .route(web::get().to(export::export_csv)),
                    )
                    // /leave/{id}
                    .service(web::resource("/{id}").route(web::get().to(leave_request::get_leave)))
                    // /leave/{id}/review
                    .service(
                        web::resource("/{id}/review")
                            .route(web::post().to(leave_request::review_leave)),
                    ),
            ),
    );
}
