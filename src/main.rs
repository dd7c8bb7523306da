use std::sync::Arc;

use actix_web::middleware::NormalizePath;
use actix_web::web::Data;
use actix_web::{App, HttpServer, Responder, get};
use dotenvy::dotenv;

use leavedesk::api::AppState;
use leavedesk::config::Config;
use leavedesk::db::init_db;
use leavedesk::docs::ApiDoc;
use leavedesk::events::{self, EventOutbox, TracingAuditSink, TracingNotifier};
use leavedesk::leave::lifecycle::LeaveService;
use leavedesk::routes;
use leavedesk::store::MySqlStore;

use tracing::info;
use tracing_appender::rolling;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[get("/")]
async fn index() -> impl Responder {
    "Hello World!"
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();

    let config = Config::from_env();

    // Rolling daily log
    let file_appender = rolling::daily("logs", "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_target(false) // removes module path
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .pretty()
        .init();

    info!("Server starting...");

    let pool = init_db(&config.database_url).await;

    let (outbox, outbox_rx) = EventOutbox::channel();
    let service = LeaveService::new(Arc::new(MySqlStore::new(pool)), outbox);
    let state = AppState { service };

    // Decision fan-out runs outside the request path; a slow notification
    // channel never blocks a review.
    actix_web::rt::spawn(events::drain(
        outbox_rx,
        Arc::new(TracingNotifier),
        Arc::new(TracingAuditSink),
    ));

    let server_addr = config.server_addr.clone();
    let config_data = config.clone();

    HttpServer::new(move || {
        App::new()
            .wrap(actix_web::middleware::Logger::default())
            .wrap(NormalizePath::trim())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}") // ← important: wildcard {_:.*} to match JS/CSS files
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .app_data(Data::new(state.clone()))
            .app_data(Data::new(config.clone()))
            .service(index)
            .configure(|cfg| routes::configure(cfg, config_data.clone()))
    })
    .bind(server_addr)?
    .run()
    .await
}
