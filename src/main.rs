use std::sync::Arc;

use actix_web::middleware::NormalizePath;
use actix_web::web::Data;
use actix_web::{App, HttpServer, Responder, get};
use tracing::{error, info};
use tracing_appender::rolling;
use utoipa_swagger_ui::SwaggerUi;

use staffbook::auth::email_index::EmailIndex;
use staffbook::config::Config;
use staffbook::db::init_db;
use staffbook::docs::openapi_for;
use staffbook::media::CloudinaryMedia;
use staffbook::routes;
use staffbook::service::EmployeeService;
use staffbook::store::MySqlEmployeeStore;

#[get("/")]
async fn index() -> impl Responder {
    "Staffbook API is running"
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

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

    let pool = init_db(&config.database_url).await?;

    let email_index = Data::new(EmailIndex::new());
    let index_for_warmup = email_index.clone();
    let pool_for_warmup = pool.clone();
    actix_web::rt::spawn(async move {
        if let Err(e) = index_for_warmup.warmup(&pool_for_warmup, 500).await {
            error!(error = %e, "Failed to warm up email index");
        }
    });

    let media = CloudinaryMedia::new(config.cloudinary.clone())?;
    let service = Data::new(EmployeeService::new(
        Arc::new(MySqlEmployeeStore::new(pool.clone())),
        Arc::new(media),
        config.placeholder_image.clone(),
    ));

    let server_addr = config.server_addr.clone();
    let openapi = openapi_for(&config.api_prefix);
    let config_data = Data::new(config.clone());

    HttpServer::new(move || {
        App::new()
            .wrap(actix_web::middleware::Logger::default())
            .wrap(NormalizePath::trim())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}") // ← important: wildcard {_:.*} to match JS/CSS files
                    .url("/api-doc/openapi.json", openapi.clone()),
            )
            .app_data(Data::new(pool.clone()))
            .app_data(config_data.clone())
            .app_data(service.clone())
            .app_data(email_index.clone())
            .service(index)
            // Configure auth + protected routes with rate limiting
            .configure(|cfg| routes::configure(cfg, config.clone()))
    })
    .bind(server_addr)?
    .run()
    .await?;

    Ok(())
}
