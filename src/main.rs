use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{http::header, middleware::Logger, web, App, HttpServer};

use arena_server::{
    app_state::AppState, auth::JwtService, config::Config, handlers,
    middleware::RequestIdMiddleware,
};

fn cors(allowed_origin: Option<&str>) -> Cors {
    let cors = Cors::default()
        .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
        .allowed_headers(vec![header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers(vec![header::LOCATION])
        .max_age(3600);

    match allowed_origin {
        Some(origin) => cors.allowed_origin(origin),
        None => cors.allow_any_origin(),
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = Config::from_env();
    if config.is_production() {
        if let Err(e) = config.validate_for_production() {
            log::error!("Refusing to start: {}", e);
            return Err(std::io::Error::new(std::io::ErrorKind::InvalidInput, e));
        }
    }

    let jwt = Arc::new(JwtService::new(
        &config.jwt_secret,
        config.jwt_expiration_hours,
    ));

    let state = AppState::new(&config, jwt.clone()).await.map_err(|e| {
        log::error!("Failed to initialize application state: {}", e);
        std::io::Error::other(e.to_string())
    })?;

    let bind_address = (config.web_server_host.clone(), config.web_server_port);
    log::info!(
        "Starting HTTP server on {}:{}",
        bind_address.0,
        bind_address.1
    );

    let state = web::Data::new(state);
    let jwt = web::Data::from(jwt);
    let allowed_origin = config.cors_allowed_origin.clone();

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .app_data(jwt.clone())
            .wrap(cors(allowed_origin.as_deref()))
            .wrap(RequestIdMiddleware)
            .wrap(Logger::new(r#"%a "%r" %s %b %T req_id=%{x-request-id}o"#))
            .configure(handlers::configure)
    })
    .bind(bind_address)?
    .run()
    .await
}
