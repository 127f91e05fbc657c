use std::{process, sync::Arc, time::Duration};

use quire::{
    application::{
        error::AppError, gateway::ContentGateway, render::render_json, warmer::CacheWarmer,
    },
    cache::{CacheConfig, MemoryCacheStore},
    config,
    infra::{
        cms::HttpContentSource,
        error::InfraError,
        http::{self, AppState},
        telemetry,
    },
};
use tokio::try_join;
use tracing::{Dispatch, Level, dispatcher, error, info, warn};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()
        .map_err(|err| AppError::unexpected(format!("failed to load configuration: {err}")))?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(Box::<config::ServeArgs>::default()));

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    match command {
        config::Command::Serve(_) => run_serve(settings).await,
        config::Command::Render(args) => run_render(args).await,
    }
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let cache_config = CacheConfig::from(&settings.cache);
    let store = Arc::new(MemoryCacheStore::new(cache_config.capacity));
    let source = Arc::new(HttpContentSource::new(&settings.cms)?);
    let gateway = Arc::new(ContentGateway::new(source, store, cache_config.ttl));
    let warmer = Arc::new(CacheWarmer::new(
        gateway.clone(),
        settings.warm.page_size.get(),
    ));

    if !cache_config.is_enabled() {
        warn!(
            target = "quire::serve",
            "cache duration is not positive; every read goes to the content source"
        );
    } else if cache_config.warm_on_startup {
        warmer.warm_on_startup().await;
    }

    let state = AppState::new(gateway, warmer);
    serve_http(&settings, state).await
}

async fn run_render(args: config::RenderArgs) -> Result<(), AppError> {
    let raw = tokio::fs::read(&args.file)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;
    let document: serde_json::Value = serde_json::from_slice(&raw).map_err(|err| {
        AppError::unexpected(format!(
            "`{}` is not a JSON document: {err}",
            args.file.display()
        ))
    })?;

    println!("{}", render_json(&document));
    Ok(())
}

async fn serve_http(settings: &config::Settings, state: AppState) -> Result<(), AppError> {
    let public_router = http::build_public_router(state.clone());
    let admin_router = http::build_admin_router(state);

    let public_listener = tokio::net::TcpListener::bind(settings.server.public_addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;
    let admin_listener = tokio::net::TcpListener::bind(settings.server.admin_addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;

    info!(
        target = "quire::serve",
        public = %settings.server.public_addr,
        admin = %settings.server.admin_addr,
        "listening"
    );

    let grace = settings.server.graceful_shutdown;
    let public_server = axum::serve(public_listener, public_router.into_make_service())
        .with_graceful_shutdown(shutdown_signal(grace));
    let admin_server = axum::serve(admin_listener, admin_router.into_make_service())
        .with_graceful_shutdown(shutdown_signal(grace));

    try_join!(public_server, admin_server)
        .map_err(|err| AppError::unexpected(format!("server error: {err}")))?;

    Ok(())
}

/// Resolves on Ctrl-C. In-flight requests get `grace` before the process exits anyway.
async fn shutdown_signal(grace: Duration) {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(target = "quire::serve", error = %err, "failed to listen for shutdown signal");
        return;
    }
    info!(target = "quire::serve", "shutdown requested");
    tokio::spawn(async move {
        tokio::time::sleep(grace).await;
        warn!(target = "quire::serve", "graceful shutdown timed out");
        process::exit(0);
    });
}
