//! `route-dispatch` server binary.
//!
//! Loads configuration, registers the demo routes and serves them until
//! SIGINT/SIGTERM.

use std::path::PathBuf;

use axum::http::{Method, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use clap::Parser;
use serde_json::json;
use tokio::net::TcpListener;

use route_dispatch::config::{load_config, validate_config, ConfigError, RouterConfig};
use route_dispatch::lifecycle::{signals, Shutdown};
use route_dispatch::middleware::allowed_methods;
use route_dispatch::observability::{init_logging, init_metrics};
use route_dispatch::{Handler, HttpServer, PathParamsExt, Request, Router};

#[derive(Parser)]
#[command(name = "route-dispatch")]
#[command(about = "Method and path based HTTP router", long_about = None)]
struct Cli {
    /// TOML configuration file. Defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override `listener.bind_address`.
    #[arg(short, long)]
    bind: Option<String>,

    /// Print the route listing and exit.
    #[arg(long)]
    print_routes: bool,

    /// Print the listing as JSON.
    #[arg(long, requires = "print_routes")]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => RouterConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
        validate_config(&config).map_err(ConfigError::Validation)?;
    }

    let mut router = Router::from_config(&config);
    register_routes(&mut router);

    if cli.print_routes {
        if cli.json {
            println!("{}", serde_json::to_string_pretty(&router.routes())?);
        } else {
            print!("{router}");
        }
        return Ok(());
    }

    init_logging(&config.observability)?;
    tracing::info!("route-dispatch v{} starting", env!("CARGO_PKG_VERSION"));

    if config.observability.metrics_enabled {
        init_metrics(config.observability.metrics_address.parse()?)?;
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(
        address = %listener.local_addr()?,
        prefix = %config.routing.prefix,
        request_timeout_secs = config.timeouts.request_secs,
        "Listening for connections"
    );

    let shutdown = Shutdown::new();
    let server = HttpServer::new(router.into_dispatcher(), &config);
    let stop = shutdown.subscribe();
    tokio::spawn(async move { signals::ctrl_c(&shutdown).await });

    server.run(listener, stop).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

fn register_routes(router: &mut Router) {
    router
        .get("/", Handler::new(|_req: Request| async { "route-dispatch" }))
        .get(
            "/orgs/:oid",
            Handler::new(|req: Request| async move {
                format!("oid = {}", req.path_param("oid").unwrap_or_default())
            }),
        )
        .get(
            "/orgs/:oid/users/:uid",
            Handler::new(|req: Request| async move {
                format!(
                    "oid = {}, uid = {}",
                    req.path_param("oid").unwrap_or_default(),
                    req.path_param("uid").unwrap_or_default()
                )
            }),
        )
        .get(
            "/static/*filename",
            Handler::new(|req: Request| async move {
                format!("filename = {}", req.path_param("filename").unwrap_or_default())
            }),
        );

    let mut api = router.group("/api");
    let mut v1 = api.group("/v1");
    v1.get(
        "/users/:uid",
        Handler::new(|req: Request| async move {
            match req.path_params().parse::<u64>("uid") {
                Ok(uid) => Json(json!({ "id": uid })).into_response(),
                Err(err) => (StatusCode::BAD_REQUEST, err.to_string()).into_response(),
            }
        }),
    );
    v1.handle(
        None,
        "/echo",
        Handler::new(|req: Request| async move {
            let method = req.method().clone();
            let body = axum::body::to_bytes(req.into_body(), usize::MAX)
                .await
                .unwrap_or_default();
            format!("{method} {}", String::from_utf8_lossy(&body))
        }),
        vec![allowed_methods([Method::GET, Method::POST])],
    );
}
