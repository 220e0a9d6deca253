use std::{net::SocketAddr, path::Path, sync::Arc};

use clap::Parser;
use color_eyre::{
    Result,
    eyre::{Context, eyre},
};
use projects_gateway::{
    adapters::{HttpClientAdapter, HttpHandler},
    config::{GatewayConfig, GatewayConfigValidator, load_config},
    core::GatewayService,
    metrics,
    ports::http_client::HttpClient,
    tracing_setup,
    utils::graceful_shutdown::GracefulShutdown,
};

#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    #[clap(subcommand)]
    command: Option<Commands>,

    #[clap(short, long, default_value = "gateway.toml")]
    config: String,
}

#[derive(Parser, Debug)]
enum Commands {
    /// Validate configuration file
    Validate {
        /// Configuration file to validate
        #[clap(short, long, default_value = "gateway.toml")]
        config: String,
    },
    /// Initialize a new configuration file
    Init {
        /// Output path for the new config file
        #[clap(short, long, default_value = "gateway.toml")]
        config: String,
    },
    /// Start the gateway server (default)
    Serve {
        /// Configuration file to use
        #[clap(short, long, default_value = "gateway.toml")]
        config: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let args = Args::parse();

    let (command, config_path) = match args.command {
        Some(Commands::Validate { config }) => ("validate", config),
        Some(Commands::Init { config }) => ("init", config),
        Some(Commands::Serve { config }) => ("serve", config),
        None => ("serve", args.config),
    };

    match command {
        "validate" => {
            return validate_config_command(&config_path).await;
        }
        "init" => {
            return init_config_command(&config_path).await;
        }
        "serve" => {
            // Continue with normal server startup
        }
        _ => unreachable!(),
    }

    let provider = rustls::crypto::aws_lc_rs::default_provider();
    if let Err(e) = rustls::crypto::CryptoProvider::install_default(provider) {
        tracing::warn!(
            "CryptoProvider::install_default for aws-lc-rs reported an error: {:?}. \
            This can happen if a provider was already installed. \
            The application will proceed; ensure a crypto provider is effectively available.",
            e
        );
    }

    tracing_setup::init_tracing().map_err(|e| eyre!("Failed to initialize tracing: {}", e))?;

    metrics::init_metrics().map_err(|e| eyre!("Failed to initialize metrics: {}", e))?;

    tracing::info!("Loading configuration from {config_path}");

    let config: GatewayConfig = load_config(&config_path)
        .await
        .with_context(|| format!("Failed to load config from {config_path}"))?;

    // Any configuration defect is fatal; the gateway never serves with a
    // partial route table or an unusable secret.
    GatewayConfigValidator::validate(&config)
        .map_err(|e| eyre!("Configuration validation failed:\n{e}"))?;

    let config = Arc::new(config);

    let gateway_service = Arc::new(GatewayService::new(config.clone()));

    let http_client: Arc<dyn HttpClient> = Arc::new(
        HttpClientAdapter::new(gateway_service.response_timeout())
            .context("Failed to create HTTP client adapter")?,
    );

    let http_handler = Arc::new(HttpHandler::new(gateway_service.clone(), http_client));

    // Create graceful shutdown manager; subscribe before the signal handler
    // starts so a signal arriving early cannot be lost.
    let graceful_shutdown = Arc::new(GracefulShutdown::new());
    let shutdown_rx = graceful_shutdown.subscribe();
    let signal_handler_shutdown = graceful_shutdown.clone();
    tokio::spawn(async move {
        if let Err(e) = signal_handler_shutdown.run_signal_handler().await {
            tracing::error!("Signal handler error: {}", e);
        }
    });

    let addr: SocketAddr = config
        .listen_addr
        .parse()
        .context("Failed to parse listen address")?;

    for binding in &config.routes {
        tracing::info!(
            "Configured route: {} -> {}{}",
            binding.public_prefix,
            binding.upstream,
            binding.internal_prefix
        );
    }

    use std::convert::Infallible;

    use axum::{Router, body::Body, extract::Request, response::Response, routing::any};
    use tower_http::trace::TraceLayer;

    let make_request_route = |handler: Arc<HttpHandler>| {
        any(move |req: Request| {
            let handler = handler.clone();
            async move {
                match handler.handle_request(req).await {
                    Ok(response) => Ok::<Response<Body>, Infallible>(response),
                    Err(e) => {
                        tracing::error!("Request handling error: {:?}", e);
                        let error_response = Response::builder()
                            .status(500)
                            .body(Body::from("Internal Server Error"))
                            .unwrap_or_else(|_| Response::new(Body::from("Internal Server Error")));
                        Ok(error_response)
                    }
                }
            }
        })
    };

    let app = Router::new()
        .route("/{*path}", make_request_route(http_handler.clone()))
        .route("/", make_request_route(http_handler.clone()))
        .layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    tracing::info!(
        "Gateway listening on {} ({} routes, {} exempt prefixes)",
        addr,
        gateway_service.route_count(),
        config.auth.exempt_prefixes.len()
    );

    let server_result = tokio::select! {
        result = axum::serve(listener, app) => {
            result.context("Server error")
        },
        shutdown_reason = GracefulShutdown::wait_for_shutdown_signal(shutdown_rx) => {
            tracing::info!("Shutdown signal received: {:?}", shutdown_reason);
            tracing::info!("Graceful shutdown completed");
            Ok(())
        }
    };

    server_result?;

    Ok(())
}

/// Validate configuration file and exit
async fn validate_config_command(config_path: &str) -> Result<()> {
    println!("Validating configuration file: {config_path}");

    if !Path::new(config_path).exists() {
        eprintln!("Error: Configuration file '{config_path}' not found");
        std::process::exit(1);
    }

    let config = match load_config(config_path).await {
        Ok(config) => {
            println!("Configuration parsing: OK");
            config
        }
        Err(e) => {
            eprintln!("Configuration parsing failed:");
            eprintln!("   {e}");
            std::process::exit(1);
        }
    };

    match GatewayConfigValidator::validate(&config) {
        Ok(()) => {
            println!("Configuration validation: OK");
            println!();
            println!("Configuration summary:");
            println!("   Listen address: {}", config.listen_addr);
            println!("   Routes: {}", config.routes.len());
            println!(
                "   Exempt prefixes: {}",
                config.auth.exempt_prefixes.len()
            );
            println!(
                "   Upstream response timeout: {}s",
                config.upstream.response_timeout_secs
            );
            Ok(())
        }
        Err(e) => {
            eprintln!("Configuration validation failed:");
            eprintln!("{e}");
            println!();
            println!("Common fixes:");
            println!("   - Ensure upstream URLs start with http:// or https://");
            println!("   - Verify listen address format (e.g., '127.0.0.1:8080')");
            println!("   - Use a verification secret of at least 32 bytes");
            println!("   - Start every prefix with '/'");
            std::process::exit(1);
        }
    }
}

/// Initialize a new configuration file
async fn init_config_command(config_path: &str) -> Result<()> {
    let path = Path::new(config_path);
    if path.exists() {
        eprintln!("Error: Configuration file '{config_path}' already exists");
        std::process::exit(1);
    }

    let default_config = r#"# Projects Gateway Configuration

# The address to listen on
listen_addr = "0.0.0.0:8080"

[auth]
# Shared secret for verifying bearer tokens (HS256). Must be at least
# 32 bytes; replace before deploying.
secret = "change-me-to-a-real-secret-of-32-bytes!"
# Paths under these prefixes skip credential verification.
exempt_prefixes = ["/projects/graphql"]

[upstream]
# Seconds to wait for an upstream to begin responding.
response_timeout_secs = 30

# Authenticated project API
[[routes]]
public_prefix = "/projects-cell/projects"
upstream = "http://projects-service:8080"
internal_prefix = "/api/v1/projects"

# Public GraphQL endpoint
[[routes]]
public_prefix = "/projects/graphql"
upstream = "http://search-service:8080"
internal_prefix = "/graphql"
"#;

    tokio::fs::write(path, default_config)
        .await
        .context("Failed to write config file")?;
    println!("Created default configuration at: {config_path}");
    println!("   Run 'projects-gateway serve --config {config_path}' to start the server");
    Ok(())
}
