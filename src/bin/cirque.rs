//! cirque admin client binary
//!
//! Loads configuration, connects to the daemon's admin endpoint and runs
//! the session until it goes idle.

use cirque::transport::packet_channel;
use cirque::{ArgValue, CallConfig, Config, ConsoleSink, Session, UdpTransport};
use clap::Parser;
use std::path::PathBuf;
use tracing::{error, info, warn, Level};
use tracing_subscriber::{fmt, EnvFilter};

/// Admin client for a mesh routing daemon
#[derive(Parser, Debug)]
#[command(name = "cirque", version, about)]
struct Args {
    /// Path to configuration file (overrides default search paths)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Admin host (IP literal)
    #[arg(long)]
    host: Option<String>,

    /// Admin UDP port
    #[arg(long)]
    port: Option<u16>,

    /// Admin password
    #[arg(long)]
    password: Option<String>,

    /// Remote function to call once the session is ready
    function: Option<String>,

    /// Call arguments as KEY=VALUE
    #[arg(value_name = "KEY=VALUE", requires = "function")]
    args: Vec<String>,
}

/// Build the call requested on the command line.
fn cli_call(function: &str, args: &[String]) -> Result<CallConfig, String> {
    let mut call = CallConfig::new(function);
    for arg in args {
        let (key, value) = arg
            .split_once('=')
            .ok_or_else(|| format!("argument '{}' is not KEY=VALUE", arg))?;
        call.args.insert(key.to_string(), ArgValue::parse(value));
    }
    Ok(call)
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Initialize logging
    let filter = EnvFilter::builder()
        .with_default_directive(Level::INFO.into())
        .from_env_lossy();

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    let args = Args::parse();

    // Load configuration
    let (mut config, loaded_paths) = if let Some(config_path) = &args.config {
        // Explicit config file specified - load only that file
        match Config::load_file(config_path) {
            Ok(config) => (config, vec![config_path.clone()]),
            Err(e) => {
                error!("Failed to load configuration from {}: {}", config_path.display(), e);
                std::process::exit(1);
            }
        }
    } else {
        match Config::load() {
            Ok(result) => result,
            Err(e) => {
                error!("Failed to load configuration: {}", e);
                std::process::exit(1);
            }
        }
    };

    if loaded_paths.is_empty() {
        info!("No config files found, using defaults");
    } else {
        for path in &loaded_paths {
            info!(path = %path.display(), "Loaded config file");
        }
    }

    // Command line overrides
    if args.host.is_some() {
        config.admin.host = args.host;
    }
    if args.port.is_some() {
        config.admin.port = args.port;
    }
    if args.password.is_some() {
        config.admin.password = args.password;
    }

    let mut session = match Session::new(&config, ConsoleSink::new(config.admin.log_file())) {
        Ok(session) => session,
        Err(e) => {
            error!("Failed to create session: {}", e);
            std::process::exit(1);
        }
    };

    if let Some(function) = &args.function {
        let call = match cli_call(function, &args.args) {
            Ok(call) => call,
            Err(e) => {
                error!("Invalid call: {}", e);
                std::process::exit(2);
            }
        };
        if let Err(e) = session.queue_call(call) {
            error!("Failed to queue call: {}", e);
            std::process::exit(1);
        }
    }

    let (packet_tx, mut packet_rx) = packet_channel(64);
    let mut transport = UdpTransport::new(
        session.remote_addr(),
        config.transports.udp.clone(),
        packet_tx,
    );
    if let Err(e) = transport.start_async().await {
        error!("Failed to start transport: {}", e);
        std::process::exit(1);
    }

    let outcome = tokio::select! {
        result = session.run(&mut transport, &mut packet_rx) => Some(result),
        signal = tokio::signal::ctrl_c() => {
            if let Err(e) = signal {
                error!("Failed to listen for shutdown signal: {}", e);
            }
            None
        }
    };

    match outcome {
        Some(Ok(())) => info!("Session finished"),
        Some(Err(e)) => {
            error!("Session failed: {}", e);
            std::process::exit(1);
        }
        None => {
            info!("Shutdown signal received");
            session.stop("Interrupted");
            if let Err(e) = transport.stop_async().await {
                warn!("Error during shutdown: {}", e);
            }
        }
    }
}
