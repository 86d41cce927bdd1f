use std::sync::atomic::AtomicUsize;
use std::sync::Arc;

mod companion;
mod config;
mod handler;
mod http;
mod logger;
mod lookup;
mod server;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Optional first argument: config file path (extension optional)
    let cfg = match std::env::args().nth(1) {
        Some(path) => config::Config::load_from(&path)?,
        None => config::Config::load()?,
    };
    logger::init(&cfg)?;

    // Worker threads default to the number of CPU cores
    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();
    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers);
    }
    let runtime = runtime_builder.build()?;

    runtime.block_on(async_main(cfg))
}

async fn async_main(cfg: config::Config) -> Result<(), Box<dyn std::error::Error>> {
    let addr = cfg.get_socket_addr()?;
    let listener = server::create_listener(addr).map_err(|e| {
        logger::log_error(&format!("Failed to bind {addr}: {e}"));
        format!("Failed to bind {addr}: {e}")
    })?;

    let lookup = Arc::new(lookup::from_config(&cfg.lookup, &cfg.packages));
    let resolver = handler::Resolver::new(lookup);
    let package_count = resolver.lookup().len();
    logger::log_server_start(&addr, &cfg, package_count);
    if resolver.lookup().is_empty() {
        logger::log_warning("No packages known; every /PKG request will answer 404");
    }

    let state = Arc::new(config::AppState::new(cfg, resolver));
    let shutdown = Arc::new(server::ShutdownSignal::new());
    server::start_signal_handler(Arc::clone(&shutdown))?;

    let companions = companion::Companions::start_all(&state.config.companions);
    if !companions.is_empty() {
        logger::log_info(&format!("{} companion process(es) running", companions.len()));
    }

    let result = server::run_server_loop(
        listener,
        state,
        Arc::new(AtomicUsize::new(0)),
        Arc::clone(&shutdown),
    )
    .await;

    companions.terminate_all().await;
    logger::log_shutdown_complete();

    result.map_err(Into::into)
}
