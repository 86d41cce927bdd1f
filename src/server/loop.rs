// Server loop module
// Accepts connections until shutdown is requested

use std::sync::atomic::AtomicUsize;
use std::sync::Arc;
use tokio::net::TcpListener;

use super::connection::accept_connection;
use super::signal::ShutdownSignal;
use crate::config;
use crate::logger;

/// Accept connections on `listener` until `shutdown` fires, then close the
/// listener. Connections already being served finish in their own tasks.
pub async fn run_server_loop(
    listener: TcpListener,
    state: Arc<config::AppState>,
    active_connections: Arc<AtomicUsize>,
    shutdown: Arc<ShutdownSignal>,
) -> std::io::Result<()> {
    loop {
        tokio::select! {
            () = shutdown.wait() => break,

            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, peer_addr)) => {
                        accept_connection(stream, peer_addr, &state, &active_connections);
                    }
                    Err(e) => logger::log_error(&format!("Failed to accept connection: {e}")),
                }
            }
        }
    }

    let addr = listener.local_addr()?;
    drop(listener);
    logger::log_info(&format!("Stopped listening on {addr}"));
    Ok(())
}
