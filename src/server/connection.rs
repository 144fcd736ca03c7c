// Connection handling module
// Accepts a single TCP connection and serves it on its own task

use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::{TokioIo, TokioTimer};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::config::{AppState, PerformanceConfig};
use crate::handler;
use crate::logger;

/// Accept and process a connection, checking limits and logging.
///
/// # Arguments
///
/// * `stream` - The TCP stream to handle
/// * `peer_addr` - The peer's socket address
/// * `state` - Shared application state
/// * `conn_counter` - Active connection counter
pub fn accept_connection(
    stream: tokio::net::TcpStream,
    peer_addr: SocketAddr,
    state: &Arc<AppState>,
    conn_counter: &Arc<AtomicUsize>,
) {
    // Increment counter first, then check limit
    let prev_count = conn_counter.fetch_add(1, Ordering::SeqCst);

    if let Some(max_conn) = state.config.performance.max_connections {
        if prev_count >= usize::try_from(max_conn).unwrap_or(usize::MAX) {
            // Exceeded limit: rollback counter and reject
            conn_counter.fetch_sub(1, Ordering::SeqCst);
            logger::log_warning(&format!(
                "Max connections reached: {prev_count}/{max_conn}. Connection from {peer_addr} rejected."
            ));
            drop(stream);
            return;
        }
    }

    if state.config.logging.access_log {
        logger::log_connection_accepted(&peer_addr);
    }

    handle_connection(stream, peer_addr, Arc::clone(state), Arc::clone(conn_counter));
}

/// Timeouts applied to one connection
#[derive(Debug, PartialEq, Eq)]
struct ConnectionTimeouts {
    keep_alive: bool,
    /// Limit on waiting for the next request's headers, idle gaps included
    header_read: Duration,
    /// Cap on the whole connection, only for single-request connections
    total: Option<Duration>,
}

impl ConnectionTimeouts {
    fn from_config(performance: &PerformanceConfig) -> Self {
        if performance.keep_alive_timeout > 0 {
            Self {
                keep_alive: true,
                header_read: Duration::from_secs(performance.keep_alive_timeout),
                total: None,
            }
        } else {
            Self {
                keep_alive: false,
                header_read: Duration::from_secs(performance.read_timeout),
                total: Some(Duration::from_secs(std::cmp::max(
                    performance.read_timeout,
                    performance.write_timeout,
                ))),
            }
        }
    }
}

/// Serve one connection on a spawned task.
///
/// Keep-alive connections stay open while the client sends a new request
/// within `keep_alive_timeout`. Without keep-alive the connection is bounded
/// by `max(read_timeout, write_timeout)`. The active counter is decremented
/// when it ends.
fn handle_connection(
    stream: tokio::net::TcpStream,
    peer_addr: SocketAddr,
    state: Arc<AppState>,
    conn_counter: Arc<AtomicUsize>,
) {
    tokio::spawn(async move {
        let io = TokioIo::new(stream);
        let timeouts = ConnectionTimeouts::from_config(&state.config.performance);

        let mut builder = http1::Builder::new();
        builder
            .timer(TokioTimer::new())
            .keep_alive(timeouts.keep_alive)
            .header_read_timeout(timeouts.header_read);

        let service_state = Arc::clone(&state);
        let conn = builder.serve_connection(
            io,
            service_fn(move |req| {
                handler::handle_request(req, Arc::clone(&service_state), peer_addr)
            }),
        );

        let result = match timeouts.total {
            Some(limit) => tokio::time::timeout(limit, conn).await,
            None => Ok(conn.await),
        };
        match result {
            Ok(Ok(())) => {}
            Ok(Err(err)) => logger::log_connection_error(&err),
            Err(_) => {
                logger::log_warning(&format!(
                    "Connection from {peer_addr} timed out after {} seconds",
                    timeouts.total.map_or(0, |d| d.as_secs())
                ));
            }
        }

        conn_counter.fetch_sub(1, Ordering::SeqCst);
    });
}
