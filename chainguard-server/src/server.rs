//! WebSocket server implementation.
//!
//! Handles client connections and routes messages to handlers.

use crate::handlers::{
    handle_batch, handle_graph, handle_info, handle_lookup, handle_report, handle_top,
    SharedService,
};
use crate::protocol::{
    BatchParams, GraphParams, LookupParams, ReportParams, Request, Response, TopParams,
};
use chainguard_graph::{IdMode, QueryService};
use futures_util::{SinkExt, StreamExt};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::{accept_async, tungstenite::Message};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Server configuration.
#[derive(Debug, Clone, Copy)]
pub struct ServerConfig {
    /// Address to bind to.
    pub addr: SocketAddr,
    /// Accept `risk.batch` requests in real-id mode. Off by default: a
    /// client that can send real ids can map them to public ids.
    pub allow_real_ids: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([127, 0, 0, 1], 7432)),
            allow_real_ids: false,
        }
    }
}

/// The ChainGuard WebSocket server.
pub struct ChainguardServer {
    config: ServerConfig,
    service: SharedService,
}

impl ChainguardServer {
    /// Creates a new server around a fully loaded query service.
    pub fn new(service: QueryService, config: ServerConfig) -> Self {
        Self {
            config,
            service: Arc::new(service),
        }
    }

    /// Runs the server, accepting connections forever.
    pub async fn run(&self) -> Result<(), ServerError> {
        let listener = TcpListener::bind(&self.config.addr).await?;
        info!("ChainGuard server listening on {}", self.config.addr);
        if self.config.allow_real_ids {
            warn!("Real-id batch requests are enabled");
        }

        loop {
            match listener.accept().await {
                Ok((stream, addr)) => {
                    let conn_id = Uuid::new_v4();
                    debug!(%conn_id, "New connection from {}", addr);
                    let service = self.service.clone();
                    let config = self.config;
                    tokio::spawn(async move {
                        if let Err(e) =
                            handle_connection(stream, addr, conn_id, service, config).await
                        {
                            error!(%conn_id, "Connection error from {}: {}", addr, e);
                        }
                    });
                }
                Err(e) => {
                    error!("Accept error: {}", e);
                }
            }
        }
    }
}

/// Handles a single WebSocket connection.
async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    conn_id: Uuid,
    service: SharedService,
    config: ServerConfig,
) -> Result<(), ServerError> {
    let ws_stream = accept_async(stream).await?;
    info!(%conn_id, "WebSocket connection established with {}", addr);

    let (mut write, mut read) = ws_stream.split();

    while let Some(msg) = read.next().await {
        let msg = match msg {
            Ok(m) => m,
            Err(e) => {
                warn!(%conn_id, "Message error from {}: {}", addr, e);
                break;
            }
        };

        if msg.is_close() {
            debug!(%conn_id, "Client {} disconnected", addr);
            break;
        }

        if msg.is_ping() {
            write.send(Message::Pong(msg.into_data())).await?;
            continue;
        }

        if msg.is_text() {
            let text = msg.to_text().unwrap_or("");
            let response = process_message(text, &service, &config);
            let json = serde_json::to_string(&response)?;
            write.send(Message::Text(json)).await?;
        }
    }

    info!(%conn_id, "Connection closed: {}", addr);
    Ok(())
}

fn parse_params<P: DeserializeOwned>(params: Value) -> Result<P, String> {
    // A request without params is treated like one with an empty object,
    // so methods whose params all have defaults can omit them.
    let params = if params.is_null() {
        Value::Object(Default::default())
    } else {
        params
    };
    serde_json::from_value(params).map_err(|e| e.to_string())
}

/// Processes a JSON-RPC message and returns a response.
pub fn process_message(text: &str, service: &QueryService, config: &ServerConfig) -> Response {
    let request: Request = match serde_json::from_str(text) {
        Ok(r) => r,
        Err(_) => return Response::parse_error(),
    };

    let id = request.id.clone();
    if !request.jsonrpc.is_empty() && request.jsonrpc != "2.0" {
        return Response::invalid_request(id, "Only JSON-RPC 2.0 is supported");
    }

    let method = request.method.as_str();
    debug!("Processing method: {}", method);

    match method {
        "risk.info" => handle_info(service, id),

        "risk.lookup" => match parse_params::<LookupParams>(request.params) {
            Ok(params) => handle_lookup(service, id, params),
            Err(e) => Response::invalid_params(id, e),
        },

        "risk.batch" => match parse_params::<BatchParams>(request.params) {
            Ok(params) if params.mode == IdMode::Real && !config.allow_real_ids => {
                warn!("Refused real-id batch of {} ids", params.ids.len());
                Response::invalid_params(id, "Real-id mode is disabled on this server")
            }
            Ok(params) => handle_batch(service, id, params),
            Err(e) => Response::invalid_params(id, e),
        },

        "risk.top" => match parse_params::<TopParams>(request.params) {
            Ok(params) => handle_top(service, id, params),
            Err(e) => Response::invalid_params(id, e),
        },

        "risk.graph" => match parse_params::<GraphParams>(request.params) {
            Ok(params) => handle_graph(service, id, params),
            Err(e) => Response::invalid_params(id, e),
        },

        "risk.report" => match parse_params::<ReportParams>(request.params) {
            Ok(params) => handle_report(service, id, params),
            Err(e) => Response::invalid_params(id, e),
        },

        _ => Response::method_not_found(id, method),
    }
}
