//! ChainGuard Server - WebSocket server for the ChainGuard protocol
//!
//! This crate exposes `QueryService` to remote clients as JSON-RPC 2.0
//! over WebSocket.
//!
//! The server supports:
//! - Multiple concurrent connections sharing one immutable service
//! - Lookup, batch, top-K, graph, report and info methods
//! - Public ids on the wire; real-id batches only when `allow_real_ids` is set

mod handlers;
mod protocol;
mod server;

pub use handlers::SharedService;
pub use protocol::{codes, Request, Response, RpcError};
pub use server::{process_message, ChainguardServer, ServerConfig, ServerError};
