//! WebSocket Real-Time Streaming
//!
//! Pushes metrics samples to dashboard clients over WebSocket.
//!
//! ## Architecture
//!
//! - **ConnectionHub**: Registry of all live connections
//! - **Dispatcher**: Rate-limited fanout over a hub snapshot
//! - **Handler**: WebSocket upgrade and per-connection lifecycle
//! - **Messages**: Outbound frame format
//!
//! ## Example
//!
//! ```javascript
//! // Browser
//! const ws = new WebSocket('ws://localhost:8000/ws');
//!
//! ws.onmessage = (event) => {
//!   const { cpu, memory, timestamp } = JSON.parse(event.data);
//!   console.log(cpu, memory, timestamp);
//! };
//! ```

mod connection;
mod dispatcher;
mod handler;
mod hub;
mod messages;

pub use connection::{Connection, ConnectionError, ConnectionHandle, WsConnection};
pub use dispatcher::{Dispatcher, RateGate};
pub use handler::websocket_handler;
pub use hub::{ConnectionHub, ConnectionId};
pub use messages::MetricsSample;
