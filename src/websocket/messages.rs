//! WebSocket Message Types
//!
//! Outbound frame format. Clients never send anything the server interprets.

use serde::{Deserialize, Serialize};

/// One simulated metrics reading
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricsSample {
    /// CPU utilisation percentage, in [0, 100)
    pub cpu: f64,
    /// Memory in use (GB), in [1, 16)
    pub memory: f64,
    /// Unix epoch seconds
    pub timestamp: i64,
}

impl MetricsSample {
    /// Serialize into the text payload sent to clients
    pub fn to_payload(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
