//! Protocol module - line-delimited JSON for out-of-process advisors
//!
//! One message per line. Every message carries a `type` field:
//!
//! ```text
//! {"type":"request","turn_id":3,"width":11,...}
//! {"type":"response","turn_id":3,"suggestion":{"rotation":"East","x":4,"y":18,"score":-3.2}}
//! ```

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::core::advice::{AdviceRequest, AdviceResponse};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AdvisorMessage {
    Request(AdviceRequest),
    Response(AdviceResponse),
}

impl AdvisorMessage {
    pub fn turn_id(&self) -> u64 {
        match self {
            AdvisorMessage::Request(req) => req.turn_id,
            AdvisorMessage::Response(resp) => resp.turn_id,
        }
    }
}

/// Serialize one message, newline included
pub fn encode_line(msg: &AdvisorMessage) -> Result<String, serde_json::Error> {
    let mut line = serde_json::to_string(msg)?;
    line.push('\n');
    Ok(line)
}

pub fn decode_line(line: &str) -> Result<AdvisorMessage> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        bail!("empty advisor line");
    }
    serde_json::from_str(trimmed)
        .with_context(|| format!("malformed advisor message: {}", trimmed))
}
