//! API request types
//!
//! One JSON object per call, discriminated by `type`. Byte fields are
//! base64. Fields the application ignores (genesis validators, evidence,
//! proofs) may be present and are skipped.

use serde::{Deserialize, Serialize};

use crate::app::Snapshot;

use super::base64_bytes;
use super::errors::{ApiError, ApiResult};

/// Offered snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OfferSnapshotRequest {
    pub snapshot: Snapshot,
    pub app_hash: Vec<u8>,
}

/// Chunk of a local snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadSnapshotChunkRequest {
    pub height: u64,
    pub format: u32,
    pub chunk: u32,
}

/// Chunk being restored
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplySnapshotChunkRequest {
    pub index: u32,
    pub chunk: Vec<u8>,
    pub sender: String,
}

/// Unified request envelope
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    Echo { message: String },
    Flush,
    Info,
    SetOption { key: String, value: String },
    InitChain { chain_id: String },
    BeginBlock { height: i64 },
    CheckTx { tx: Vec<u8> },
    DeliverTx { tx: Vec<u8> },
    EndBlock { height: i64 },
    Commit,
    /// Only `data` (the key) is read; path, height and prove are ignored
    Query { data: Vec<u8> },
    ListSnapshots,
    OfferSnapshot(OfferSnapshotRequest),
    LoadSnapshotChunk(LoadSnapshotChunkRequest),
    ApplySnapshotChunk(ApplySnapshotChunkRequest),
}

/// Block header; only the height is read
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct RawHeader {
    #[serde(default)]
    height: i64,
}

/// Raw request for parsing
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawRequest {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    key: Option<String>,
    #[serde(default)]
    value: Option<String>,
    #[serde(default)]
    chain_id: Option<String>,
    #[serde(default)]
    header: Option<RawHeader>,
    #[serde(default)]
    height: Option<i64>,
    #[serde(default)]
    tx: Option<String>,
    #[serde(default)]
    data: Option<String>,
    #[serde(default)]
    snapshot: Option<Snapshot>,
    #[serde(default)]
    app_hash: Option<String>,
    #[serde(default)]
    format: Option<u32>,
    #[serde(default)]
    chunk: Option<serde_json::Value>,
    #[serde(default)]
    index: Option<u32>,
    #[serde(default)]
    sender: Option<String>,
}

fn required_bytes(field: &'static str, value: Option<String>) -> ApiResult<Vec<u8>> {
    let text = value.ok_or_else(|| ApiError::invalid_request(format!("Missing {}", field)))?;
    base64_bytes::decode(&text)
        .map_err(|e| ApiError::invalid_request(format!("Invalid base64 in {}: {}", field, e)))
}

fn optional_bytes(field: &'static str, value: Option<String>) -> ApiResult<Vec<u8>> {
    match value {
        Some(text) => required_bytes(field, Some(text)),
        None => Ok(Vec::new()),
    }
}

fn non_negative_height(height: Option<i64>) -> ApiResult<u64> {
    let height = height.unwrap_or_default();
    u64::try_from(height)
        .map_err(|_| ApiError::invalid_request(format!("Invalid height: {}", height)))
}

impl Request {
    /// Parse a request from JSON string
    pub fn parse(json: &str) -> ApiResult<Self> {
        let raw: RawRequest = serde_json::from_str(json)
            .map_err(|e| ApiError::invalid_request(format!("Invalid JSON: {}", e)))?;

        match raw.kind.as_str() {
            "echo" => Ok(Request::Echo {
                message: raw.message.unwrap_or_default(),
            }),
            "flush" => Ok(Request::Flush),
            "info" => Ok(Request::Info),
            "set_option" => Ok(Request::SetOption {
                key: raw.key.unwrap_or_default(),
                value: raw.value.unwrap_or_default(),
            }),
            "init_chain" => Ok(Request::InitChain {
                chain_id: raw.chain_id.unwrap_or_default(),
            }),
            "begin_block" => {
                let header = raw
                    .header
                    .ok_or_else(|| ApiError::invalid_request("Missing header"))?;
                Ok(Request::BeginBlock {
                    height: header.height,
                })
            }
            "check_tx" => Ok(Request::CheckTx {
                tx: required_bytes("tx", raw.tx)?,
            }),
            "deliver_tx" => Ok(Request::DeliverTx {
                tx: required_bytes("tx", raw.tx)?,
            }),
            "end_block" => Ok(Request::EndBlock {
                height: raw.height.unwrap_or_default(),
            }),
            "commit" => Ok(Request::Commit),
            "query" => Ok(Request::Query {
                data: required_bytes("data", raw.data)?,
            }),
            "list_snapshots" => Ok(Request::ListSnapshots),
            "offer_snapshot" => Ok(Request::OfferSnapshot(OfferSnapshotRequest {
                snapshot: raw.snapshot.unwrap_or_default(),
                app_hash: optional_bytes("app_hash", raw.app_hash)?,
            })),
            "load_snapshot_chunk" => {
                let chunk = match raw.chunk {
                    Some(value) => serde_json::from_value::<u32>(value).map_err(|e| {
                        ApiError::invalid_request(format!("Invalid chunk index: {}", e))
                    })?,
                    None => 0,
                };
                Ok(Request::LoadSnapshotChunk(LoadSnapshotChunkRequest {
                    height: non_negative_height(raw.height)?,
                    format: raw.format.unwrap_or_default(),
                    chunk,
                }))
            }
            "apply_snapshot_chunk" => {
                let chunk = match raw.chunk {
                    Some(serde_json::Value::String(text)) => required_bytes("chunk", Some(text))?,
                    Some(_) => return Err(ApiError::invalid_request("chunk must be base64")),
                    None => Vec::new(),
                };
                Ok(Request::ApplySnapshotChunk(ApplySnapshotChunkRequest {
                    index: raw.index.unwrap_or_default(),
                    chunk,
                    sender: raw.sender.unwrap_or_default(),
                }))
            }
            other => Err(ApiError::unknown_operation(other)),
        }
    }
}
