//! API Handler
//!
//! Serializes every boundary call behind a single global mutex, decodes the
//! request, calls the application and encodes the answer.

use std::sync::{Mutex, MutexGuard};

use serde_json::{json, Value};

use crate::app::{FatalPolicy, KvStoreApplication};
use crate::observability::MetricsSnapshot;

use super::base64_bytes::encode;
use super::errors::{ApiError, ApiResult};
use super::request::{
    ApplySnapshotChunkRequest, LoadSnapshotChunkRequest, OfferSnapshotRequest, Request,
};
use super::response::Response;

/// API Handler with global execution lock
pub struct ApiHandler {
    /// The application; the mutex is the global lock
    app: Mutex<KvStoreApplication>,
}

impl ApiHandler {
    /// Create a new API handler
    pub fn new(app: KvStoreApplication) -> Self {
        Self {
            app: Mutex::new(app),
        }
    }

    /// Handle a raw JSON request string
    pub fn handle(&self, json_request: &str) -> Response {
        // Acquire global lock at request entry
        let mut app = match self.lock() {
            Ok(guard) => guard,
            Err(e) => return Response::error(&e),
        };

        let request = match Request::parse(json_request) {
            Ok(r) => r,
            Err(e) => return Response::error(&e),
        };

        match dispatch(&mut app, request) {
            Ok(data) => Response::success(data),
            Err(e) => Response::error(&e),
        }
    }

    /// True once the application stopped processing blocks
    pub fn is_halted(&self) -> bool {
        self.lock().map(|app| app.is_halted()).unwrap_or(true)
    }

    /// Halted under a policy that answers nothing afterwards
    pub fn should_stop(&self) -> bool {
        self.lock()
            .map(|app| app.is_halted() && app.policy() == FatalPolicy::Halt)
            .unwrap_or(true)
    }

    /// Why the application halted, if it did
    pub fn halt_reason(&self) -> Option<String> {
        match self.lock() {
            Ok(app) => app.halt_reason().map(str::to_string),
            Err(e) => Some(e.to_string()),
        }
    }

    pub fn metrics(&self) -> Option<MetricsSnapshot> {
        self.lock().ok().map(|app| app.metrics().snapshot())
    }

    fn lock(&self) -> ApiResult<MutexGuard<'_, KvStoreApplication>> {
        self.app.lock().map_err(|_| ApiError::lock_poisoned())
    }
}

fn dispatch(app: &mut KvStoreApplication, request: Request) -> ApiResult<Value> {
    match request {
        Request::Echo { message } => Ok(json!({ "message": message })),
        Request::Flush => Ok(json!({})),
        Request::Info => {
            let info = app.info()?;
            Ok(json!({
                "data": info.data,
                "version": info.version,
                "app_version": info.app_version,
                "last_block_height": info.last_block_height,
                "last_block_app_hash": encode(&info.last_block_app_hash),
            }))
        }
        Request::SetOption { key, value } => {
            let outcome = app.set_option(&key, &value)?;
            Ok(json!({ "code": outcome.code, "log": outcome.log }))
        }
        Request::InitChain { chain_id } => {
            app.init_chain(&chain_id)?;
            Ok(json!({}))
        }
        Request::BeginBlock { height } => {
            app.begin_block(height)?;
            Ok(json!({}))
        }
        Request::CheckTx { tx } => {
            let outcome = app.check_tx(&tx)?;
            Ok(json!({
                "code": outcome.code.as_u32(),
                "gas_wanted": outcome.gas_wanted,
            }))
        }
        Request::DeliverTx { tx } => {
            let code = app.deliver_tx(&tx)?;
            Ok(json!({ "code": code.as_u32() }))
        }
        Request::EndBlock { height } => {
            app.end_block(height)?;
            Ok(json!({}))
        }
        Request::Commit => {
            let outcome = app.commit()?;
            Ok(json!({ "data": encode(&outcome.data) }))
        }
        Request::Query { data } => {
            let outcome = app.query(&data)?;
            Ok(json!({
                "code": 0,
                "key": encode(&outcome.key),
                "value": outcome.value.as_deref().map(encode),
                "log": outcome.log(),
            }))
        }
        Request::ListSnapshots => {
            let snapshots = app.list_snapshots()?;
            Ok(json!({ "snapshots": snapshots }))
        }
        Request::OfferSnapshot(OfferSnapshotRequest { snapshot, app_hash }) => {
            let result = app.offer_snapshot(&snapshot, &app_hash)?;
            Ok(json!({ "result": result }))
        }
        Request::LoadSnapshotChunk(LoadSnapshotChunkRequest { height, format, chunk }) => {
            let bytes = app.load_snapshot_chunk(height, format, chunk)?;
            Ok(json!({ "chunk": encode(&bytes) }))
        }
        Request::ApplySnapshotChunk(ApplySnapshotChunkRequest { index, chunk, sender }) => {
            let outcome = app.apply_snapshot_chunk(index, &chunk, &sender)?;
            Ok(json!({
                "result": outcome.result,
                "refetch_chunks": outcome.refetch_chunks,
                "reject_senders": outcome.reject_senders,
            }))
        }
    }
}
