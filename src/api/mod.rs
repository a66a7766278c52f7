//! API Layer for kvstore
//!
//! The API Layer exposes the application behind a single global lock.
//!
//! # Design Principles
//!
//! - Single global mutex for all calls
//! - One JSON object per request, one per response
//! - Error codes passed through unchanged
//! - Byte fields are base64
//!
//! # Supported Calls
//!
//! - echo, flush, info, set_option
//! - init_chain, begin_block, check_tx, deliver_tx, end_block, commit
//! - query
//! - list_snapshots, offer_snapshot, load_snapshot_chunk, apply_snapshot_chunk

pub mod base64_bytes;
mod errors;
mod handler;
mod request;
mod response;

pub use errors::{ApiError, ApiErrorCode, ApiResult, Severity};
pub use handler::ApiHandler;
pub use request::{
    ApplySnapshotChunkRequest, LoadSnapshotChunkRequest, OfferSnapshotRequest, Request,
};
pub use response::{ErrorResponse, Response, SuccessResponse};
