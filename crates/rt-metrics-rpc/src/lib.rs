//! A small length-prefixed binary frame for reporting metrics over a raw
//! TCP connection, standing in for the generated RPC client/server stubs
//! that remain out of scope: a 4-byte big-endian length prefix followed by
//! a `bincode`-encoded [`Frame`].

mod frame;

pub use frame::{read_frame, write_frame, Frame, RpcError};

/// Default port the server's RPC listener binds, distinct from the HTTP
/// listener.
pub const DEFAULT_RPC_PORT: u16 = 8081;

/// Frames larger than this are rejected before any allocation, bounding the
/// damage a corrupt or hostile length prefix can do.
pub const MAX_FRAME_LEN: u32 = 16 * 1024 * 1024;
