//! Pipeline stages for brick identification.
//!
//! Each submodule implements exactly one step and can be tested on its own.
//!
//! ## Data Flow
//!
//! ```text
//! validate ──▶ upload ──▶ normalize
//! (path)       (HTTP)     (JSON → ResultSet)
//! ```
//!
//! 1. [`validate`]: presence, existence and extension of the caller's path
//! 2. [`upload`]: multipart POST to the recognition service; the only
//!    stage with network I/O
//! 3. [`normalize`]: flatten the nested reply into ordered candidates;
//!    pure and infallible

pub mod normalize;
pub mod upload;
pub mod validate;
