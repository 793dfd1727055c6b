//! `vbs` — presents a scattered, multi-disk VLBI recording as a single
//! logically contiguous, seekable byte stream.
//!
//! Module map (leaves first):
//! - [`path_utils`]    — `escape` / `is_mountpoint`
//! - [`chunk`]          — the chunk record and the ordered chunk set
//! - [`discovery`]      — scattered / block-header discovery strategies
//! - [`vfile`]          — the virtual-file model
//! - [`handle_table`]   — process-wide handle -> virtual file mapping
//! - [`io_engine`]      — `open`/`read`/`seek`/`close`
//! - [`abi`]            — C-ABI shim over `io_engine`
//! - [`error`]          — the `VbsError` taxonomy and `errno` mapping
//! - [`config`]         — compile-time/env-overridable constants
//! - [`threadpool`]     — bounded worker pool backing block-header discovery
//! - [`cli`]            — argument parsing and display-level plumbing for `vbsutil`

pub mod abi;
pub mod chunk;
pub mod cli;
pub mod config;
pub mod discovery;
pub mod error;
pub mod handle_table;
pub mod io_engine;
pub mod path_utils;
pub mod threadpool;
pub mod vfile;

pub use discovery::Layout;
pub use error::{VbsError, VbsResult};
pub use io_engine::{close, open, open_block_header, open_scattered, read, seek, Handle, Whence};
