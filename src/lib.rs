//! Local habitat for two chat personas, Cipher and Vexis.
//!
//! Personas proxy messages to a hosted completion API and keep their conversation
//! history in append-only, line-delimited JSON streams. The streams are the single
//! source of truth: every exchange is appended, and the context a persona sees is
//! rebuilt from the tail of its stream on each request.
//!
//! # Streams
//!
//! | Stream | Default path | Written by |
//! |--------|--------------|------------|
//! | **root** | `memory/streams/root_memory.jsonl` | Cipher chat, `/cipher/log`, CLI notes |
//! | **vexis** | `memory/streams/vexis_memory.jsonl` | Vexis chat, handshakes |
//!
//! Each line is one self-contained JSON object. A truncated or malformed line never
//! stops the rest of the stream from being read.
//!
//! # Modules
//!
//! - [`config`]: Configuration loading from TOML files and environment variables
//! - [`memory`]: Append-only streams: append, tail, dialogue reconstruction, search
//! - [`completion`]: The external completion service and its OpenAI-compatible client
//! - [`persona`]: Cipher and Vexis: replies, fallbacks, and the entries they log
//! - [`seed`]: Persona seed documents and the in-process registry
//! - [`server`]: axum HTTP routes over all of the above

pub mod completion;
pub mod config;
pub mod host;
pub mod memory;
pub mod persona;
pub mod seed;
pub mod server;
