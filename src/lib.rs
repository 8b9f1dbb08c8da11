//! snipbox: the execution core of a multi-tenant snippet service
//!
//! Given program text plus a structured input value, return a computed
//! result or a classified error, without letting the snippet escape
//! its sandbox or corrupt the host.
//!
//! # Architecture
//!
//! This crate is organized by concern:
//!
//! ## Byte-buffer engine ([`buffer`])
//! - [`buffer::arena`]: shared backing store; views alias deliberately
//! - [`buffer::numeric`]: fixed-width and width-parameterized accessors
//! - [`buffer::encoding`]: text encodings, validity, transcoding
//! - [`buffer::search`]: linear-time scan primitives
//! - [`buffer::iter`]: live index/value/entry cursors
//!
//! ## Security screening ([`screen`])
//! - [`screen::scanner`]: literal-aware identifier extraction
//! - [`screen`]: the denylist and the verdict it produces
//!
//! ## Sandbox hosting ([`host`])
//! - [`host::scope`]: guest scope assembled from an allowlist
//! - [`host`]: per-invocation flow around the embedded interpreter
//!
//! ## Wire contract ([`wire`])
//! - [`wire`]: request/response shapes and the result codec
//!
//! ## Observability ([`observability`])
//! - [`observability::audit`]: structured audit events
//!
//! ## Configuration ([`config`])
//! - [`config::types`]: shared types and the error taxonomy
//! - [`config::limits`]: engine limits and hard constants
//! - [`config::validator`]: config-to-enforcement checks
//!
//! # Design principles
//!
//! 1. **Invocation-scoped everything** - no arena, scope, or verdict
//!    survives a run
//! 2. **Two independent capability barriers** - static screening plus
//!    scope stripping, one shared denylist
//! 3. **Errors are taxonomy, not strings** - every failure classifies
//!    as guest-attributable or host fault before it reaches the wire
//! 4. **Linear time under attacker control** - search, copy, and
//!    compare never go quadratic in submitted data

// Byte-buffer engine
pub mod buffer;

// Security screening
pub mod screen;

// Sandbox hosting seam
pub mod host;

// Wire contract
pub mod wire;

// Observability
pub mod observability;

// Configuration and shared types
pub mod config;

// CLI entrypoint wiring for the snipbox binary.
pub mod cli;

// Re-export commonly used types for convenience
pub use buffer::encoding::Encoding;
pub use buffer::{ByteBuffer, FillValue, Needle};
pub use config::limits::{EngineConfig, MAX_LENGTH};
pub use config::types::{
    EngineError, ExecutionOutcome, RangeCode, Result, Violation, ViolationKind,
};
pub use host::{GuestInterpreter, SandboxHost};
pub use screen::{Screener, SecurityVerdict};
pub use wire::{ResultCodec, WireRequest, WireResponse};
