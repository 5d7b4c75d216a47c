//! Release-synchronization orchestrator.
//!
//! Watches upstream version sources (GitHub releases/tags, Docker Hub tag
//! listings) and, when a new version appears, mirrors or rebuilds the
//! corresponding container images into a private registry, records the newly
//! seen version in a flat-file store, and opens a change request for the
//! version bump.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │   Source    │────▶│  Pipeline   │────▶│   Submit    │
//! │  (latest)   │     │ (orchestr.) │     │ (change PR) │
//! └─────────────┘     └─────────────┘     └─────────────┘
//!                        │        │
//!                        ▼        ▼
//!                 ┌──────────┐ ┌──────────┐
//!                 │  Store   │ │  Image   │
//!                 │ (state)  │ │ (engine) │
//!                 └──────────┘ └──────────┘
//! ```
//!
//! # Modules
//!
//! - [`config`]: declarative sync configuration and operation timeouts
//! - [`source`]: version source trait and implementations
//! - [`store`]: persisted per-key version records
//! - [`transform`]: declarative version transformation rules
//! - [`image`]: container engine boundary (pull/tag/push/build)
//! - [`sync`]: strategy expansion and the sync pipeline
//! - [`submit`]: change-request submission
//! - [`storage`]: sibling artifact-upload flow (object storage)

pub mod config;
pub mod image;
pub mod source;
pub mod storage;
pub mod store;
pub mod submit;
pub mod sync;
pub mod transform;
