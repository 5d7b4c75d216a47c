//! Container image boundary
//!
//! - [`engine`]: the [`engine::ImageEngine`] trait covering the four
//!   operations the sync pipeline needs (pull, retag, push, build)
//! - [`docker`]: implementation shelling out to the `docker` binary
//! - [`reference`]: `image[:tag]` reference parsing

pub mod docker;
pub mod engine;
pub mod reference;

pub use docker::DockerCli;
pub use engine::{EngineError, ImageEngine};
pub use reference::ImageRef;
