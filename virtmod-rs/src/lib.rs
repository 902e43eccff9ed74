// Allow uninlined format args for cleaner error messages
#![allow(clippy::uninlined_format_args)]
#![doc = include_str!("../README.md")]

pub mod config;
pub mod error;
pub mod icon;
pub mod module_loader;
pub mod patch;
pub mod registry;
pub mod session;
pub mod sink;
pub mod sprite;
pub mod synth;
pub mod text;
pub mod watch;

#[macro_use]
extern crate lazy_static;

pub use config::PipelineConfig;
pub use error::{VirtModError, VirtModResult};
pub use module_loader::{LoaderChain, ModuleId, Resolution, VirtualModuleId};
pub use registry::{SpecifierRegistry, VirtualModuleKind, VIRTUAL_PREFIX};
pub use session::BuildSession;
pub use serde_json;
