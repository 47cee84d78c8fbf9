//! Codegen of layered endpoint servers for `poem-kit`.
//!
//! For every unary method of a gRPC service the generator emits a request
//! adapter, a pass-through codec, a transport handler and a per-method
//! pipeline builder, plus one server type per service that applies tracing,
//! middlewares, telemetry and transport options in a fixed order:
//!
//! ```text
//! endpoint -> trace -> middlewares (first to last) -> telemetry -> options
//! ```
//!
//! Use [`Config`] from a build script, or the `protoc-gen-poem-kit` plugin
//! with `protoc`.

#![doc(html_favicon_url = "https://raw.githubusercontent.com/poem-web/poem/master/favicon.ico")]
#![doc(html_logo_url = "https://raw.githubusercontent.com/poem-web/poem/master/logo.png")]
#![forbid(unsafe_code)]
#![deny(unreachable_pub)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]

mod client;
mod config;
mod descriptor;
mod error;
mod model;
mod server;
mod service_generator;
mod utils;

pub mod pipeline;
pub mod unit;

use std::path::Path;

pub use config::{Config, Features};
pub use error::{GeneratorError, GeneratorResult};
pub use model::{Method, ProtoFile, Service};
pub use unit::{generate, Artifact, ArtifactKind, GeneratedUnit, ServiceBlock};

/// Compile .proto files into Rust files during a Cargo build with default
/// options.
pub fn compile_protos(
    protos: &[impl AsRef<Path>],
    includes: &[impl AsRef<Path>],
) -> std::io::Result<()> {
    Config::new().compile(protos, includes)
}
