//! # Mosaic
//!
//! Serves module pages composed by [`mosaic_render`]: each module's templates
//! are layered over a shared layout and rendered as a full document, or as a
//! bare fragment when the request carries the configured fragment header
//! (`HX-Request` by default).
//!
//! - [`config`]: YAML configuration
//! - [`app`]: catalog and template cache owned for the process lifetime
//! - [`routes`]: transport-free request classification and dispatch
//! - [`server`]: `tiny_http` worker pool
//! - [`cli`]: `serve`, `render` and `check` subcommands

pub mod app;
pub mod cli;
pub mod config;
pub mod routes;
pub mod server;

pub use app::{App, AppError};
pub use config::MosaicConfig;
