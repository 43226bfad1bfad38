//! Core library for installing and launching Minecraft.
//!
//! The crate is organized around four cooperating parts: the
//! [`install::Installer`] resolves a version's metadata and materializes on
//! disk every artifact it needs (client JAR, assets, libraries, logger
//! configuration, JVM), the [`download`] engine verifies and fetches the
//! missing artifacts, the [`auth`] module manages Mojang and Microsoft
//! sessions whose tokens feed argument substitution, and [`launch::Start`]
//! composes and spawns the final JVM command line.
//!
//! The whole API is blocking; network transfers internally run on a
//! current-thread async runtime.

#![deny(unsafe_code)]

mod path;
mod http;
mod tokio;

pub mod serde;
pub mod platform;
pub mod rule;
pub mod context;
pub mod download;
pub mod manifest;
pub mod install;
pub mod auth;
pub mod launch;

pub use http::JsonRequestError;
pub use context::Context;
