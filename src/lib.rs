//! `sarcfs`: a transparent, copy-on-write FUSE view over a layered game
//! content tree, with SARC archives presented as ordinary directories.
//!
//! Layout follows the engine/mount-host split used throughout this crate:
//! [`engine`] holds every operation's logic and is free of any FUSE
//! dependency; [`filesystem`] and [`mount`] (built under the `vfs` feature)
//! adapt it to `fuser`. Everything below `engine` — [`content`], [`directory`],
//! [`archive`], [`handle`], [`descriptor`], [`domain`] — is the layered
//! resolution machinery described in the design notes.

pub mod archive;
pub mod cache;
pub mod content;
pub mod descriptor;
pub mod directory;
pub mod domain;
pub mod engine;
pub mod error;
pub mod handle;
pub mod path_util;

#[cfg(feature = "vfs")]
pub mod cli;
#[cfg(feature = "vfs")]
pub mod filesystem;
#[cfg(feature = "vfs")]
pub mod mount;

pub use engine::Engine;
pub use error::{Error, Result};
