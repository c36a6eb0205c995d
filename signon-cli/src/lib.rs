#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_debug_implementations, rust_2018_idioms)]
#![deny(unreachable_pub)]

//! signon-cli

pub mod cli;
pub mod paths;
pub mod settings;
