#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_debug_implementations, missing_docs, rust_2018_idioms)]
#![deny(unreachable_pub)]

//! signon-core

pub mod code;
pub mod common;
pub mod error;
pub mod flow;
pub mod gate;
pub mod machine;
pub mod messages;
pub mod resend;
pub mod transport;
