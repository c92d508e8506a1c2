//! Slow-start style discovery of a server's maximum accepted payload size

#![warn(
    clippy::cognitive_complexity,
    clippy::dbg_macro,
    clippy::debug_assert_with_mut_call,
    clippy::doc_link_with_quotes,
    clippy::doc_markdown,
    clippy::empty_line_after_outer_attr,
    clippy::empty_structs_with_brackets,
    clippy::float_cmp,
    clippy::float_cmp_const,
    clippy::float_equality_without_abs,
    keyword_idents,
    missing_copy_implementations,
    missing_debug_implementations,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    non_ascii_idents,
    noop_method_call,
    clippy::option_if_let_else,
    clippy::print_stderr,
    clippy::print_stdout,
    clippy::semicolon_if_nothing_returned,
    clippy::unseparated_literal_suffix,
    clippy::shadow_unrelated,
    clippy::similar_names,
    clippy::suspicious_operation_groupings,
    unused_extern_crates,
    unused_import_braces,
    clippy::unused_self,
    clippy::use_debug,
    clippy::used_underscore_binding,
    clippy::useless_let_if_seq,
    clippy::wildcard_dependencies,
    clippy::wildcard_imports
)]

/// Wire tokens and codec
mod codec;

/// Errors
mod errors;

/// Probe payload generation
mod payload;

/// Utils
mod utils;

/// Window growth state machine
pub mod window;

/// Acceptance oracle
pub mod oracle;

/// Session loop
pub mod controller;

/// Probe client
pub mod client;

/// Oracle server
#[cfg(feature = "tokio-rt")]
pub mod server;


pub use errors::{ChannelError, CodecError, Error, Result};

/// The answer of the oracle to one probe.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Verdict {
    /// The payload fits in the server window, answered with `ACK\n`.
    Accept,
    /// The payload overflows the server window, answered with `NAK\n`.
    Reject,
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Verdict::Accept => write!(f, "ACK"),
            Verdict::Reject => write!(f, "NAK"),
        }
    }
}
