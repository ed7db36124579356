//! Core types and utilities for BER/DER ASN.1 processing
//!
//! This crate provides the error taxonomy, the sticky-error stream cursor,
//! and the decoding policy limits shared by the codec crates.

pub mod error;
pub mod limits;
pub mod stream;

pub use error::{Asn1Error, Asn1Result};
pub use limits::Limits;
pub use stream::{Snapshot, Stream};
