//! BER/DER ASN.1 codec and structural validator
//!
//! This crate decodes, encodes and structurally validates X.690 BER/DER
//! data without a schema: certificates, keys, signatures and protocol
//! messages arrive as untrusted bytes and leave as checked primitive
//! values, or fail with a precise error.
//!
//! # Layout
//!
//! - [`tags`] — identifier octets (tag class, constructed bit, number)
//! - [`read`] — primitive reads and constructed/hole header reads
//! - [`write`] — canonical writers and size helpers
//! - [`time`] — UTCTime/GeneralizedTime codecs
//! - [`check`] — depth-bounded structural validation and object length
//!   resolution over adversarial input
//!
//! # Safety Model
//!
//! Nothing here trusts a declared length or nesting depth: lengths are
//! capped by the policy ceilings in `ber_core::limits`, recursion by an
//! explicit depth counter, and destination buffers by their own size with
//! truncating copies. A failed operation leaves a sticky error on the
//! stream so skipping a status check cannot silently continue on bad data.

pub mod check;
pub mod read;
pub mod tags;
pub mod time;
pub mod write;

pub use check::{
    check_object_encoding, check_object_encoding_with, get_long_object_length, get_object_length,
    get_stream_object_length,
};
pub use read::{Length, OidInfo};
pub use tags::{Tag, TagClass};
pub use write::{sizeof_length, sizeof_object, BerWriter};

pub use ber_core::{Asn1Error, Asn1Result, Limits, Snapshot, Stream};
