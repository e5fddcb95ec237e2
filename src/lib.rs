//! IP address resources of Internet PKI certificates.
//!
//! [RFC 3779] defines a certificate extension that lists the IP addresses a
//! certificate holder is entitled to. Addresses are given per address
//! family as a mix of prefixes and ranges. Since the same set of addresses
//! can be written in many ways, RFC 3779 requires a canonical form which
//! makes it possible to check whether the resources of one certificate are
//! covered by those of its issuer.
//!
//! This crate implements encoding, decoding, and rendering of the extension
//! as well as canonicalization and the coverage check. All of it lives in
//! the [`resources`] module. Errors are reported via [`ResourceError`].
//!
//! The crate uses the [log] crate for debug output when rejecting data. It
//! never installs a logger itself.
//!
//! [RFC 3779]: https://tools.ietf.org/html/rfc3779
//! [log]: https://crates.io/crates/log

pub use self::error::{ErrorKind, ResourceError};

pub mod error;
pub mod resources;
