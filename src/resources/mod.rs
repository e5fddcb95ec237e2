//! Handling of IP address resources.
//!
//! The types in this module implement the IP Address Delegation extension
//! defined in [RFC 3779]. The extension, represented by [`IpAddrBlocks`],
//! contains a set of IP addresses for each address family, represented by
//! [`IpResources`]. These sets are expressed as a list of prefixes and
//! ranges, each an [`IpBlock`].
//!
//! Addresses appear on the wire as bit-strings of varying length, kept
//! in [`AddrBits`]. For comparison, they are expanded into fixed width
//! [`RawAddr`]s.
//!
//! The same set of addresses can be expressed by many different lists of
//! blocks. The function [`canonicalize`] converts any list into the one
//! unique canonical list, while [`covers`] checks whether one canonical list
//! contains all the addresses of another one.
//!
//! [RFC 3779]: https://tools.ietf.org/html/rfc3779

pub use self::bits::{AddrBits, RawAddr, FILL_MAX, FILL_MIN, MAX_ADDR_LEN};
pub use self::block::{AddressRange, DisplayBlock, IpBlock};
pub use self::chain::{canonicalize, covers};
pub use self::choice::ResourcesChoice;
pub use self::family::{AddressFamily, FamilyId, Safi};
pub use self::ipres::{
    DisplayIpAddrBlocks, DisplayIpBlocks, IpAddrBlocks, IpAddrBlocksBuilder,
    IpBlocks, IpBlocksBuilder, IpResources,
};

mod bits;
mod block;
mod chain;
mod choice;
mod family;
mod ipres;
