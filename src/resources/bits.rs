//! Addresses as bit-strings and as raw fixed-width buffers.
//!
//! On the wire, RFC 3779 expresses every address as a BIT STRING: a number
//! of octets of which the last one may have a number of unused trailing
//! bits. The number of significant bits doubles as the prefix length. To
//! compare such a bit-string against anything, it has to be expanded into a
//! raw address of the family’s width with the unspecified trailing bits
//! filled in. Filling with zero bits gives the smallest address covered,
//! filling with one bits the largest.

use std::{fmt, io};
use std::net::{Ipv4Addr, Ipv6Addr};
use bcder::{decode, encode};
use bcder::{Mode, Tag};
use bcder::decode::{DecodeError, Source};
use bytes::Bytes;
use crate::error::ResourceError;


//------------ Constants -----------------------------------------------------

/// The largest raw address width in octets.
pub const MAX_ADDR_LEN: usize = 16;

/// The fill octet producing the smallest address of a bit-string.
pub const FILL_MIN: u8 = 0x00;

/// The fill octet producing the largest address of a bit-string.
pub const FILL_MAX: u8 = 0xFF;


//------------ AddrBits ------------------------------------------------------

/// An address given as a bit-string.
///
/// The value consists of up to sixteen octets and the number of unused bits
/// in the final octet. It is immutable once created.
#[derive(Clone, Eq, Hash, PartialEq)]
pub struct AddrBits {
    /// The octets of the bit-string.
    octets: Bytes,

    /// The number of unused bits in the last octet.
    ///
    /// This is never more than seven and zero if there are no octets.
    unused: u8,
}

impl AddrBits {
    /// Creates a new bit-string prefix from its octets and unused bits.
    ///
    /// Returns an error if there are more than sixteen octets, more than
    /// seven unused bits, unused bits without any octets, or if any of the
    /// unused bits is set.
    pub fn new(
        octets: impl Into<Bytes>, unused: u8
    ) -> Result<Self, ResourceError> {
        let res = AddrBits { octets: octets.into(), unused };
        if res.octets.len() > MAX_ADDR_LEN {
            return Err(ResourceError::malformed_address(
                "bit-string longer than sixteen octets"
            ))
        }
        if unused > 7 || (unused > 0 && res.octets.is_empty()) {
            return Err(ResourceError::malformed_address(
                "invalid number of unused bits"
            ))
        }
        if !res.has_clear_slack() {
            return Err(ResourceError::malformed_address(
                "unused bits set in prefix"
            ))
        }
        Ok(res)
    }

    /// Takes a bit-string from the content of a primitive BIT STRING.
    ///
    /// Only the structure of the value is checked here. Unused bits may be
    /// set and there may be more than sixteen octets.
    pub(crate) fn from_primitive<S: Source>(
        prim: &mut decode::Primitive<S>
    ) -> Result<Self, DecodeError<S::Error>> {
        let unused = prim.take_u8()?;
        let octets = prim.take_all()?;
        if unused > 7 || (unused > 0 && octets.is_empty()) {
            return Err(prim.content_err("invalid bit string"))
        }
        Ok(AddrBits { octets, unused })
    }

    /// Takes a bit-string value from the beginning of constructed content.
    pub(crate) fn take_from<S: Source>(
        cons: &mut decode::Constructed<S>
    ) -> Result<Self, DecodeError<S::Error>> {
        cons.take_primitive_if(Tag::BIT_STRING, |prim| {
            Self::from_primitive(prim)
        })
    }

    /// Creates a bit-string from the first `bit_len` bits of a raw address.
    ///
    /// Any bits beyond `bit_len` in the final octet are cleared. If
    /// `bit_len` is larger than the width of the address, the whole address
    /// is used.
    pub fn from_raw(addr: &RawAddr, bit_len: usize) -> Self {
        let bit_len = bit_len.min(addr.width() * 8);
        let octet_len = (bit_len + 7) / 8;
        let unused = (octet_len * 8 - bit_len) as u8;
        let mut octets = addr.as_slice()[..octet_len].to_vec();
        if let Some(last) = octets.last_mut() {
            *last &= !low_mask(unused);
        }
        AddrBits { octets: octets.into(), unused }
    }

    /// Creates an IPv4 prefix.
    ///
    /// Bits of `addr` beyond `len` are ignored. Lengths beyond 32 are
    /// rejected.
    pub fn prefix_v4(
        addr: Ipv4Addr, len: u8
    ) -> Result<Self, ResourceError> {
        if len > 32 {
            return Err(ResourceError::malformed_address(
                "IPv4 prefix length larger than 32"
            ))
        }
        Ok(Self::from_raw(&addr.into(), len.into()))
    }

    /// Creates an IPv6 prefix.
    ///
    /// Bits of `addr` beyond `len` are ignored. Lengths beyond 128 are
    /// rejected.
    pub fn prefix_v6(
        addr: Ipv6Addr, len: u8
    ) -> Result<Self, ResourceError> {
        if len > 128 {
            return Err(ResourceError::malformed_address(
                "IPv6 prefix length larger than 128"
            ))
        }
        Ok(Self::from_raw(&addr.into(), len.into()))
    }

    /// Returns the octets of the bit-string.
    pub fn octets(&self) -> &[u8] {
        self.octets.as_ref()
    }

    /// Returns the number of octets.
    pub fn octet_len(&self) -> usize {
        self.octets.len()
    }

    /// Returns the number of unused bits in the final octet.
    pub fn unused(&self) -> u8 {
        self.unused
    }

    /// Returns the number of significant bits.
    ///
    /// For a prefix, this is the prefix length.
    pub fn bit_len(&self) -> usize {
        self.octets.len() * 8 - usize::from(self.unused)
    }

    /// Returns whether all unused bits are zero.
    pub fn has_clear_slack(&self) -> bool {
        match self.octets.last() {
            Some(last) => last & low_mask(self.unused) == 0,
            None => true
        }
    }

    /// Expands the bit-string into a raw address of the given width.
    ///
    /// The octets of the bit-string are placed at the start of the address
    /// and everything not covered by significant bits is taken from `fill`.
    /// With [`FILL_MIN`] the result is the smallest, with [`FILL_MAX`] the
    /// largest address starting with the bit-string.
    ///
    /// Fails if the bit-string has more octets than `width` or if `width`
    /// exceeds sixteen octets.
    pub fn expand(
        &self, width: usize, fill: u8
    ) -> Result<RawAddr, ResourceError> {
        if width > MAX_ADDR_LEN || self.octets.len() > width {
            return Err(ResourceError::malformed_address(
                "bit-string longer than address width"
            ))
        }
        let mut octets = [0u8; MAX_ADDR_LEN];
        for octet in &mut octets[..width] {
            *octet = fill
        }
        octets[..self.octets.len()].copy_from_slice(self.octets.as_ref());
        if let Some(last) = self.octets.len().checked_sub(1) {
            octets[last] |= fill & low_mask(self.unused);
        }
        Ok(RawAddr { octets, width: width as u8 })
    }

    /// Formats the bit-string as hex octets and the unused bits.
    ///
    /// This is the format used for addresses of unknown families.
    pub fn fmt_hex(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for (i, octet) in self.octets.iter().enumerate() {
            if i > 0 {
                f.write_str(":")?;
            }
            write!(f, "{:02x}", octet)?;
        }
        write!(f, "[{}]", self.unused)
    }
}


//--- PrimitiveContent

impl encode::PrimitiveContent for AddrBits {
    const TAG: Tag = Tag::BIT_STRING;

    fn encoded_len(&self, _: Mode) -> usize {
        self.octets.len() + 1
    }

    fn write_encoded<W: io::Write>(
        &self,
        _: Mode,
        target: &mut W
    ) -> Result<(), io::Error> {
        target.write_all(&[self.unused])?;
        target.write_all(self.octets.as_ref())
    }
}


//--- Debug

impl fmt::Debug for AddrBits {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("AddrBits(")?;
        self.fmt_hex(f)?;
        f.write_str(")")
    }
}


//------------ RawAddr -------------------------------------------------------

/// A raw address of a fixed width.
///
/// The address is kept as a sequence of up to sixteen octets in network
/// byte order. Addresses of the same width order like the big-endian
/// unsigned integers they represent.
#[derive(Clone, Copy, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct RawAddr {
    /// The octets. Those beyond `width` are always zero.
    octets: [u8; MAX_ADDR_LEN],

    /// The number of octets in use.
    width: u8,
}

impl RawAddr {
    /// Creates a raw address from its octets.
    ///
    /// Fails if there are more than sixteen.
    pub fn new(octets: &[u8]) -> Result<Self, ResourceError> {
        if octets.len() > MAX_ADDR_LEN {
            return Err(ResourceError::malformed_address(
                "raw address longer than sixteen octets"
            ))
        }
        let mut res = [0u8; MAX_ADDR_LEN];
        res[..octets.len()].copy_from_slice(octets);
        Ok(RawAddr { octets: res, width: octets.len() as u8 })
    }

    /// Creates a raw address of the given width from an integer.
    ///
    /// Bits of `value` that do not fit into `width` octets are dropped.
    /// Widths beyond sixteen are treated as sixteen.
    pub fn from_int(value: u128, width: usize) -> Self {
        let width = width.min(MAX_ADDR_LEN);
        let bytes = value.to_be_bytes();
        let mut octets = [0u8; MAX_ADDR_LEN];
        octets[..width].copy_from_slice(&bytes[MAX_ADDR_LEN - width..]);
        RawAddr { octets, width: width as u8 }
    }

    /// Returns the width of the address in octets.
    pub fn width(&self) -> usize {
        usize::from(self.width)
    }

    /// Returns the octets of the address.
    pub fn as_slice(&self) -> &[u8] {
        &self.octets[..self.width()]
    }

    /// Returns the address as a big-endian unsigned integer.
    pub fn to_int(&self) -> u128 {
        self.as_slice().iter().fold(0, |res, octet| {
            (res << 8) | u128::from(*octet)
        })
    }

    /// Converts the address into an IPv4 address if it is four octets wide.
    pub fn to_v4(&self) -> Option<Ipv4Addr> {
        if self.width == 4 {
            Some(Ipv4Addr::new(
                self.octets[0], self.octets[1], self.octets[2], self.octets[3]
            ))
        }
        else {
            None
        }
    }

    /// Converts the address into an IPv6 address if it is 16 octets wide.
    pub fn to_v6(&self) -> Option<Ipv6Addr> {
        if self.width() == MAX_ADDR_LEN {
            Some(Ipv6Addr::from(self.octets))
        }
        else {
            None
        }
    }

    /// Formats the address as colon-separated hex octets.
    pub fn fmt_hex(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for (i, octet) in self.as_slice().iter().enumerate() {
            if i > 0 {
                f.write_str(":")?;
            }
            write!(f, "{:02x}", octet)?;
        }
        Ok(())
    }
}


//--- From

impl From<Ipv4Addr> for RawAddr {
    fn from(addr: Ipv4Addr) -> Self {
        let mut octets = [0u8; MAX_ADDR_LEN];
        octets[..4].copy_from_slice(&addr.octets());
        RawAddr { octets, width: 4 }
    }
}

impl From<Ipv6Addr> for RawAddr {
    fn from(addr: Ipv6Addr) -> Self {
        RawAddr { octets: addr.octets(), width: MAX_ADDR_LEN as u8 }
    }
}


//--- Debug

impl fmt::Debug for RawAddr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("RawAddr(")?;
        self.fmt_hex(f)?;
        f.write_str(")")
    }
}


//------------ Helpers -------------------------------------------------------

/// Returns an octet with the lowest `bits` bits set.
fn low_mask(bits: u8) -> u8 {
    ((1u16 << bits) - 1) as u8
}


//============ Tests =========================================================
