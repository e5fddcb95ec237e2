//! Address extents: prefixes and ranges.

use std::fmt;
use std::cmp::Ordering;
use bcder::encode;
use bcder::encode::PrimitiveContent;
use super::bits::{AddrBits, RawAddr, FILL_MAX, FILL_MIN};
use super::family::AddressFamily;
use crate::error::ResourceError;


//------------ IpBlock -------------------------------------------------------

/// A contiguous block of addresses.
///
/// A block is either a prefix, given as a bit-string, or an explicit range
/// between two addresses.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum IpBlock {
    /// An address prefix.
    Prefix(AddrBits),

    /// An address range.
    Range(AddressRange),
}

impl IpBlock {
    /// Returns the smallest address of the block for the given width.
    pub fn low(&self, width: usize) -> Result<RawAddr, ResourceError> {
        match *self {
            IpBlock::Prefix(ref prefix) => prefix.expand(width, FILL_MIN),
            IpBlock::Range(ref range) => range.check_width(width, range.min),
        }
    }

    /// Returns the largest address of the block for the given width.
    pub fn high(&self, width: usize) -> Result<RawAddr, ResourceError> {
        match *self {
            IpBlock::Prefix(ref prefix) => prefix.expand(width, FILL_MAX),
            IpBlock::Range(ref range) => range.check_width(width, range.max),
        }
    }

    /// Returns the effective prefix length of the block.
    ///
    /// This is the prefix length for a prefix and the full address width
    /// in bits for a range.
    pub fn effective_len(&self, width: usize) -> usize {
        match *self {
            IpBlock::Prefix(ref prefix) => prefix.bit_len(),
            IpBlock::Range(_) => width * 8,
        }
    }

    /// Compares two blocks for a given address width.
    ///
    /// Blocks are ordered by their smallest address first and by their
    /// effective prefix length second. Fails only if one of the blocks
    /// doesn’t fit into `width`.
    pub fn compare(
        &self, other: &Self, width: usize
    ) -> Result<Ordering, ResourceError> {
        Ok(
            self.low(width)?.cmp(&other.low(width)?).then_with(|| {
                self.effective_len(width).cmp(&other.effective_len(width))
            })
        )
    }

    /// Returns a value encoder for the block in the given family.
    ///
    /// A prefix is encoded as its bit-string. A range is encoded as a
    /// sequence of the bit-strings of its minimum and maximum with implied
    /// trailing bits dropped. Families without a fixed width keep the
    /// bounds at full length instead, as the width is implied by them.
    pub fn encode_ref(
        &self, family: AddressFamily
    ) -> impl encode::Values + '_ {
        match *self {
            IpBlock::Prefix(ref prefix) => {
                encode::Choice2::One(prefix.encode_ref())
            }
            IpBlock::Range(ref range) => {
                let (min, max) = match family.raw_width() {
                    Some(_) => (range.min_bits(), range.max_bits()),
                    None => (range.min_full_bits(), range.max_full_bits()),
                };
                encode::Choice2::Two(encode::sequence((
                    min.encode(),
                    max.encode(),
                )))
            }
        }
    }

    /// Returns an object that displays the block for the given family.
    pub fn display(&self, family: AddressFamily) -> DisplayBlock {
        DisplayBlock { block: self, family }
    }
}


//--- From

impl From<AddrBits> for IpBlock {
    fn from(prefix: AddrBits) -> Self {
        IpBlock::Prefix(prefix)
    }
}

impl From<AddressRange> for IpBlock {
    fn from(range: AddressRange) -> Self {
        IpBlock::Range(range)
    }
}


//------------ AddressRange --------------------------------------------------

/// An explicit range of addresses.
///
/// Both bounds are inclusive and of the same width. The minimum is never
/// larger than the maximum.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct AddressRange {
    min: RawAddr,
    max: RawAddr,
}

impl AddressRange {
    /// Creates a new range.
    ///
    /// Fails if the two addresses differ in width or if `min` is larger
    /// than `max`.
    pub fn new(min: RawAddr, max: RawAddr) -> Result<Self, ResourceError> {
        if min.width() != max.width() {
            return Err(ResourceError::malformed_extension(
                "range bounds of different width"
            ))
        }
        if min > max {
            return Err(ResourceError::malformed_extension(
                "range minimum larger than maximum"
            ))
        }
        Ok(AddressRange { min, max })
    }

    /// Creates a new range without checking the bounds.
    pub(crate) fn new_unchecked(min: RawAddr, max: RawAddr) -> Self {
        AddressRange { min, max }
    }

    pub fn min(&self) -> RawAddr {
        self.min
    }

    pub fn max(&self) -> RawAddr {
        self.max
    }

    /// Returns the width of the range’s addresses.
    pub fn width(&self) -> usize {
        self.min.width()
    }

    /// Returns the bit-string for the minimum.
    ///
    /// All trailing zero bits are dropped as they are implied.
    pub fn min_bits(&self) -> AddrBits {
        let bits = self.min.width() * 8;
        let zeros = self.min.to_int().trailing_zeros() as usize;
        AddrBits::from_raw(&self.min, bits.saturating_sub(zeros))
    }

    /// Returns the bit-string for the maximum.
    ///
    /// All trailing one bits are dropped as they are implied.
    pub fn max_bits(&self) -> AddrBits {
        let bits = self.max.width() * 8;
        let ones = self.max.to_int().trailing_ones() as usize;
        AddrBits::from_raw(&self.max, bits.saturating_sub(ones))
    }

    /// Returns the bit-string for the minimum without dropping any bits.
    pub fn min_full_bits(&self) -> AddrBits {
        AddrBits::from_raw(&self.min, self.min.width() * 8)
    }

    /// Returns the bit-string for the maximum without dropping any bits.
    pub fn max_full_bits(&self) -> AddrBits {
        AddrBits::from_raw(&self.max, self.max.width() * 8)
    }

    fn check_width(
        &self, width: usize, addr: RawAddr
    ) -> Result<RawAddr, ResourceError> {
        if self.width() == width {
            Ok(addr)
        }
        else {
            Err(ResourceError::malformed_address(
                "range of wrong address width"
            ))
        }
    }
}


//------------ DisplayBlock --------------------------------------------------

/// Helper type for displaying a block in the format of its family.
#[derive(Clone, Copy, Debug)]
pub struct DisplayBlock<'a> {
    block: &'a IpBlock,
    family: AddressFamily,
}

impl<'a> fmt::Display for DisplayBlock<'a> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self.block {
            IpBlock::Prefix(ref prefix) => {
                match self.family.raw_width() {
                    Some(width) => {
                        match prefix.expand(width, FILL_MIN) {
                            Ok(addr) => fmt_addr(&addr, f)?,
                            Err(_) => return prefix.fmt_hex(f),
                        }
                        write!(f, "/{}", prefix.bit_len())
                    }
                    None => prefix.fmt_hex(f)
                }
            }
            IpBlock::Range(ref range) => {
                match self.family.raw_width() {
                    Some(_) => {
                        fmt_addr(&range.min, f)?;
                        f.write_str("-")?;
                        fmt_addr(&range.max, f)
                    }
                    None => {
                        range.min_bits().fmt_hex(f)?;
                        f.write_str("-")?;
                        range.max_bits().fmt_hex(f)
                    }
                }
            }
        }
    }
}

fn fmt_addr(addr: &RawAddr, f: &mut fmt::Formatter) -> fmt::Result {
    if let Some(addr) = addr.to_v4() {
        write!(f, "{}", addr)
    }
    else if let Some(addr) = addr.to_v6() {
        write!(f, "{}", addr)
    }
    else {
        addr.fmt_hex(f)
    }
}


//============ Tests =========================================================

#[cfg(test)]
mod test {
    use std::net::Ipv4Addr;
    use super::*;

    fn v4(a: u8, b: u8, c: u8, d: u8) -> RawAddr {
        Ipv4Addr::new(a, b, c, d).into()
    }

    fn prefix(a: u8, b: u8, c: u8, d: u8, len: u8) -> IpBlock {
        AddrBits::prefix_v4(Ipv4Addr::new(a, b, c, d), len).unwrap().into()
    }

    fn range(min: RawAddr, max: RawAddr) -> IpBlock {
        AddressRange::new(min, max).unwrap().into()
    }

    #[test]
    fn range_new() {
        assert!(AddressRange::new(v4(10, 0, 0, 1), v4(10, 0, 0, 0)).is_err());
        assert!(
            AddressRange::new(
                v4(10, 0, 0, 0), RawAddr::new(b"\x0a\x00\x00\x00\x00").unwrap()
            ).is_err()
        );
        assert!(AddressRange::new(v4(10, 0, 0, 1), v4(10, 0, 0, 1)).is_ok());
    }

    #[test]
    fn range_bits() {
        let range = AddressRange::new(
            v4(10, 0, 0, 0), v4(10, 0, 1, 255)
        ).unwrap();
        assert_eq!(range.min_bits().octets(), b"\x0a");
        assert_eq!(range.min_bits().unused(), 1);
        assert_eq!(range.max_bits().octets(), b"\x0a\x00\x00");
        assert_eq!(range.max_bits().unused(), 1);
        assert_eq!(range.min_full_bits().octets(), b"\x0a\x00\x00\x00");
        assert_eq!(range.max_full_bits().octets(), b"\x0a\x00\x01\xff");
        assert_eq!(range.max_full_bits().unused(), 0);

        let all = AddressRange::new(
            v4(0, 0, 0, 0), v4(255, 255, 255, 255)
        ).unwrap();
        assert_eq!(all.min_bits().bit_len(), 0);
        assert_eq!(all.max_bits().bit_len(), 0);
    }

    #[test]
    fn low_and_high() {
        let block = prefix(10, 64, 0, 0, 10);
        assert_eq!(block.low(4).unwrap(), v4(10, 64, 0, 0));
        assert_eq!(block.high(4).unwrap(), v4(10, 127, 255, 255));
        let block = range(v4(10, 0, 0, 7), v4(10, 0, 0, 9));
        assert_eq!(block.low(4).unwrap(), v4(10, 0, 0, 7));
        assert_eq!(block.high(4).unwrap(), v4(10, 0, 0, 9));
        assert!(block.low(16).is_err());
    }

    #[test]
    fn compare() {
        assert_eq!(
            prefix(10, 0, 0, 0, 8).compare(&prefix(10, 0, 0, 0, 16), 4),
            Ok(Ordering::Less)
        );
        assert_eq!(
            prefix(10, 0, 0, 0, 24).compare(
                &range(v4(10, 0, 0, 0), v4(10, 0, 0, 3)), 4
            ),
            Ok(Ordering::Less)
        );
        assert_eq!(
            range(v4(10, 0, 0, 0), v4(10, 0, 0, 3)).compare(
                &range(v4(10, 0, 0, 0), v4(10, 0, 0, 7)), 4
            ),
            Ok(Ordering::Equal)
        );
        assert_eq!(
            prefix(11, 0, 0, 0, 8).compare(&prefix(10, 0, 0, 0, 32), 4),
            Ok(Ordering::Greater)
        );
        assert!(
            prefix(10, 0, 0, 0, 8).compare(
                &IpBlock::Prefix(
                    AddrBits::new(&b"\x0a\x00\x00\x00\x00"[..], 0).unwrap()
                ),
                4
            ).is_err()
        );
    }

    #[test]
    fn encode() {
        use bcder::Mode;
        use bcder::encode::Values;

        assert_eq!(
            prefix(10, 64, 0, 0, 10).encode_ref(AddressFamily::Ipv4)
                .to_captured(Mode::Der)
                .as_slice(),
            b"\x03\x03\x06\x0a\x40".as_ref()
        );
        assert_eq!(
            range(v4(10, 0, 0, 0), v4(10, 0, 1, 255))
                .encode_ref(AddressFamily::Ipv4)
                .to_captured(Mode::Der).as_slice(),
            b"\x30\x0a\x03\x02\x01\x0a\x03\x04\x01\x0a\x00\x00".as_ref()
        );
        assert_eq!(
            range(
                RawAddr::new(b"\x01\x00").unwrap(),
                RawAddr::new(b"\x02\xff").unwrap()
            ).encode_ref(AddressFamily::Unknown(3))
                .to_captured(Mode::Der).as_slice(),
            b"\x30\x08\x03\x03\x00\x01\x00\x03\x03\x00\x02\xff".as_ref()
        );
    }

    #[test]
    fn display() {
        assert_eq!(
            prefix(10, 64, 0, 0, 10).display(AddressFamily::Ipv4).to_string(),
            "10.64.0.0/10"
        );
        assert_eq!(
            range(v4(10, 0, 0, 7), v4(10, 0, 0, 9))
                .display(AddressFamily::Ipv4).to_string(),
            "10.0.0.7-10.0.0.9"
        );
        assert_eq!(
            IpBlock::Prefix(
                AddrBits::prefix_v6("2001:db8::".parse().unwrap(), 32)
                    .unwrap()
            ).display(AddressFamily::Ipv6).to_string(),
            "2001:db8::/32"
        );
        assert_eq!(
            IpBlock::Prefix(
                AddrBits::new(&b"\x0a\x40"[..], 6).unwrap()
            ).display(AddressFamily::Unknown(7)).to_string(),
            "0a:40[6]"
        );
        assert_eq!(
            range(
                RawAddr::new(b"\x01\x00\x00").unwrap(),
                RawAddr::new(b"\x01\x7f\xff").unwrap()
            ).display(AddressFamily::Unknown(7)).to_string(),
            "01[0]-01:00[7]"
        );
    }
}
