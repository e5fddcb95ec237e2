//! Canonical chains of address blocks.
//!
//! A list of blocks is _canonical_ if it is ordered, if no two blocks
//! overlap or are adjacent, and if no range could be expressed as a single
//! prefix instead. For each set of addresses there is exactly one canonical
//! list, so two sets can be compared by comparing their canonical lists.
//!
//! All calculations happen on the addresses interpreted as big-endian
//! unsigned integers of a given width.

use std::cmp::max;
use log::debug;
use super::bits::{AddrBits, RawAddr};
use super::block::{AddressRange, IpBlock};
use super::family::AddressFamily;
use crate::error::ResourceError;


//------------ canonicalize --------------------------------------------------

/// Converts a list of blocks into its canonical form.
///
/// The result covers exactly the same addresses as `blocks`. Applying the
/// function to its own result returns that result unchanged.
///
/// For IPv4 and IPv6, all blocks have to fit the family’s address width.
/// For unknown families, all ranges need to have the same width and no
/// prefix must be longer than that. If there are no ranges, the longest
/// prefix determines the width.
pub fn canonicalize(
    blocks: &[IpBlock], family: AddressFamily
) -> Result<Vec<IpBlock>, ResourceError> {
    let width = canonical_width(blocks, family)?;
    canonicalize_width(blocks, family, width)
}

/// Converts a list of blocks into canonical form for a given width.
///
/// The width must have been determined by `canonical_width` for a list of
/// blocks that includes `blocks`.
pub(crate) fn canonicalize_width(
    blocks: &[IpBlock], family: AddressFamily, width: usize
) -> Result<Vec<IpBlock>, ResourceError> {
    let mut spans = blocks.iter().map(|block| {
        Span::new(block, width)
    }).collect::<Result<Vec<_>, _>>()?;

    // Sort by smallest address then by effective prefix length. This is the
    // same order as `IpBlock::compare`. The sort is stable, so identical
    // blocks stay in input order.
    spans.sort_by(|left, right| {
        left.low.cmp(&right.low).then(left.len.cmp(&right.len))
    });

    let mut res: Vec<Span> = Vec::with_capacity(spans.len());
    for span in spans {
        if let Some(last) = res.last_mut() {
            if last.touches(&span) {
                last.high = max(last.high, span.high);
                continue;
            }
        }
        res.push(span)
    }
    if res.len() < blocks.len() {
        debug!(
            "{}: merged {} blocks into {}", family, blocks.len(), res.len()
        );
    }
    Ok(res.into_iter().map(|span| span.into_block(width)).collect())
}

/// Determines the address width in octets used for canonicalization.
pub(crate) fn canonical_width<'a>(
    blocks: impl IntoIterator<Item = &'a IpBlock>,
    family: AddressFamily
) -> Result<usize, ResourceError> {
    if let Some(width) = family.raw_width() {
        for block in blocks {
            match *block {
                IpBlock::Prefix(ref prefix) if prefix.octet_len() > width => {
                    return Err(ResourceError::malformed_address(format!(
                        "prefix too long for {}", family
                    )))
                }
                IpBlock::Range(ref range) if range.width() != width => {
                    return Err(ResourceError::malformed_address(format!(
                        "range of wrong width for {}", family
                    )))
                }
                _ => { }
            }
        }
        return Ok(width)
    }

    let mut range_width = None;
    let mut prefix_width = 0;
    for block in blocks {
        match *block {
            IpBlock::Prefix(ref prefix) => {
                prefix_width = max(prefix_width, prefix.octet_len())
            }
            IpBlock::Range(ref range) => {
                match range_width {
                    None => range_width = Some(range.width()),
                    Some(width) if width != range.width() => {
                        return Err(ResourceError::unsupported_family(
                            format!("ranges of different width for {}", family)
                        ))
                    }
                    _ => { }
                }
            }
        }
    }
    match range_width {
        Some(width) if prefix_width > width => {
            Err(ResourceError::unsupported_family(format!(
                "prefix longer than ranges for {}", family
            )))
        }
        Some(width) => Ok(width),
        None => Ok(prefix_width)
    }
}


//------------ covers --------------------------------------------------------

/// Checks whether the blocks of `superset` cover all of `subset`.
///
/// Both lists must be in canonical form for `width`. An empty superset
/// only covers an empty subset. A block that doesn’t fit `width` is never
/// covered and never covers anything.
pub fn covers(superset: &[IpBlock], subset: &[IpBlock], width: usize) -> bool {
    let superset = match bounds(superset, width) {
        Some(bounds) => bounds,
        None => return false
    };
    let subset = match bounds(subset, width) {
        Some(bounds) => bounds,
        None => return false
    };
    let mut other = superset.as_slice();

    if other.is_empty() {
        return subset.is_empty()
    }

    // Each subset block must be contained in exactly one superset block.
    // Both lists are ordered, so we can drop superset blocks as soon as they
    // end before the current subset block.
    for &(low, high) in &subset {
        loop {
            match other.split_first() {
                Some((&(_, other_high), tail)) if other_high < low => {
                    other = tail
                }
                Some((&(other_low, other_high), _)) => {
                    if other_low > low || other_high < high {
                        return false
                    }
                    break
                }
                None => return false
            }
        }
    }
    true
}

fn bounds(blocks: &[IpBlock], width: usize) -> Option<Vec<(u128, u128)>> {
    blocks.iter().map(|block| {
        Some((
            block.low(width).ok()?.to_int(),
            block.high(width).ok()?.to_int()
        ))
    }).collect()
}


//------------ Span ----------------------------------------------------------

/// A block as an integer interval.
#[derive(Clone, Copy, Debug)]
struct Span {
    low: u128,
    high: u128,

    /// The effective prefix length of the original block.
    len: usize,
}

impl Span {
    fn new(block: &IpBlock, width: usize) -> Result<Self, ResourceError> {
        Ok(Span {
            low: block.low(width)?.to_int(),
            high: block.high(width)?.to_int(),
            len: block.effective_len(width),
        })
    }

    /// Returns whether a following span overlaps or is adjacent.
    ///
    /// Zero has no predecessor, so a span starting at zero always touches.
    fn touches(&self, next: &Span) -> bool {
        match next.low.checked_sub(1) {
            Some(prev) => self.high >= prev,
            None => true
        }
    }

    /// Converts the span into a prefix if possible or a range otherwise.
    fn into_block(self, width: usize) -> IpBlock {
        let min = RawAddr::from_int(self.low, width);
        let mask = self.low ^ self.high;
        if mask & mask.wrapping_add(1) == 0 && self.low & mask == 0 {
            let len = width * 8 - mask.count_ones() as usize;
            IpBlock::Prefix(AddrBits::from_raw(&min, len))
        }
        else {
            IpBlock::Range(AddressRange::new_unchecked(
                min, RawAddr::from_int(self.high, width)
            ))
        }
    }
}


//============ Tests =========================================================

#[cfg(test)]
mod test {
    use std::net::Ipv4Addr;
    use crate::error::ErrorKind;
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

    fn canon(blocks: &[IpBlock]) -> Vec<IpBlock> {
        canonicalize(blocks, AddressFamily::Ipv4).unwrap()
    }

    #[test]
    fn empty() {
        assert_eq!(canon(&[]), Vec::new());
    }

    #[test]
    fn collapse_range() {
        assert_eq!(
            canon(&[range(v4(0, 0, 0, 0), v4(0, 0, 0, 255))]),
            vec![prefix(0, 0, 0, 0, 24)]
        );
        assert_eq!(
            canon(&[range(v4(10, 0, 0, 1), v4(10, 0, 0, 1))]),
            vec![prefix(10, 0, 0, 1, 32)]
        );
        assert_eq!(
            canon(&[range(v4(10, 0, 0, 1), v4(10, 0, 0, 2))]),
            vec![range(v4(10, 0, 0, 1), v4(10, 0, 0, 2))]
        );
    }

    #[test]
    fn merge_adjacent() {
        assert_eq!(
            canon(&[prefix(10, 0, 1, 0, 24), prefix(10, 0, 0, 0, 24)]),
            vec![prefix(10, 0, 0, 0, 23)]
        );
        assert_eq!(
            canon(&[prefix(10, 0, 1, 0, 24), prefix(10, 0, 2, 0, 24)]),
            vec![range(v4(10, 0, 1, 0), v4(10, 0, 2, 255))]
        );
        assert_eq!(
            canon(&[prefix(10, 0, 0, 0, 24), prefix(10, 0, 2, 0, 24)]),
            vec![prefix(10, 0, 0, 0, 24), prefix(10, 0, 2, 0, 24)]
        );
    }

    #[test]
    fn merge_overlapping() {
        assert_eq!(
            canon(&[
                range(v4(10, 0, 0, 100), v4(10, 0, 1, 0)),
                range(v4(10, 0, 0, 0), v4(10, 0, 0, 200)),
            ]),
            vec![range(v4(10, 0, 0, 0), v4(10, 0, 1, 0))]
        );
        assert_eq!(
            canon(&[
                prefix(10, 0, 0, 0, 8),
                prefix(10, 1, 0, 0, 16),
                prefix(10, 0, 0, 0, 8),
            ]),
            vec![prefix(10, 0, 0, 0, 8)]
        );
    }

    #[test]
    fn merge_cascading() {
        assert_eq!(
            canon(&[
                prefix(10, 0, 0, 0, 24),
                range(v4(10, 0, 1, 0), v4(10, 0, 1, 10)),
                range(v4(10, 0, 1, 11), v4(10, 0, 1, 255)),
                prefix(10, 0, 2, 0, 23),
            ]),
            vec![prefix(10, 0, 0, 0, 22)]
        );
    }

    #[test]
    fn whole_space() {
        assert_eq!(
            canon(&[prefix(128, 0, 0, 0, 1), prefix(0, 0, 0, 0, 1)]),
            vec![prefix(0, 0, 0, 0, 0)]
        );
        assert_eq!(
            canon(&[range(v4(0, 0, 0, 0), v4(255, 255, 255, 255))]),
            vec![prefix(0, 0, 0, 0, 0)]
        );
    }

    #[test]
    fn wrong_width() {
        let long = IpBlock::Prefix(
            AddrBits::new(&b"\x0a\x00\x00\x00\x00"[..], 0).unwrap()
        );
        assert_eq!(
            canonicalize(&[long.clone()], AddressFamily::Ipv4)
                .unwrap_err().kind(),
            ErrorKind::MalformedAddress
        );
        assert!(canonicalize(&[long], AddressFamily::Ipv6).is_ok());
    }

    #[test]
    fn unknown_family() {
        let family = AddressFamily::Unknown(3);
        let short = IpBlock::Prefix(AddrBits::new(&b"\x01"[..], 0).unwrap());
        let next = IpBlock::Prefix(AddrBits::new(&b"\x02\x00"[..], 0).unwrap());
        let res = canonicalize(&[short.clone(), next.clone()], family).unwrap();
        assert_eq!(
            res,
            vec![range(
                RawAddr::new(b"\x01\x00").unwrap(),
                RawAddr::new(b"\x02\x00").unwrap()
            )]
        );
        assert_eq!(canonicalize(&res, family).unwrap(), res);

        let three = range(
            RawAddr::new(b"\x05\x00\x00").unwrap(),
            RawAddr::new(b"\x05\x00\x01").unwrap()
        );
        assert_eq!(
            canonicalize(&[three.clone(), res[0].clone()], family)
                .unwrap_err().kind(),
            ErrorKind::UnsupportedFamily
        );
        let four = IpBlock::Prefix(
            AddrBits::new(&b"\x01\x02\x03\x04"[..], 0).unwrap()
        );
        assert_eq!(
            canonicalize(&[three, four], family).unwrap_err().kind(),
            ErrorKind::UnsupportedFamily
        );
    }

    #[test]
    fn idempotent() {
        let blocks = [
            prefix(192, 168, 0, 0, 16),
            range(v4(10, 0, 0, 5), v4(10, 0, 3, 0)),
            prefix(10, 0, 4, 0, 22),
            prefix(192, 168, 17, 0, 24),
            range(v4(172, 16, 0, 0), v4(172, 31, 255, 255)),
        ];
        let once = canon(&blocks);
        assert_eq!(canon(&once), once);
        assert_eq!(
            once,
            vec![
                range(v4(10, 0, 0, 5), v4(10, 0, 3, 0)),
                prefix(10, 0, 4, 0, 22),
                prefix(172, 16, 0, 0, 12),
                prefix(192, 168, 0, 0, 16),
            ]
        );
    }

    #[test]
    fn covers_blocks() {
        assert!(covers(
            &canon(&[prefix(10, 0, 0, 0, 8)]),
            &canon(&[prefix(10, 1, 0, 0, 16)]),
            4
        ));
        assert!(!covers(
            &canon(&[prefix(10, 0, 0, 0, 24)]),
            &canon(&[prefix(10, 0, 1, 0, 24)]),
            4
        ));
        assert!(covers(
            &canon(&[prefix(10, 0, 0, 0, 24), prefix(11, 0, 0, 0, 8)]),
            &canon(&[
                range(v4(10, 0, 0, 3), v4(10, 0, 0, 17)),
                prefix(11, 7, 0, 0, 16),
                prefix(11, 255, 255, 255, 32),
            ]),
            4
        ));
        assert!(!covers(
            &canon(&[prefix(10, 0, 0, 0, 24), prefix(10, 0, 2, 0, 24)]),
            &canon(&[range(v4(10, 0, 0, 0), v4(10, 0, 2, 0))]),
            4
        ));
        assert!(!covers(&[], &canon(&[prefix(10, 0, 0, 0, 24)]), 4));
        assert!(covers(&[], &[], 4));
        assert!(covers(&canon(&[prefix(10, 0, 0, 0, 24)]), &[], 4));
        assert!(!covers(
            &canon(&[prefix(10, 0, 0, 0, 8)]),
            &canon(&[prefix(12, 0, 0, 0, 8)]),
            4
        ));
    }
}
