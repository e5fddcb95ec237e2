//! Address family identifiers.
//!
//! Each block of IP resources starts with an OCTET STRING of two or three
//! octets. The first two are the Address Family Identifier (AFI) in network
//! byte order, the optional third one is the Subsequent Address Family
//! Identifier (SAFI).

use std::fmt;
use bcder::decode::{Constructed, DecodeError, Source};
use bcder::{encode, OctetString};
use bytes::Bytes;


//------------ AddressFamily -------------------------------------------------

/// The address family of a block of IP resources.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AddressFamily {
    /// IPv4, AFI 1.
    Ipv4,

    /// IPv6, AFI 2.
    Ipv6,

    /// Any other AFI.
    ///
    /// Addresses of these families have no fixed width.
    Unknown(u16),
}

impl AddressFamily {
    /// Creates the family from its AFI.
    pub fn from_afi(afi: u16) -> Self {
        match afi {
            1 => AddressFamily::Ipv4,
            2 => AddressFamily::Ipv6,
            afi => AddressFamily::Unknown(afi)
        }
    }

    /// Returns the AFI of the family.
    pub fn afi(self) -> u16 {
        match self {
            AddressFamily::Ipv4 => 1,
            AddressFamily::Ipv6 => 2,
            AddressFamily::Unknown(afi) => afi,
        }
    }

    /// Returns the width of raw addresses in octets if it is known.
    pub fn raw_width(self) -> Option<usize> {
        match self {
            AddressFamily::Ipv4 => Some(4),
            AddressFamily::Ipv6 => Some(16),
            AddressFamily::Unknown(_) => None,
        }
    }
}


//--- Display

impl fmt::Display for AddressFamily {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            AddressFamily::Ipv4 => f.write_str("IPv4"),
            AddressFamily::Ipv6 => f.write_str("IPv6"),
            AddressFamily::Unknown(afi) => write!(f, "Unknown AFI {}", afi),
        }
    }
}


//------------ Safi ----------------------------------------------------------

/// A Subsequent Address Family Identifier.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Safi(pub u8);

impl Safi {
    /// Unicast forwarding.
    pub const UNICAST: Safi = Safi(1);

    /// Multicast forwarding.
    pub const MULTICAST: Safi = Safi(2);

    /// Returns the name of well-known SAFI values.
    pub fn label(self) -> Option<&'static str> {
        match self.0 {
            1 => Some("Unicast"),
            2 => Some("Multicast"),
            3 => Some("Unicast/Multicast"),
            4 => Some("MPLS"),
            64 => Some("Tunnel"),
            65 => Some("VPLS"),
            66 => Some("BGP MDT"),
            128 => Some("MPLS-labeled VPN"),
            _ => None
        }
    }
}

impl fmt::Display for Safi {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.label() {
            Some(label) => f.write_str(label),
            None => write!(f, "Unknown SAFI {}", self.0)
        }
    }
}


//------------ FamilyId ------------------------------------------------------

/// The complete identifier of a block of IP resources.
///
/// Values sort in the order of their encoded octets which is the order
/// the blocks have to appear in a DER encoded extension.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FamilyId {
    family: AddressFamily,
    safi: Option<Safi>,
}

impl FamilyId {
    /// Creates an identifier from a family and an optional SAFI.
    pub fn new(family: AddressFamily, safi: Option<Safi>) -> Self {
        FamilyId { family, safi }
    }

    /// Returns the identifier for IPv4 without a SAFI.
    pub fn v4() -> Self {
        Self::new(AddressFamily::Ipv4, None)
    }

    /// Returns the identifier for IPv6 without a SAFI.
    pub fn v6() -> Self {
        Self::new(AddressFamily::Ipv6, None)
    }

    pub fn family(self) -> AddressFamily {
        self.family
    }

    pub fn safi(self) -> Option<Safi> {
        self.safi
    }

    /// Creates the identifier from the content of the octet string.
    ///
    /// Returns `None` unless there are two or three octets.
    pub fn from_octets(octets: &[u8]) -> Option<Self> {
        match *octets {
            [hi, lo] => Some(Self::new(
                AddressFamily::from_afi(u16::from_be_bytes([hi, lo])), None
            )),
            [hi, lo, safi] => Some(Self::new(
                AddressFamily::from_afi(u16::from_be_bytes([hi, lo])),
                Some(Safi(safi))
            )),
            _ => None
        }
    }

    /// Returns the encoded octets of the identifier.
    pub fn to_octets(self) -> Vec<u8> {
        let mut res = self.family.afi().to_be_bytes().to_vec();
        if let Some(safi) = self.safi {
            res.push(safi.0)
        }
        res
    }

    /// Takes an identifier from the beginning of a constructed value.
    pub fn take_from<S: Source>(
        cons: &mut Constructed<S>
    ) -> Result<Self, DecodeError<S::Error>> {
        let octets = OctetString::take_from(cons)?;
        let octets = octets.to_bytes();
        Self::from_octets(octets.as_ref()).ok_or_else(|| {
            cons.content_err("address family must be two or three octets")
        })
    }

    pub fn encode(self) -> impl encode::Values {
        OctetString::encode_slice(Bytes::from(self.to_octets()))
    }
}


//--- PartialOrd and Ord

impl PartialOrd for FamilyId {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FamilyId {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.to_octets().cmp(&other.to_octets())
    }
}


//--- Display

impl fmt::Display for FamilyId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.family)?;
        if let Some(safi) = self.safi {
            write!(f, " ({})", safi)?;
        }
        Ok(())
    }
}


//============ Tests =========================================================

#[cfg(test)]
mod test {
    use bcder::Mode;
    use bcder::encode::Values;
    use super::*;

    #[test]
    fn octets() {
        assert_eq!(FamilyId::from_octets(b"\x00\x01"), Some(FamilyId::v4()));
        assert_eq!(
            FamilyId::from_octets(b"\x00\x02\x01"),
            Some(FamilyId::new(AddressFamily::Ipv6, Some(Safi::UNICAST)))
        );
        assert_eq!(
            FamilyId::from_octets(b"\x40\x00").map(FamilyId::family),
            Some(AddressFamily::Unknown(0x4000))
        );
        assert_eq!(FamilyId::from_octets(b"\x00"), None);
        assert_eq!(FamilyId::from_octets(b"\x00\x01\x01\x01"), None);
        assert_eq!(
            FamilyId::new(AddressFamily::Ipv6, Some(Safi(66))).to_octets(),
            b"\x00\x02\x42"
        );
    }

    #[test]
    fn order() {
        let mut ids = vec![
            FamilyId::new(AddressFamily::Unknown(3), None),
            FamilyId::new(AddressFamily::Ipv4, Some(Safi::MULTICAST)),
            FamilyId::v6(),
            FamilyId::v4(),
        ];
        ids.sort();
        assert_eq!(
            ids,
            vec![
                FamilyId::v4(),
                FamilyId::new(AddressFamily::Ipv4, Some(Safi::MULTICAST)),
                FamilyId::v6(),
                FamilyId::new(AddressFamily::Unknown(3), None),
            ]
        );
    }

    #[test]
    fn display() {
        assert_eq!(FamilyId::v4().to_string(), "IPv4");
        assert_eq!(
            FamilyId::new(AddressFamily::Ipv6, Some(Safi(3))).to_string(),
            "IPv6 (Unicast/Multicast)"
        );
        assert_eq!(
            FamilyId::new(AddressFamily::Unknown(7), Some(Safi(9)))
                .to_string(),
            "Unknown AFI 7 (Unknown SAFI 9)"
        );
        assert_eq!(Safi(128).to_string(), "MPLS-labeled VPN");
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serde() {
        use serde_test::{Token, assert_tokens};

        assert_tokens(
            &AddressFamily::Unknown(7),
            &[
                Token::NewtypeVariant {
                    name: "AddressFamily", variant: "Unknown"
                },
                Token::U16(7),
            ]
        );
        assert_tokens(
            &FamilyId::v4(),
            &[
                Token::Struct { name: "FamilyId", len: 2 },
                Token::Str("family"),
                Token::UnitVariant { name: "AddressFamily", variant: "Ipv4" },
                Token::Str("safi"),
                Token::None,
                Token::StructEnd,
            ]
        );
    }

    #[test]
    fn encode_and_decode() {
        let id = FamilyId::new(AddressFamily::Ipv4, Some(Safi::UNICAST));
        let captured = id.encode().to_captured(Mode::Der);
        assert_eq!(captured.as_slice(), b"\x04\x03\x00\x01\x01".as_ref());
        assert_eq!(
            Mode::Der.decode(captured.as_slice(), FamilyId::take_from)
                .unwrap(),
            id
        );
        assert!(
            Mode::Der.decode(
                b"\x04\x01\x00".as_ref(), FamilyId::take_from
            ).is_err()
        );
    }
}
