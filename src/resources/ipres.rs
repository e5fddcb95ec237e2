//! IP address delegation extensions.
//!
//! The types herein implement the IP Address Delegation extension defined
//! in RFC 3779. An extension holds one block of resources per address
//! family. Each block either inherits its resources from the issuer or
//! lists them as a sequence of prefixes and ranges.
//!
//! Decoding happens in two steps. First, the DER structure is parsed into
//! a minimally processed form. Then, each address is checked against its
//! address family. This allows to tell apart broken structure from broken
//! addresses.
//!
//! Neither decoding nor encoding changes the order or representation of
//! blocks. Canonicalization is an explicit step via the various
//! `canonicalize` methods.

use std::{cmp, fmt, slice};
use std::iter::FromIterator;
use bcder::{decode, encode};
use bcder::{Captured, Mode, Tag};
use bcder::decode::{DecodeError, IntoSource, Source};
use bcder::encode::{PrimitiveContent, Values};
use log::debug;
use crate::error::ResourceError;
use super::bits::{AddrBits, FILL_MAX, FILL_MIN, MAX_ADDR_LEN};
use super::block::{AddressRange, IpBlock};
use super::chain;
use super::choice::ResourcesChoice;
use super::family::{AddressFamily, FamilyId};


//------------ IpAddrBlocks --------------------------------------------------

/// The content of an IP Address Delegation extension.
///
/// This is a sequence of resource blocks with at most one block per family
/// identifier.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct IpAddrBlocks(Vec<IpResources>);

impl IpAddrBlocks {
    /// Creates an empty value.
    pub fn empty() -> Self {
        IpAddrBlocks(Vec::new())
    }

    /// Creates a value from a sequence of resource blocks.
    ///
    /// The blocks are kept in the given order. Returns an error if there
    /// is more than one block for the same family identifier.
    pub fn from_resources<I>(iter: I) -> Result<Self, ResourceError>
    where I: IntoIterator<Item = IpResources> {
        let mut res: Vec<IpResources> = Vec::new();
        for item in iter {
            if res.iter().any(|other| other.family == item.family) {
                return Err(ResourceError::malformed_extension(format!(
                    "duplicate address family {}", item.family
                )))
            }
            res.push(item)
        }
        Ok(IpAddrBlocks(res))
    }

    /// Returns whether there are no resource blocks at all.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the number of resource blocks.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns an iterator over the resource blocks.
    pub fn iter(&self) -> slice::Iter<IpResources> {
        self.0.iter()
    }

    /// Returns the resource block for the given family identifier.
    pub fn get(&self, family: FamilyId) -> Option<&IpResources> {
        self.0.iter().find(|item| item.family == family)
    }

    /// Returns the IPv4 resources without a SAFI.
    pub fn v4(&self) -> Option<&IpResources> {
        self.get(FamilyId::v4())
    }

    /// Returns the IPv6 resources without a SAFI.
    pub fn v6(&self) -> Option<&IpResources> {
        self.get(FamilyId::v6())
    }

    /// Returns the canonical form of the extension.
    ///
    /// All blocks are canonicalized and ordered by their family
    /// identifier.
    pub fn canonicalize(&self) -> Result<Self, ResourceError> {
        let mut res = self.0.iter().map(IpResources::canonicalize)
            .collect::<Result<Vec<_>, _>>()?;
        res.sort_by_key(|item| item.family);
        Ok(IpAddrBlocks(res))
    }

    /// Returns whether the extension is in canonical form.
    pub fn is_canonical(&self) -> bool {
        self.0.windows(2).all(|pair| pair[0].family < pair[1].family)
        && self.0.iter().all(IpResources::is_canonical)
    }

    /// Checks whether the resources of `subject` are covered by `self`.
    ///
    /// Each resource block of `subject` needs to be covered by the block
    /// for the same family identifier in `self`. Subject blocks that
    /// inherit are covered if `self` has the family at all. Inheriting
    /// blocks in `self` cover everything, as they must have been checked
    /// against their own issuer already.
    pub fn encompasses(
        &self, subject: &IpAddrBlocks
    ) -> Result<bool, ResourceError> {
        for item in subject.iter() {
            if item.choice.as_blocks().map(IpBlocks::is_empty) == Some(true) {
                continue
            }
            let issuer = match self.get(item.family) {
                Some(issuer) => issuer,
                None => {
                    debug!("{}: not present in issuer", item.family);
                    return Ok(false)
                }
            };
            let (issuer_blocks, subject_blocks) = match (
                issuer.to_blocks(), item.to_blocks()
            ) {
                (Some(outer), Some(inner)) => (outer, inner),
                _ => continue
            };
            let family = item.family.family();
            if !issuer_blocks.covers(subject_blocks, family)? {
                debug!(
                    "{}: {} not covered by {}",
                    item.family,
                    subject_blocks.display(family),
                    issuer_blocks.display(family)
                );
                return Ok(false)
            }
        }
        Ok(true)
    }

    /// Returns an object displaying the extension with the given indent.
    pub fn display(&self, indent: usize) -> DisplayIpAddrBlocks {
        DisplayIpAddrBlocks { blocks: self, indent }
    }
}

/// # Decoding and Encoding
///
impl IpAddrBlocks {
    /// Decodes the extension from a source containing its DER encoding.
    pub fn decode<S: IntoSource>(source: S) -> Result<Self, ResourceError>
    where <S::Source as Source>::Error: fmt::Display {
        let wire = Mode::Der.decode(source, Self::take_wire_from)
            .map_err(|err| {
                debug!("rejecting IP address blocks: {}", err);
                ResourceError::from(err)
            })?;
        Self::from_wire(wire).map_err(|err| {
            debug!("rejecting IP address blocks: {}", err);
            err
        })
    }

    /// Takes the extension from the beginning of a constructed value.
    ///
    /// Any error with the addresses is reported as a content error.
    pub fn take_from<S: Source>(
        cons: &mut decode::Constructed<S>
    ) -> Result<Self, DecodeError<S::Error>> {
        let wire = Self::take_wire_from(cons)?;
        Self::from_wire(wire).map_err(|err| cons.content_err(err))
    }

    fn take_wire_from<S: Source>(
        cons: &mut decode::Constructed<S>
    ) -> Result<Vec<WireFamily>, DecodeError<S::Error>> {
        cons.take_sequence(|cons| {
            let mut res = Vec::new();
            while let Some(family) = cons.take_opt_sequence(|cons| {
                WireFamily::take_content_from(cons)
            })? {
                res.push(family)
            }
            Ok(res)
        })
    }

    fn from_wire(wire: Vec<WireFamily>) -> Result<Self, ResourceError> {
        Self::from_resources(
            wire.into_iter().map(WireFamily::into_resources)
                .collect::<Result<Vec<_>, _>>()?
        )
    }

    /// Returns a value encoder for the extension.
    pub fn encode_ref(&self) -> impl encode::Values + '_ {
        encode::sequence(
            encode::iter(self.0.iter().map(|item| item.encode_ref()))
        )
    }

    /// Returns the DER encoding of the extension.
    pub fn to_captured(&self) -> Captured {
        self.encode_ref().to_captured(Mode::Der)
    }
}


//--- IntoIterator

impl<'a> IntoIterator for &'a IpAddrBlocks {
    type Item = &'a IpResources;
    type IntoIter = slice::Iter<'a, IpResources>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}


//--- Display

impl fmt::Display for IpAddrBlocks {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.display(0))
    }
}


//------------ DisplayIpAddrBlocks -------------------------------------------

/// Helper type for rendering an extension with an indent.
///
/// The output has one line per address family followed by one line for
/// each of its blocks indented by two more spaces.
#[derive(Clone, Copy, Debug)]
pub struct DisplayIpAddrBlocks<'a> {
    blocks: &'a IpAddrBlocks,
    indent: usize,
}

impl<'a> fmt::Display for DisplayIpAddrBlocks<'a> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for item in self.blocks {
            write!(f, "{:indent$}{}", "", item.family, indent = self.indent)?;
            match item.choice {
                ResourcesChoice::Inherit => writeln!(f, ": inherit")?,
                ResourcesChoice::Blocks(ref blocks) => {
                    writeln!(f, ":")?;
                    for block in blocks.iter() {
                        writeln!(
                            f, "{:indent$}{}",
                            "", block.display(item.family.family()),
                            indent = self.indent + 2
                        )?;
                    }
                }
            }
        }
        Ok(())
    }
}


//------------ IpAddrBlocksBuilder -------------------------------------------

/// A builder for an IP Address Delegation extension.
#[derive(Clone, Debug, Default)]
pub struct IpAddrBlocksBuilder {
    families: Vec<(FamilyId, Option<IpBlocksBuilder>)>,
}

impl IpAddrBlocksBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the resources of the given family to inherit.
    pub fn inherit(&mut self, family: FamilyId) {
        *self.entry(family) = None
    }

    /// Adds blocks to the resources of the given family.
    ///
    /// If the family was set to inherit before, it is changed to blocks.
    pub fn blocks<F>(&mut self, family: FamilyId, build: F)
    where F: FnOnce(&mut IpBlocksBuilder) {
        build(self.entry(family).get_or_insert_with(IpBlocksBuilder::new))
    }

    fn entry(&mut self, family: FamilyId) -> &mut Option<IpBlocksBuilder> {
        let idx = match self.families.iter().position(|x| x.0 == family) {
            Some(idx) => idx,
            None => {
                self.families.push((family, Some(IpBlocksBuilder::new())));
                self.families.len() - 1
            }
        };
        &mut self.families[idx].1
    }

    /// Finishes building.
    ///
    /// The blocks of each family are canonicalized and the families are
    /// ordered by their identifier.
    pub fn finalize(self) -> Result<IpAddrBlocks, ResourceError> {
        let mut res = self.families.into_iter().map(|(family, builder)|
            -> Result<_, ResourceError>
        {
            let choice = match builder {
                Some(builder) => {
                    ResourcesChoice::Blocks(builder.finalize(family.family())?)
                }
                None => ResourcesChoice::Inherit
            };
            Ok(IpResources::new(family, choice))
        }).collect::<Result<Vec<_>, _>>()?;
        res.sort_by_key(|item| item.family);
        Ok(IpAddrBlocks(res))
    }
}


//------------ IpResources ---------------------------------------------------

/// The resources for a single address family.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct IpResources {
    family: FamilyId,
    choice: ResourcesChoice<IpBlocks>,
}

impl IpResources {
    pub fn new(family: FamilyId, choice: ResourcesChoice<IpBlocks>) -> Self {
        IpResources { family, choice }
    }

    /// Creates resources that are inherited from the issuer.
    pub fn inherit(family: FamilyId) -> Self {
        Self::new(family, ResourcesChoice::Inherit)
    }

    /// Creates resources from a set of blocks.
    pub fn blocks(family: FamilyId, blocks: IpBlocks) -> Self {
        Self::new(family, ResourcesChoice::Blocks(blocks))
    }

    pub fn family(&self) -> FamilyId {
        self.family
    }

    pub fn choice(&self) -> &ResourcesChoice<IpBlocks> {
        &self.choice
    }

    /// Returns whether the resources are of the inherited variant.
    pub fn is_inherited(&self) -> bool {
        self.choice.is_inherited()
    }

    /// Returns the blocks unless the resources are inherited.
    pub fn to_blocks(&self) -> Option<&IpBlocks> {
        self.choice.as_blocks()
    }

    /// Returns the resources with their blocks in canonical form.
    pub fn canonicalize(&self) -> Result<Self, ResourceError> {
        let family = self.family.family();
        Ok(Self::new(
            self.family,
            self.choice.clone().try_map_blocks(|blocks| {
                blocks.canonicalize(family)
            })?
        ))
    }

    /// Returns whether the blocks are in canonical form.
    ///
    /// Inherited resources are always canonical.
    pub fn is_canonical(&self) -> bool {
        match self.choice {
            ResourcesChoice::Inherit => true,
            ResourcesChoice::Blocks(ref blocks) => {
                blocks.is_canonical(self.family.family())
            }
        }
    }

    /// Returns a value encoder for the resources.
    pub fn encode_ref(&self) -> impl encode::Values + '_ {
        encode::sequence((
            self.family.encode(),
            match self.choice {
                ResourcesChoice::Inherit => {
                    encode::Choice2::One(().encode())
                }
                ResourcesChoice::Blocks(ref blocks) => {
                    encode::Choice2::Two(
                        blocks.encode_ref(self.family.family())
                    )
                }
            }
        ))
    }
}


//------------ IpBlocks ------------------------------------------------------

/// A sequence of address blocks of one address family.
///
/// The blocks are kept exactly as given. Use [`IpBlocks::canonicalize`] to
/// get the canonical form.
#[derive(Clone, Debug, Default, Eq, Hash, PartialEq)]
pub struct IpBlocks(Vec<IpBlock>);

impl IpBlocks {
    /// Creates empty address blocks.
    pub fn empty() -> Self {
        IpBlocks(Vec::new())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> slice::Iter<IpBlock> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[IpBlock] {
        self.0.as_slice()
    }

    /// Returns the canonical form of the blocks.
    pub fn canonicalize(
        &self, family: AddressFamily
    ) -> Result<Self, ResourceError> {
        chain::canonicalize(&self.0, family).map(IpBlocks)
    }

    /// Returns whether the blocks are in canonical form.
    ///
    /// Blocks that cannot be canonicalized are not canonical.
    pub fn is_canonical(&self, family: AddressFamily) -> bool {
        match self.canonicalize(family) {
            Ok(canonical) => canonical == *self,
            Err(_) => false
        }
    }

    /// Returns whether `self` covers all addresses of `other`.
    ///
    /// Neither side needs to be in canonical form. Both sides need to
    /// agree on the address width, though.
    pub fn covers(
        &self, other: &Self, family: AddressFamily
    ) -> Result<bool, ResourceError> {
        let width = chain::canonical_width(
            self.iter().chain(other.iter()), family
        )?;
        let superset = chain::canonicalize_width(&self.0, family, width)?;
        let subset = chain::canonicalize_width(&other.0, family, width)?;
        Ok(chain::covers(&superset, &subset, width))
    }

    /// Returns a value encoder for the blocks of the given family.
    pub fn encode_ref(
        &self, family: AddressFamily
    ) -> impl encode::Values + '_ {
        encode::sequence(
            encode::iter(self.0.iter().map(move |block| {
                block.encode_ref(family)
            }))
        )
    }

    /// Returns an object that displays the blocks for the given family.
    pub fn display(&self, family: AddressFamily) -> DisplayIpBlocks {
        DisplayIpBlocks { blocks: self, family }
    }
}


//--- From, FromIterator, Extend, and IntoIterator

impl From<Vec<IpBlock>> for IpBlocks {
    fn from(blocks: Vec<IpBlock>) -> Self {
        IpBlocks(blocks)
    }
}

impl FromIterator<IpBlock> for IpBlocks {
    fn from_iter<I>(iter: I) -> Self
    where I: IntoIterator<Item = IpBlock> {
        IpBlocks(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a IpBlocks {
    type Item = &'a IpBlock;
    type IntoIter = slice::Iter<'a, IpBlock>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}


//------------ DisplayIpBlocks -----------------------------------------------

/// Helper type displaying blocks as a comma-separated list.
#[derive(Clone, Copy, Debug)]
pub struct DisplayIpBlocks<'a> {
    blocks: &'a IpBlocks,
    family: AddressFamily,
}

impl<'a> fmt::Display for DisplayIpBlocks<'a> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut blocks_iter = self.blocks.iter();

        if let Some(el) = blocks_iter.next() {
            write!(f, "{}", el.display(self.family))?;
        }
        for el in blocks_iter {
            write!(f, ", {}", el.display(self.family))?;
        }
        Ok(())
    }
}


//------------ IpBlocksBuilder -----------------------------------------------

/// A builder for the blocks of a single address family.
#[derive(Clone, Debug, Default)]
pub struct IpBlocksBuilder(Vec<IpBlock>);

impl IpBlocksBuilder {
    pub fn new() -> Self {
        IpBlocksBuilder(Vec::new())
    }

    pub fn push<T: Into<IpBlock>>(&mut self, block: T) {
        self.0.push(block.into())
    }

    /// Finishes building and returns the blocks in canonical form.
    pub fn finalize(
        self, family: AddressFamily
    ) -> Result<IpBlocks, ResourceError> {
        chain::canonicalize(&self.0, family).map(IpBlocks)
    }
}

impl Extend<IpBlock> for IpBlocksBuilder {
    fn extend<T>(&mut self, iter: T)
    where T: IntoIterator<Item = IpBlock> {
        self.0.extend(iter)
    }
}


//------------ WireFamily ----------------------------------------------------

/// A resource block as found on the wire.
#[derive(Clone, Debug)]
struct WireFamily {
    family: FamilyId,
    choice: ResourcesChoice<Vec<WireExtent>>,
}

impl WireFamily {
    fn take_content_from<S: Source>(
        cons: &mut decode::Constructed<S>
    ) -> Result<Self, DecodeError<S::Error>> {
        let family = FamilyId::take_from(cons)?;
        let choice = cons.take_value(|tag, content| {
            if tag == Tag::NULL {
                content.to_null()?;
                Ok(ResourcesChoice::Inherit)
            }
            else if tag == Tag::SEQUENCE {
                let cons = content.as_constructed()?;
                let mut res = Vec::new();
                while let Some(extent) = WireExtent::take_opt_from(cons)? {
                    res.push(extent)
                }
                Ok(ResourcesChoice::Blocks(res))
            }
            else {
                Err(content.content_err("invalid IP address choice"))
            }
        })?;
        Ok(WireFamily { family, choice })
    }

    fn into_resources(self) -> Result<IpResources, ResourceError> {
        let family = self.family.family();
        Ok(IpResources::new(
            self.family,
            self.choice.try_map_blocks(|extents| {
                let width = match family.raw_width() {
                    Some(width) => width,
                    None => {
                        extents.iter().map(WireExtent::octet_len)
                            .max().unwrap_or(0)
                    }
                };
                extents.into_iter().map(|extent| {
                    extent.into_block(family, width)
                }).collect()
            })?
        ))
    }
}


//------------ WireExtent ----------------------------------------------------

/// A prefix or range as found on the wire.
#[derive(Clone, Debug)]
enum WireExtent {
    Prefix(AddrBits),
    Range(AddrBits, AddrBits),
}

impl WireExtent {
    fn take_opt_from<S: Source>(
        cons: &mut decode::Constructed<S>
    ) -> Result<Option<Self>, DecodeError<S::Error>> {
        cons.take_opt_value(|tag, content| {
            if tag == Tag::BIT_STRING {
                AddrBits::from_primitive(
                    content.as_primitive()?
                ).map(WireExtent::Prefix)
            }
            else if tag == Tag::SEQUENCE {
                let cons = content.as_constructed()?;
                let min = AddrBits::take_from(cons)?;
                let max = AddrBits::take_from(cons)?;
                Ok(WireExtent::Range(min, max))
            }
            else {
                Err(content.content_err("invalid IP address or range"))
            }
        })
    }

    /// Returns the octet length of the extent’s longest bit-string.
    fn octet_len(&self) -> usize {
        match *self {
            WireExtent::Prefix(ref prefix) => prefix.octet_len(),
            WireExtent::Range(ref min, ref max) => {
                cmp::max(min.octet_len(), max.octet_len())
            }
        }
    }

    /// Converts the extent into a block of the given family and width.
    ///
    /// For unknown families, `width` is the length of the longest
    /// bit-string of the whole family block.
    fn into_block(
        self, family: AddressFamily, width: usize
    ) -> Result<IpBlock, ResourceError> {
        match self {
            WireExtent::Prefix(prefix) => {
                if prefix.octet_len() > width || width > MAX_ADDR_LEN {
                    return Err(ResourceError::malformed_address(format!(
                        "prefix too long for {}", family
                    )))
                }
                if !prefix.has_clear_slack() {
                    return Err(ResourceError::malformed_address(
                        "unused bits set in prefix"
                    ))
                }
                Ok(IpBlock::Prefix(prefix))
            }
            WireExtent::Range(min, max) => {
                AddressRange::new(
                    min.expand(width, FILL_MIN)?,
                    max.expand(width, FILL_MAX)?
                ).map(IpBlock::Range)
            }
        }
    }
}


//============ Tests =========================================================
