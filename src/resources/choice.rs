//! The choice between inherited and included resources.

use std::fmt;
use crate::error::ResourceError;


//------------ ResourcesChoice -----------------------------------------------

/// The option to either include or inherit resources.
///
/// This is generic over the type of included resources.
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ResourcesChoice<T> {
    /// Resources are to be inherited from the issuer.
    Inherit,

    /// The resources are provided as a set of blocks.
    Blocks(T),
}

impl<T> ResourcesChoice<T> {
    /// Returns whether the resources are of the inherited variant.
    pub fn is_inherited(&self) -> bool {
        matches!(self, ResourcesChoice::Inherit)
    }

    /// Returns a reference to the blocks if there are any.
    pub fn as_blocks(&self) -> Option<&T> {
        match *self {
            ResourcesChoice::Inherit => None,
            ResourcesChoice::Blocks(ref blocks) => Some(blocks),
        }
    }

    /// Converts the choice into a different choice via a closure.
    ///
    /// Inherited resources are returned unchanged.
    pub fn map_blocks<U, F>(self, f: F) -> ResourcesChoice<U>
    where F: FnOnce(T) -> U {
        match self {
            ResourcesChoice::Inherit => ResourcesChoice::Inherit,
            ResourcesChoice::Blocks(t) => ResourcesChoice::Blocks(f(t))
        }
    }

    /// Converts the choice via a fallible closure.
    pub fn try_map_blocks<U, F>(
        self, f: F
    ) -> Result<ResourcesChoice<U>, ResourceError>
    where F: FnOnce(T) -> Result<U, ResourceError> {
        match self {
            ResourcesChoice::Inherit => Ok(ResourcesChoice::Inherit),
            ResourcesChoice::Blocks(t) => f(t).map(ResourcesChoice::Blocks)
        }
    }
}


//--- Display

impl<T: fmt::Display> fmt::Display for ResourcesChoice<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            ResourcesChoice::Inherit => write!(f, "inherit"),
            ResourcesChoice::Blocks(ref inner) => write!(f, "{}", inner)
        }
    }
}


//============ Tests =========================================================

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn map_blocks() {
        let choice: ResourcesChoice<u8> = ResourcesChoice::Blocks(7);
        assert_eq!(choice.map_blocks(u32::from), ResourcesChoice::Blocks(7));
        let choice: ResourcesChoice<u8> = ResourcesChoice::Inherit;
        assert!(choice.map_blocks(u32::from).is_inherited());
        assert_eq!(ResourcesChoice::Blocks(7).as_blocks(), Some(&7));
    }

    #[test]
    fn display() {
        assert_eq!(
            ResourcesChoice::<u8>::Inherit.to_string(), "inherit"
        );
        assert_eq!(ResourcesChoice::Blocks(12).to_string(), "12");
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serde() {
        let choice: ResourcesChoice<Vec<u8>> = ResourcesChoice::Blocks(
            vec![1, 2]
        );
        let json = serde_json::to_string(&choice).unwrap();
        assert_eq!(json, r#"{"Blocks":[1,2]}"#);
        assert_eq!(
            serde_json::from_str::<ResourcesChoice<Vec<u8>>>(&json).unwrap(),
            choice
        );
        assert_eq!(
            serde_json::to_string(&ResourcesChoice::<u8>::Inherit).unwrap(),
            r#""Inherit""#
        );
    }
}
