//! Helpers for reading loosely typed values out of owned NBT trees.
//!
//! Older saves store the same field with different numeric widths, so readers
//! accept any integer tag that fits.

use simdnbt::owned::{NbtCompound, NbtList, NbtTag};

/// Parses a boolean from a Byte or Int tag.
#[must_use]
pub fn nbt_bool(tag: &NbtTag) -> Option<bool> {
    match tag {
        NbtTag::Byte(b) => Some(*b != 0),
        NbtTag::Int(i) => Some(*i != 0),
        _ => None,
    }
}

/// Parses an i32 from any integer tag no wider than Int.
#[must_use]
pub fn nbt_i32(tag: &NbtTag) -> Option<i32> {
    match tag {
        NbtTag::Byte(b) => Some(i32::from(*b)),
        NbtTag::Short(s) => Some(i32::from(*s)),
        NbtTag::Int(i) => Some(*i),
        _ => None,
    }
}

/// Parses an i64 from any integer tag.
#[must_use]
pub fn nbt_i64(tag: &NbtTag) -> Option<i64> {
    match tag {
        NbtTag::Long(l) => Some(*l),
        other => nbt_i32(other).map(i64::from),
    }
}

/// Reads a string tag.
#[must_use]
pub fn nbt_string(tag: &NbtTag) -> Option<String> {
    match tag {
        NbtTag::String(s) => Some(s.to_str().to_string()),
        _ => None,
    }
}

/// Reads `key` from `nbt` as an i32.
#[must_use]
pub fn get_i32(nbt: &NbtCompound, key: &str) -> Option<i32> {
    nbt.get(key).and_then(nbt_i32)
}

/// Reads `key` from `nbt` as an i64.
#[must_use]
pub fn get_i64(nbt: &NbtCompound, key: &str) -> Option<i64> {
    nbt.get(key).and_then(nbt_i64)
}

/// Reads `key` from `nbt` as a boolean.
#[must_use]
pub fn get_bool(nbt: &NbtCompound, key: &str) -> Option<bool> {
    nbt.get(key).and_then(nbt_bool)
}

/// Reads `key` from `nbt` as a string.
#[must_use]
pub fn get_string(nbt: &NbtCompound, key: &str) -> Option<String> {
    nbt.get(key).and_then(nbt_string)
}

/// Reads `key` from `nbt` as a nested compound.
#[must_use]
pub fn get_compound<'a>(nbt: &'a NbtCompound, key: &str) -> Option<&'a NbtCompound> {
    match nbt.get(key)? {
        NbtTag::Compound(compound) => Some(compound),
        _ => None,
    }
}

/// Reads `key` from `nbt` as a list of compounds. An empty list reads as an empty slice.
#[must_use]
pub fn get_compound_list<'a>(nbt: &'a NbtCompound, key: &str) -> Option<&'a [NbtCompound]> {
    match nbt.get(key)? {
        NbtTag::List(NbtList::Compound(compounds)) => Some(compounds),
        NbtTag::List(NbtList::Empty) => Some(&[]),
        _ => None,
    }
}

/// Builds a list tag from compounds, using the empty list form when there are none.
#[must_use]
pub fn compound_list(compounds: Vec<NbtCompound>) -> NbtTag {
    if compounds.is_empty() {
        NbtTag::List(NbtList::Empty)
    } else {
        NbtTag::List(NbtList::Compound(compounds))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_widths() {
        let mut nbt = NbtCompound::new();
        nbt.insert("a", NbtTag::Byte(3));
        nbt.insert("b", NbtTag::Short(-4));
        nbt.insert("c", NbtTag::Long(1 << 40));
        nbt.insert("d", NbtTag::String("x".to_string().into()));

        assert_eq!(get_i32(&nbt, "a"), Some(3));
        assert_eq!(get_i32(&nbt, "b"), Some(-4));
        assert_eq!(get_i32(&nbt, "c"), None);
        assert_eq!(get_i64(&nbt, "c"), Some(1 << 40));
        assert_eq!(get_i32(&nbt, "d"), None);
        assert_eq!(get_string(&nbt, "d").as_deref(), Some("x"));
        assert_eq!(get_bool(&nbt, "a"), Some(true));
    }

    #[test]
    fn test_compound_list() {
        let mut nbt = NbtCompound::new();
        nbt.insert("Empty", compound_list(Vec::new()));
        nbt.insert("Items", compound_list(vec![NbtCompound::new()]));
        assert_eq!(get_compound_list(&nbt, "Empty").map(<[_]>::len), Some(0));
        assert_eq!(get_compound_list(&nbt, "Items").map(<[_]>::len), Some(1));
        assert!(get_compound_list(&nbt, "Missing").is_none());
    }
}
