use serde::{Deserialize, Serialize};
use std::fmt;

/// A set of bytes backed by a 256-bit table
#[derive(Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "Vec<u8>", into = "Vec<u8>")]
pub struct ByteSet([u64; 4]);

impl ByteSet {
    /// Create an empty set
    pub fn new() -> Self {
        ByteSet::default()
    }

    /// The printable ASCII range, 32 to 126
    pub fn printable() -> Self {
        (32u8..=126).collect()
    }

    /// Add a byte
    pub fn insert(&mut self, byte: u8) {
        self.0[usize::from(byte >> 6)] |= 1 << (byte & 63);
    }

    /// Check membership
    #[inline]
    pub fn contains(&self, byte: u8) -> bool {
        self.0[usize::from(byte >> 6)] & (1 << (byte & 63)) != 0
    }

    /// Whether every byte of `text` is in the set
    pub fn contains_all(&self, text: &str) -> bool {
        text.bytes().all(|b| self.contains(b))
    }

    /// Add every byte of `other`
    pub fn union_with(&mut self, other: &ByteSet) {
        for (word, other) in self.0.iter_mut().zip(other.0) {
            *word |= other;
        }
    }

    /// Number of bytes in the set
    pub fn len(&self) -> usize {
        self.0.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Whether the set is empty
    pub fn is_empty(&self) -> bool {
        self.0.iter().all(|w| *w == 0)
    }

    /// Bytes in ascending order
    pub fn iter(&self) -> impl Iterator<Item = u8> + '_ {
        (0u8..=255).filter(|b| self.contains(*b))
    }
}

impl FromIterator<u8> for ByteSet {
    fn from_iter<I: IntoIterator<Item = u8>>(iter: I) -> Self {
        let mut set = ByteSet::new();
        for byte in iter {
            set.insert(byte);
        }
        set
    }
}

impl From<Vec<u8>> for ByteSet {
    fn from(bytes: Vec<u8>) -> Self {
        bytes.into_iter().collect()
    }
}

impl From<ByteSet> for Vec<u8> {
    fn from(set: ByteSet) -> Self {
        set.iter().collect()
    }
}

impl fmt::Display for ByteSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.iter() {
            if byte.is_ascii_graphic() || byte == b' ' {
                write!(f, "{}", char::from(byte))?;
            } else {
                write!(f, "\\x{:02x}", byte)?;
            }
        }
        Ok(())
    }
}

impl fmt::Debug for ByteSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ByteSet(\"{}\")", self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_contains() {
        let mut set = ByteSet::new();
        assert!(set.is_empty());
        set.insert(0);
        set.insert(b'a');
        set.insert(255);
        assert!(set.contains(0));
        assert!(set.contains(b'a'));
        assert!(set.contains(255));
        assert!(!set.contains(b'b'));
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn test_printable() {
        let set = ByteSet::printable();
        assert_eq!(set.len(), 95);
        assert!(set.contains(b' '));
        assert!(set.contains(b'~'));
        assert!(!set.contains(b'\n'));
        assert!(set.contains_all("PAGE-5"));
    }

    #[test]
    fn test_union() {
        let mut a: ByteSet = b"ab".iter().copied().collect();
        let b: ByteSet = b"bc".iter().copied().collect();
        a.union_with(&b);
        assert_eq!(a.iter().collect::<Vec<_>>(), b"abc".to_vec());
    }

    #[test]
    fn test_serde_as_byte_list() {
        let set: ByteSet = b"ba".iter().copied().collect();
        let json = serde_json::to_string(&set).unwrap();
        assert_eq!(json, "[97,98]");
        let back: ByteSet = serde_json::from_str(&json).unwrap();
        assert_eq!(back, set);
    }

    #[test]
    fn test_display() {
        let set: ByteSet = [b'-', b'0', b'\t'].into_iter().collect();
        assert_eq!(set.to_string(), "\\x09-0");
    }
}
