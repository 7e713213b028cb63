//! Recognizable character set
//!
//! The charset doubles as the network's output encoding: index `i` of the
//! output vector corresponds to `chars[i]`, both when building one-hot
//! training labels and when decoding an arg-max at recognition time. It is
//! immutable once a model has been trained against it.

use serde::{Deserialize, Serialize};

use crate::error::OcrError;

/// Ordered set of unique characters with a stable index <-> char bijection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Charset {
    chars: Vec<char>,
}

impl Charset {
    /// Build a charset from a string. Rejects empty input and duplicate
    /// characters, since a duplicate would break the index bijection.
    pub fn new(s: &str) -> Result<Self, OcrError> {
        if s.is_empty() {
            return Err(OcrError::InvalidCharset("charset is empty".into()));
        }

        let mut chars = Vec::with_capacity(s.len());
        for c in s.chars() {
            if chars.contains(&c) {
                return Err(OcrError::InvalidCharset(format!(
                    "duplicate character {c:?}"
                )));
            }
            chars.push(c);
        }

        Ok(Self { chars })
    }

    /// Number of characters, which is also the network's output width.
    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    /// Index of a character, if it belongs to the set.
    pub fn index_of(&self, c: char) -> Option<usize> {
        self.chars.iter().position(|&x| x == c)
    }

    /// Character at an output index.
    pub fn char_at(&self, index: usize) -> Option<char> {
        self.chars.get(index).copied()
    }

    /// One-hot label vector for a character: length `len()`, exactly one
    /// entry set to 1.0 at the character's index.
    pub fn one_hot(&self, c: char) -> Option<Vec<f32>> {
        let index = self.index_of(c)?;
        let mut label = vec![0.0; self.chars.len()];
        label[index] = 1.0;
        Some(label)
    }

    /// Iterate the characters in index order.
    pub fn iter(&self) -> impl Iterator<Item = char> + '_ {
        self.chars.iter().copied()
    }
}

impl From<Charset> for String {
    fn from(charset: Charset) -> Self {
        charset.chars.into_iter().collect()
    }
}

impl TryFrom<String> for Charset {
    type Error = OcrError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Charset::new(&s)
    }
}

/// Index of the maximum entry of an output vector, with its value.
/// Empty vectors yield nothing.
pub fn arg_max(values: &[f32]) -> Option<(usize, f32)> {
    values
        .iter()
        .copied()
        .enumerate()
        .fold(None, |best, (i, v)| match best {
            Some((_, bv)) if bv >= v => best,
            _ => Some((i, v)),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_and_duplicates() {
        assert!(Charset::new("").is_err());
        assert!(Charset::new("ABA").is_err());
        assert!(Charset::new("AB").is_ok());
    }

    #[test]
    fn index_char_bijection() {
        let charset = Charset::new("ABC123").unwrap();
        for (i, c) in "ABC123".chars().enumerate() {
            assert_eq!(charset.index_of(c), Some(i));
            assert_eq!(charset.char_at(i), Some(c));
        }
        assert_eq!(charset.index_of('Z'), None);
        assert_eq!(charset.char_at(6), None);
    }

    #[test]
    fn one_hot_round_trips_through_arg_max() {
        let charset = Charset::new("0123456789XYZ").unwrap();
        let chars: Vec<char> = charset.iter().collect();
        for c in chars {
            let label = charset.one_hot(c).unwrap();
            assert_eq!(label.len(), charset.len());
            assert_eq!(label.iter().filter(|&&v| v == 1.0).count(), 1);

            let (index, value) = arg_max(&label).unwrap();
            assert_eq!(value, 1.0);
            assert_eq!(charset.char_at(index), Some(c));
        }
    }

    #[test]
    fn serde_round_trip_as_string() {
        let charset = Charset::new("AB12").unwrap();
        let json = serde_json::to_string(&charset).unwrap();
        assert_eq!(json, "\"AB12\"");

        let parsed: Charset = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, charset);
    }

    #[test]
    fn arg_max_prefers_first_of_equal_entries() {
        assert_eq!(arg_max(&[0.5, 0.5]), Some((0, 0.5)));
        assert_eq!(arg_max(&[]), None);
    }
}
