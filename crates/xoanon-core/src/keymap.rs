use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::key::Key;

/// A mapping from a produced character to the key that produces it.
///
/// Built once per session by empirical probing (or loaded from the disk
/// cache) and then treated as immutable; queries translate arbitrary text
/// into key sequences.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct KeyMap {
    keys: HashMap<char, Key>,
}

impl KeyMap {
    pub fn new(keys: HashMap<char, Key>) -> Self {
        Self { keys }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn get(&self, c: char) -> Option<Key> {
        self.keys.get(&c).copied()
    }

    /// Record that typing `key` produces `c`. A later insertion for the
    /// same character overwrites the earlier one: last candidate wins.
    pub fn insert(&mut self, c: char, key: Key) {
        self.keys.insert(c, key);
    }

    /// Translate text into the key sequence that types it.
    ///
    /// Fails with [`Error::NoKeyMapping`] on the first character with no
    /// known key; no partial sequence is returned.
    pub fn to_keys(&self, text: &str) -> Result<Vec<Key>> {
        let mut keys = Vec::with_capacity(text.len());
        for c in text.chars() {
            keys.push(self.get(c).ok_or(Error::NoKeyMapping(c))?);
        }
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::KeyCode;

    fn sample() -> KeyMap {
        let mut map = KeyMap::empty();
        map.insert('h', Key::plain(KeyCode::H));
        map.insert('i', Key::plain(KeyCode::I));
        map.insert('H', Key::shifted(KeyCode::H));
        map
    }

    #[test]
    fn test_to_keys_pure() {
        let map = sample();
        let first = map.to_keys("Hi").unwrap();
        let second = map.to_keys("Hi").unwrap();
        assert_eq!(first, second);
        assert_eq!(first, vec![Key::shifted(KeyCode::H), Key::plain(KeyCode::I)]);
    }

    #[test]
    fn test_to_keys_unknown_character() {
        let map = sample();
        match map.to_keys("h!") {
            Err(Error::NoKeyMapping('!')) => {}
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_insert_last_wins() {
        let mut map = KeyMap::empty();
        map.insert('x', Key::plain(KeyCode::X));
        map.insert('x', Key::shifted(KeyCode::Y));
        assert_eq!(map.get('x'), Some(Key::shifted(KeyCode::Y)));
        assert_eq!(map.len(), 1);
    }
}
