//! Named profile storage
//!
//! A [`ProfileStore`] is an ordered map from lowercase profile name to an
//! owned byte buffer. Iteration uses a cursor (reset + next) so callers can
//! delete the current entry and keep walking.

use std::collections::BTreeMap;
use std::ops::Bound;

/// An opaque named metadata blob
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    name: String,
    data: Vec<u8>,
}

impl Profile {
    /// Create a profile; the name is lowercased
    pub fn new(name: &str, data: Vec<u8>) -> Self {
        Self {
            name: name.to_ascii_lowercase(),
            data,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    pub(crate) fn data_mut(&mut self) -> &mut Vec<u8> {
        &mut self.data
    }
}

impl AsRef<[u8]> for Profile {
    fn as_ref(&self) -> &[u8] {
        &self.data
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
enum Cursor {
    #[default]
    Start,
    After(String),
}

/// Ordered collection of profiles keyed by lowercase name
#[derive(Debug, Clone, Default)]
pub struct ProfileStore {
    entries: BTreeMap<String, Profile>,
    cursor: Cursor,
}

impl ProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(&name.to_ascii_lowercase())
    }

    pub fn get(&self, name: &str) -> Option<&Profile> {
        self.entries.get(&name.to_ascii_lowercase())
    }

    pub(crate) fn get_mut(&mut self, name: &str) -> Option<&mut Profile> {
        self.entries.get_mut(&name.to_ascii_lowercase())
    }

    /// Insert or replace, returning the previous profile of that name
    pub fn insert(&mut self, profile: Profile) -> Option<Profile> {
        self.entries.insert(profile.name.clone(), profile)
    }

    pub fn remove(&mut self, name: &str) -> Option<Profile> {
        self.entries.remove(&name.to_ascii_lowercase())
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.cursor = Cursor::Start;
    }

    /// Profile names in order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Profile> {
        self.entries.values()
    }

    /// Rewind the cursor to the first profile
    pub fn reset_iterator(&mut self) {
        self.cursor = Cursor::Start;
    }

    /// Advance the cursor and return the next profile name
    pub fn next_name(&mut self) -> Option<String> {
        let next = match &self.cursor {
            Cursor::Start => self.entries.keys().next(),
            Cursor::After(last) => self
                .entries
                .range::<String, _>((Bound::Excluded(last), Bound::Unbounded))
                .map(|(k, _)| k)
                .next(),
        }
        .cloned();
        if let Some(name) = &next {
            self.cursor = Cursor::After(name.clone());
        }
        next
    }
}
