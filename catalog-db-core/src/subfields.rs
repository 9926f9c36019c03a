//! Ordered subfield multimap.
//!
//! A data field's subfields are kept exactly as they occur on the wire: a
//! sequence of `(code, value)` pairs in which codes may repeat. Lookups by
//! code return every occurrence in order. Repeats are never merged in
//! storage; [`Subfields::display_map`] is the single place where they are
//! joined, and it is only meant for presentation.

use serde::{Deserialize, Serialize};

/// Separator used when repeated codes are joined for display.
pub const DISPLAY_JOIN: &str = " ; ";

/// One coded value inside a data field.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Subfield {
    pub code: char,
    pub value: String,
}

impl Subfield {
    pub fn new(code: char, value: impl Into<String>) -> Self {
        Self {
            code,
            value: value.into(),
        }
    }
}

/// Ordered multimap from subfield code to values.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Subfields(Vec<Subfield>);

impl Subfields {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Append an occurrence; an existing code is never overwritten.
    pub fn push(&mut self, code: char, value: impl Into<String>) {
        self.0.push(Subfield::new(code, value));
    }

    pub fn iter(&self) -> impl Iterator<Item = &Subfield> {
        self.0.iter()
    }

    /// Every value for `code`, in field order.
    pub fn values<'a>(&'a self, code: char) -> impl Iterator<Item = &'a str> + 'a {
        self.0
            .iter()
            .filter(move |sf| sf.code == code)
            .map(|sf| sf.value.as_str())
    }

    /// First value for `code`.
    pub fn first(&self, code: char) -> Option<&str> {
        self.values(code).next()
    }

    pub fn contains_code(&self, code: char) -> bool {
        self.0.iter().any(|sf| sf.code == code)
    }

    /// Distinct codes in order of first appearance.
    pub fn codes(&self) -> Vec<char> {
        let mut seen = Vec::new();
        for sf in &self.0 {
            if !seen.contains(&sf.code) {
                seen.push(sf.code);
            }
        }
        seen
    }

    /// Drop every occurrence of `code`, returning how many were removed.
    pub fn remove_code(&mut self, code: char) -> usize {
        let before = self.0.len();
        self.0.retain(|sf| sf.code != code);
        before - self.0.len()
    }

    /// Codes mapped to their joined values, in order of first appearance.
    ///
    /// Presentation only: repeats are joined with [`DISPLAY_JOIN`].
    pub fn display_map(&self) -> Vec<(char, String)> {
        self.codes()
            .into_iter()
            .map(|code| (code, self.values(code).collect::<Vec<_>>().join(DISPLAY_JOIN)))
            .collect()
    }

    pub fn into_vec(self) -> Vec<Subfield> {
        self.0
    }
}

impl From<Vec<Subfield>> for Subfields {
    fn from(v: Vec<Subfield>) -> Self {
        Subfields(v)
    }
}

impl<S: Into<String>> FromIterator<(char, S)> for Subfields {
    fn from_iter<I: IntoIterator<Item = (char, S)>>(iter: I) -> Self {
        Subfields(
            iter.into_iter()
                .map(|(code, value)| Subfield::new(code, value))
                .collect(),
        )
    }
}

impl<'a> IntoIterator for &'a Subfields {
    type Item = &'a Subfield;
    type IntoIter = std::slice::Iter<'a, Subfield>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
