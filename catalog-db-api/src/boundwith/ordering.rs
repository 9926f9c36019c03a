//! Child ordering for "contains" ordinals.
//!
//! Total order: publication year ascending (unknown last), then parsed
//! enumeration ascending (unknown last), then case-folded normalized title,
//! then record id.

use catalog_db_core::{descriptive, CatalogRecord, RecordId};
use std::cmp::Ordering;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OrderKey {
    pub year: Option<i32>,
    pub enumeration: Option<u32>,
    pub folded_title: String,
    pub id: RecordId,
}

impl OrderKey {
    pub fn for_record(id: RecordId, record: &CatalogRecord) -> Self {
        let title = descriptive::normalized_title(record);
        Self {
            year: descriptive::publication_year(record),
            enumeration: descriptive::enumeration(&title),
            folded_title: title.to_lowercase(),
            id,
        }
    }
}

fn unknown_last<T: Ord>(a: &Option<T>, b: &Option<T>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

impl Ord for OrderKey {
    fn cmp(&self, other: &Self) -> Ordering {
        unknown_last(&self.year, &other.year)
            .then_with(|| unknown_last(&self.enumeration, &other.enumeration))
            .then_with(|| self.folded_title.cmp(&other.folded_title))
            .then_with(|| self.id.cmp(&other.id))
    }
}

impl PartialOrd for OrderKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(year: Option<i32>, enumeration: Option<u32>, title: &str, id: u64) -> OrderKey {
        OrderKey {
            year,
            enumeration,
            folded_title: title.to_lowercase(),
            id: RecordId(id),
        }
    }

    #[test]
    fn years_then_enumeration_then_title() {
        let mut keys = vec![
            key(None, Some(1), "a", 1),
            key(Some(1992), None, "b", 2),
            key(Some(1990), Some(2), "c", 3),
            key(Some(1990), Some(1), "z", 4),
            key(Some(1990), None, "a", 5),
        ];
        keys.sort();
        let ids: Vec<u64> = keys.iter().map(|k| k.id.get()).collect();
        assert_eq!(ids, vec![4, 3, 5, 2, 1]);
    }

    #[test]
    fn id_breaks_full_ties() {
        let mut keys = vec![key(None, None, "same", 9), key(None, None, "same", 3)];
        keys.sort();
        assert_eq!(keys[0].id, RecordId(3));
    }
}
