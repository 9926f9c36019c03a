//! Boundwith linking: idempotence, ordinals, identifiers, partial batches.

mod support;

use catalog_db_api::{ApiError, HoldingsData, MissingChildPolicy};
use catalog_db_core::{CatalogRecord, Field, Indicators, RecordId};
use std::sync::Arc;
use support::*;

/// id 1 host, ids 2..=4 children published 1992, 1990, 1991; id 5 has no
/// identifiers at all.
fn collection() -> Vec<CatalogRecord> {
    vec![
        record(Some("host1"), Some("9000"), "Bound pamphlets /", None),
        record(Some("c2"), Some("9002"), "Mineral survey.", Some("1992")),
        record(Some("c3"), Some("9003"), "Mineral survey.", Some("1990.")),
        record(Some("c4"), Some("9004"), "Mineral survey.", Some("[1991]")),
        record(None, None, "Loose leaflet", None),
    ]
}

fn contains_fields(rec: &CatalogRecord) -> Vec<&Field> {
    rec.fields_with_tag("774").collect()
}

#[tokio::test]
async fn relinking_is_idempotent_and_ordered_by_year() {
    let h = Harness::with_records(&collection());
    let children = [RecordId(2), RecordId(3), RecordId(4)];

    for _ in 0..2 {
        let outcome = h.catalog.link(RecordId(1), &children, None).await.unwrap();
        assert_eq!(outcome.child_ids, vec![RecordId(3), RecordId(4), RecordId(2)]);
        assert_eq!(outcome.host_identifier, "(OCoLC)9000");
        assert!(outcome.skipped.is_empty());
    }

    let host = h.catalog.resolve(RecordId(1), true).await.unwrap();
    let links = contains_fields(&host);
    assert_eq!(links.len(), 3);
    let pairs: Vec<(&str, &str)> = links
        .iter()
        .map(|f| (f.first('g').unwrap(), f.first('w').unwrap()))
        .collect();
    assert_eq!(
        pairs,
        vec![("1", "(OCoLC)9003"), ("2", "(OCoLC)9004"), ("3", "(OCoLC)9002")]
    );
    assert_eq!(links[0].first('i'), Some("Contains:"));
    assert_eq!(links[0].first('t'), Some("Mineral survey"));

    for id in children {
        let child = h.catalog.resolve(id, true).await.unwrap();
        let back: Vec<&Field> = child.fields_with_tag("773").collect();
        assert_eq!(back.len(), 1, "child {id}");
        assert_eq!(back[0].first('w'), Some("(OCoLC)9000"));
        assert_eq!(back[0].first('t'), Some("Bound pamphlets"));
    }
}

#[tokio::test]
async fn legacy_link_encodings_are_replaced() {
    let mut recs = collection();
    recs[0].push(
        Field::data(tag(b"774"), Indicators::new('0', ' '))
            .subfield('t', "Old child")
            .subfield('w', "(CatDB)local-77"),
    );
    recs[0].push(
        Field::data(tag(b"774"), Indicators::new('0', '8'))
            .subfield('i', "Supplement:")
            .subfield('w', "(OCoLC)1"),
    );
    recs[1].push(
        Field::data(tag(b"773"), Indicators::new('0', ' '))
            .subfield('t', "Old host")
            .subfield('w', "(CatDB)local-77"),
    );
    recs[1].push(Field::data(tag(b"501"), Indicators::BLANK).subfield('a', "Bound with: Old host."));
    let h = Harness::with_records(&recs);

    h.catalog.link(RecordId(1), &[RecordId(2)], None).await.unwrap();

    let host = h.catalog.resolve(RecordId(1), true).await.unwrap();
    let links = contains_fields(&host);
    assert_eq!(links.len(), 2);
    assert!(links.iter().any(|f| f.first('i') == Some("Supplement:")));
    assert!(links.iter().all(|f| f.first('w') != Some("(CatDB)local-77")));

    let child = h.catalog.resolve(RecordId(2), true).await.unwrap();
    assert_eq!(child.fields_with_tag("773").count(), 1);
    assert!(child.first_field("501").is_none());
}

#[tokio::test]
async fn child_without_identifiers_gets_local_fallback() {
    let h = Harness::with_records(&collection());
    h.catalog.link(RecordId(1), &[RecordId(5)], None).await.unwrap();
    let host = h.catalog.resolve(RecordId(1), true).await.unwrap();
    assert_eq!(contains_fields(&host)[0].first('w'), Some("(CatDB)local-5"));

    let relationship = h.catalog.lookup(RecordId(1)).await.unwrap();
    assert!(relationship.is_host);
    assert_eq!(relationship.child_ids, vec![RecordId(5)]);
}

#[tokio::test]
async fn missing_child_aborts_by_default() {
    let h = Harness::with_records(&collection());
    let err = h
        .catalog
        .link(RecordId(1), &[RecordId(2), RecordId(404)], None)
        .await
        .unwrap_err();
    assert!(err.is_not_found(), "{err}");
    assert!(h.catalog.history(RecordId(1)).await.unwrap().is_empty());
    assert!(h.catalog.history(RecordId(2)).await.unwrap().is_empty());
}

#[tokio::test]
async fn missing_child_can_be_skipped() {
    let h = Harness::with_records(&collection())
        .with_config(|c| c.link.missing_child = MissingChildPolicy::Skip);
    let outcome = h
        .catalog
        .link(RecordId(1), &[RecordId(404), RecordId(2), RecordId(3)], None)
        .await
        .unwrap();
    assert_eq!(outcome.child_ids, vec![RecordId(3), RecordId(2)]);
    assert_eq!(outcome.skipped.len(), 1);
    assert_eq!(outcome.skipped[0].id, RecordId(404));

    let host = h.catalog.resolve(RecordId(1), true).await.unwrap();
    let ordinals: Vec<&str> = contains_fields(&host).iter().map(|f| f.first('g').unwrap()).collect();
    assert_eq!(ordinals, vec!["1", "2"]);
}

#[tokio::test]
async fn unrelated_relationships_survive_relinking() {
    let mut records = collection();
    records[1].push(
        Field::data(tag(b"773"), Indicators::new('0', ' '))
            .subfield('i', "In:")
            .subfield('t', "Mineral survey series")
            .subfield('w', "(OCoLC)5555"),
    );
    records[0].push(
        Field::data(tag(b"774"), Indicators::new('0', ' '))
            .subfield('i', "Supplement:")
            .subfield('w', "(OCoLC)6666"),
    );
    let h = Harness::with_records(&records);

    for _ in 0..2 {
        h.catalog.link(RecordId(1), &[RecordId(2), RecordId(3)], None).await.unwrap();
    }

    let child = h.catalog.resolve(RecordId(2), true).await.unwrap();
    let series: Vec<&Field> = child
        .fields_with_tag("773")
        .filter(|f| f.first('i') == Some("In:"))
        .collect();
    assert_eq!(series.len(), 1);
    assert_eq!(series[0].first('w'), Some("(OCoLC)5555"));
    assert_eq!(child.fields_with_tag("773").count(), 2);

    let host = h.catalog.resolve(RecordId(1), true).await.unwrap();
    let supplements = contains_fields(&host)
        .into_iter()
        .filter(|f| f.first('i') == Some("Supplement:"))
        .count();
    assert_eq!(supplements, 1);
    assert_eq!(contains_fields(&host).len(), 3);
}

#[tokio::test]
async fn missing_host_always_fails() {
    let h = Harness::with_records(&collection())
        .with_config(|c| c.link.missing_child = MissingChildPolicy::Skip);
    let err = h.catalog.link(RecordId(404), &[RecordId(2)], None).await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn failed_child_write_is_left_out_and_ordinals_renumbered() {
    let overlay = Arc::new(RejectingOverlay::rejecting(&[RecordId(4)]));
    let h = Harness::with_overlay(&collection(), overlay);
    let outcome = h
        .catalog
        .link(RecordId(1), &[RecordId(2), RecordId(3), RecordId(4)], None)
        .await
        .unwrap();
    assert_eq!(outcome.child_ids, vec![RecordId(3), RecordId(2)]);
    assert_eq!(outcome.skipped[0].id, RecordId(4));

    let host = h.catalog.resolve(RecordId(1), true).await.unwrap();
    let pairs: Vec<(&str, &str)> = contains_fields(&host)
        .iter()
        .map(|f| (f.first('g').unwrap(), f.first('w').unwrap()))
        .collect();
    assert_eq!(pairs, vec![("1", "(OCoLC)9003"), ("2", "(OCoLC)9002")]);
}

#[tokio::test]
async fn holdings_go_on_the_host_only() {
    let h = Harness::with_records(&collection());
    let holdings = HoldingsData {
        barcode: Some("31234000111".into()),
        call_number: Some("I 19.3:".into()),
        location: Some("Federal documents".into()),
        note: None,
    };
    h.catalog
        .link(RecordId(1), &[RecordId(2), RecordId(3)], Some(&holdings))
        .await
        .unwrap();
    h.catalog
        .link(RecordId(1), &[RecordId(2), RecordId(3)], Some(&holdings))
        .await
        .unwrap();

    let host = h.catalog.resolve(RecordId(1), true).await.unwrap();
    let items: Vec<&Field> = host.fields_with_tag("852").collect();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].first('p'), Some("31234000111"));
    assert_eq!(items[0].first('h'), Some("I 19.3:"));

    for id in [RecordId(2), RecordId(3)] {
        let child = h.catalog.resolve(id, true).await.unwrap();
        assert!(child.first_field("852").is_none());
    }
}

#[tokio::test]
async fn self_link_and_empty_children_are_rejected() {
    let h = Harness::with_records(&collection());
    let err = h.catalog.link(RecordId(1), &[RecordId(1)], None).await.unwrap_err();
    assert!(matches!(err, ApiError::BadRequest(_)));
    let err = h.catalog.link(RecordId(1), &[], None).await.unwrap_err();
    assert_eq!(err.status_code(), 400);
}

#[tokio::test]
async fn relationship_lookup_both_directions() {
    let h = Harness::with_records(&collection());
    h.catalog
        .link(RecordId(1), &[RecordId(2), RecordId(3), RecordId(4)], None)
        .await
        .unwrap();

    let host = h.catalog.lookup(RecordId(1)).await.unwrap();
    assert!(host.is_host);
    assert_eq!(host.child_ids, vec![RecordId(3), RecordId(4), RecordId(2)]);
    assert_eq!(host.host_id, None);

    let child = h.catalog.lookup(RecordId(4)).await.unwrap();
    assert!(!child.is_host);
    assert_eq!(child.host_id, Some(RecordId(1)));
    assert!(child.unresolved.is_empty());

    let unlinked = h.catalog.lookup(RecordId(5)).await.unwrap();
    assert!(!unlinked.is_host);
    assert_eq!(unlinked.host_id, None);
}
