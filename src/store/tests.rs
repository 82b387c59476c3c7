//! Tests for the document stores

use super::*;
use crate::types::{Collection, Document};
use pretty_assertions::assert_eq;
use serde_json::json;

fn doc(value: serde_json::Value) -> Document {
    match value {
        serde_json::Value::Object(map) => map,
        other => panic!("expected object, got {other}"),
    }
}

fn xwalk_rows() -> Vec<Document> {
    vec![
        doc(json!({"tabblk2010": "020010001001001", "stusps": "AK", "cty": "02013"})),
        doc(json!({"tabblk2010": "020010001001002", "stusps": "AK", "cty": "02013"})),
    ]
}

/// Behaviour both implementations must share
fn exercise_store(store: &dyn DocumentStore) {
    assert_eq!(store.count(Collection::GeoXwalk).unwrap(), 0);
    assert!(store
        .find_one(Collection::GeoXwalk, "tabblk2010", "020010001001001")
        .unwrap()
        .is_none());

    store.insert_many(Collection::GeoXwalk, &xwalk_rows()).unwrap();
    assert_eq!(store.count(Collection::GeoXwalk).unwrap(), 2);

    let found = store
        .find_one(Collection::GeoXwalk, "tabblk2010", "020010001001002")
        .unwrap()
        .unwrap();
    assert_eq!(found["cty"], "02013");
    assert_eq!(found["tabblk2010"], "020010001001002");

    // Appending the same rows duplicates them
    store.insert_many(Collection::GeoXwalk, &xwalk_rows()).unwrap();
    assert_eq!(
        store
            .count_where(Collection::GeoXwalk, "tabblk2010", "020010001001001")
            .unwrap(),
        2
    );
    assert_eq!(
        store
            .count_where(Collection::GeoXwalk, "no_such_field", "x")
            .unwrap(),
        0
    );

    store
        .ensure_index(Collection::GeoXwalk, &IndexSpec::descending("stusps"))
        .unwrap();
    store
        .ensure_index(Collection::GeoXwalk, &IndexSpec::descending("stusps"))
        .unwrap();
    assert_eq!(
        store.index_names(Collection::GeoXwalk).unwrap(),
        vec!["stusps_-1".to_string()]
    );
}

// ============================================================================
// IndexSpec Tests
// ============================================================================

#[test]
fn test_index_names() {
    assert_eq!(IndexSpec::descending("cty").name(), "cty_-1");
    assert_eq!(
        IndexSpec::compound_descending(["home_zcta_code", "work_zcta_code"]).name(),
        "home_zcta_code_-1_work_zcta_code_-1"
    );
    assert_eq!(IndexOrder::Ascending.direction(), 1);
}

// ============================================================================
// MemoryStore Tests
// ============================================================================

#[test]
fn test_memory_store_behaviour() {
    exercise_store(&MemoryStore::new());
}

#[test]
fn test_memory_store_records_batch_sizes() {
    let store = MemoryStore::new();
    store.insert_many(Collection::WorkArea, &xwalk_rows()).unwrap();
    store
        .insert_many(Collection::WorkArea, &xwalk_rows()[..1])
        .unwrap();

    assert_eq!(store.batch_sizes(Collection::WorkArea).unwrap(), vec![2, 1]);
    assert_eq!(store.documents(Collection::WorkArea).unwrap().len(), 3);
    assert!(store.batch_sizes(Collection::ResidenceArea).unwrap().is_empty());
}

#[test]
fn test_memory_store_failing_writes() {
    let store = MemoryStore::new();
    store.fail_writes_to(Collection::GeoXwalk).unwrap();

    let err = store
        .insert_many(Collection::GeoXwalk, &xwalk_rows())
        .unwrap_err();
    assert!(err.to_string().contains("geo_xwalk"));
    assert_eq!(store.count(Collection::GeoXwalk).unwrap(), 0);
}

// ============================================================================
// DuckDbStore Tests
// ============================================================================

#[test]
fn test_duckdb_store_behaviour() {
    exercise_store(&DuckDbStore::in_memory().unwrap());
}

#[test]
fn test_duckdb_store_round_trips_value_types() {
    let store = DuckDbStore::in_memory().unwrap();
    store
        .insert_many(
            Collection::ResidenceArea,
            &[doc(json!({
                "h_geocode": "020010001001001",
                "data_year": 2013,
                "createdate": "2013-06-15",
                "C000": "7"
            }))],
        )
        .unwrap();

    let found = store
        .find_one(Collection::ResidenceArea, "h_geocode", "020010001001001")
        .unwrap()
        .unwrap();
    assert_eq!(found["data_year"], 2013);
    assert_eq!(found["C000"], "7");
}

#[test]
fn test_duckdb_store_grows_columns_on_indexed_table() {
    let store = DuckDbStore::in_memory().unwrap();
    store
        .insert_many(
            Collection::WorkArea,
            &[doc(json!({"w_geocode": "1", "work_county_fips": "02013"}))],
        )
        .unwrap();
    store
        .ensure_index(Collection::WorkArea, &IndexSpec::descending("work_county_fips"))
        .unwrap();

    // A later batch carries a column the table has not seen
    store
        .insert_many(
            Collection::WorkArea,
            &[doc(json!({"w_geocode": "2", "work_zcta_code": "99501"}))],
        )
        .unwrap();

    let first = store
        .find_one(Collection::WorkArea, "w_geocode", "1")
        .unwrap()
        .unwrap();
    assert!(!first.contains_key("work_zcta_code"));

    let second = store
        .find_one(Collection::WorkArea, "w_geocode", "2")
        .unwrap()
        .unwrap();
    assert_eq!(second["work_zcta_code"], "99501");
    assert!(!second.contains_key("work_county_fips"));
    assert_eq!(
        store.index_names(Collection::WorkArea).unwrap(),
        vec!["work_county_fips_-1".to_string()]
    );
}

#[test]
fn test_duckdb_store_persists_to_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("lodes.duckdb");
    let location = path.to_str().unwrap();

    {
        let store = DuckDbStore::open(location).unwrap();
        store.insert_many(Collection::GeoXwalk, &xwalk_rows()).unwrap();
        store
            .ensure_index(Collection::GeoXwalk, &IndexSpec::descending("tabblk2010"))
            .unwrap();
    }

    let reopened = DuckDbStore::open(location).unwrap();
    assert_eq!(reopened.location(), location);
    assert_eq!(reopened.count(Collection::GeoXwalk).unwrap(), 2);
    assert_eq!(
        reopened.index_names(Collection::GeoXwalk).unwrap(),
        vec!["tabblk2010_-1".to_string()]
    );
    assert!(reopened
        .find_one(Collection::GeoXwalk, "tabblk2010", "020010001001001")
        .unwrap()
        .is_some());
}

#[test]
fn test_duckdb_store_values_are_queryable_with_plain_sql() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("lodes.duckdb");
    let location = path.to_str().unwrap();

    {
        let store = DuckDbStore::open(location).unwrap();
        store
            .insert_many(
                Collection::ResidenceArea,
                &[
                    doc(json!({"h_geocode": "020010001001001", "main_state": "AK", "data_year": 2013})),
                    doc(json!({"h_geocode": "010010001001001", "main_state": "AL", "data_year": 2012})),
                ],
            )
            .unwrap();
    }

    let conn = duckdb::Connection::open(&path).unwrap();
    let (main_state, data_year): (String, i64) = conn
        .query_row(
            "SELECT main_state, data_year FROM residence_area WHERE main_state = 'AK'",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .unwrap();
    assert_eq!(main_state, "AK");
    assert_eq!(data_year, 2013);

    let recent: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM residence_area WHERE data_year >= 2013",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(recent, 1);
}

#[test]
fn test_duckdb_store_column_typed_by_first_non_null_value() {
    let store = DuckDbStore::in_memory().unwrap();
    store
        .insert_many(
            Collection::WorkArea,
            &[
                doc(json!({"w_geocode": "1", "data_year": null})),
                doc(json!({"w_geocode": "2", "data_year": 2011})),
            ],
        )
        .unwrap();

    let first = store
        .find_one(Collection::WorkArea, "w_geocode", "1")
        .unwrap()
        .unwrap();
    assert!(!first.contains_key("data_year"));

    let second = store
        .find_one(Collection::WorkArea, "w_geocode", "2")
        .unwrap()
        .unwrap();
    assert_eq!(second["data_year"], 2011);
    assert_eq!(
        store
            .count_where(Collection::WorkArea, "w_geocode", "2")
            .unwrap(),
        1
    );
}
