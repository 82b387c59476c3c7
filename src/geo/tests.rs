//! Tests for the geography module

use super::*;
use crate::http::HttpFetcher;
use crate::store::{DocumentStore, MemoryStore};
use crate::types::{Collection, DatasetGroup, Document, JsonValue, StateCode};
use flate2::write::GzEncoder;
use flate2::Compression;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::collections::HashMap;
use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const XWALK_HEADER: &str = "tabblk2010,st,stusps,stname,cty,ctyname,trct,trctname,bgrp,bgrpname,zcta,zctaname,stplc,stplcname,stcd113,stcd113name,stsldl,stsldlname,stsldu,stslduname,createdate";

fn xwalk_line(block: &str, county_name: &str) -> String {
    format!(
        "{block},02,AK,Alaska,02013,{county_name},02013000100,Tract 1,020130001001,BG 1,99553,99553,0203830,Akutan city,0200,AK at large,02037,District 37,0200S,District S,20130615"
    )
}

/// Encode text as ISO-8859-1; every char must be below U+0100
fn latin1(text: &str) -> Vec<u8> {
    text.chars().map(|c| c as u8).collect()
}

fn gzip(data: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

fn crosswalk_entry(block: &str) -> Document {
    let mut entry = Document::new();
    entry.insert("tabblk2010".to_string(), json!(block));
    for (suffix, column) in CROSSWALK_FIELDS {
        entry.insert(column.to_string(), json!(format!("{suffix}-{block}")));
    }
    entry
}

fn ak() -> StateCode {
    "ak".parse().unwrap()
}

// ============================================================================
// Attribute Tests
// ============================================================================

#[test]
fn test_from_crosswalk_reads_every_field() {
    let attrs = GeoAttributes::from_crosswalk(&crosswalk_entry("020010001001001")).unwrap();

    assert_eq!(attrs.iter().count(), 18);
    assert_eq!(attrs.get("county_fips"), Some("county_fips-020010001001001"));
    assert_eq!(
        attrs.get("st_leg_upper_name"),
        Some("st_leg_upper_name-020010001001001")
    );
    assert_eq!(attrs.get("nope"), None);
}

#[test]
fn test_from_crosswalk_rejects_missing_column() {
    let mut entry = crosswalk_entry("020010001001001");
    entry.remove("ctyname");

    let err = GeoAttributes::from_crosswalk(&entry).unwrap_err();
    assert!(err.is_malformed_input());
    assert!(err.to_string().contains("ctyname"));
}

#[test]
fn test_from_crosswalk_stringifies_numbers() {
    let mut entry = crosswalk_entry("020010001001001");
    entry.insert("zcta".to_string(), json!(99553));

    let attrs = GeoAttributes::from_crosswalk(&entry).unwrap();
    assert_eq!(attrs.get("zcta_code"), Some("99553"));
}

#[test]
fn test_write_prefixed() {
    let attrs = GeoAttributes::from_crosswalk(&crosswalk_entry("b1")).unwrap();
    let mut doc = Document::new();
    attrs.write_prefixed(Side::Work, &mut doc);

    assert_eq!(doc.len(), 18);
    assert_eq!(doc["work_state_abrv"], "state_abrv-b1");
    assert_eq!(doc["work_cong_dist_code"], "cong_dist_code-b1");
    assert!(!doc.contains_key("home_state_abrv"));
}

#[test]
fn test_sides_per_group() {
    assert_eq!(Side::for_group(DatasetGroup::Od), &[Side::Home, Side::Work]);
    assert_eq!(Side::for_group(DatasetGroup::Rac), &[Side::Home]);
    assert_eq!(Side::for_group(DatasetGroup::Wac), &[Side::Work]);
    assert_eq!(Side::Home.geocode_field(), "h_geocode");
    assert_eq!(Side::Work.field("zcta_name"), "work_zcta_name");
}

// ============================================================================
// Lookup Tests
// ============================================================================

#[test]
fn test_store_lookup() {
    let store = MemoryStore::new();
    store
        .insert_many(
            Collection::GeoXwalk,
            &[crosswalk_entry("b1"), crosswalk_entry("b2")],
        )
        .unwrap();

    let lookup = StoreLookup::new(&store);
    let found = lookup.lookup("b2").unwrap().unwrap();
    assert_eq!(found.get("state_name"), Some("state_name-b2"));
    assert!(lookup.lookup("b3").unwrap().is_none());
}

struct CountingLookup {
    calls: Arc<AtomicUsize>,
    blocks: HashMap<String, GeoAttributes>,
}

impl GeoLookup for CountingLookup {
    fn lookup(&self, block: &str) -> crate::Result<Option<GeoAttributes>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.blocks.lookup(block)
    }
}

#[test]
fn test_cached_lookup_memoizes_hits_and_misses() {
    let mut blocks = HashMap::new();
    blocks.insert(
        "b1".to_string(),
        GeoAttributes::from_crosswalk(&crosswalk_entry("b1")).unwrap(),
    );
    let calls = Arc::new(AtomicUsize::new(0));
    let cached = CachedLookup::new(
        CountingLookup {
            calls: Arc::clone(&calls),
            blocks,
        },
        16,
    );

    assert!(cached.lookup("b1").unwrap().is_some());
    assert!(cached.lookup("b1").unwrap().is_some());
    assert!(cached.lookup("missing").unwrap().is_none());
    assert!(cached.lookup("missing").unwrap().is_none());

    assert_eq!(cached.len(), 2);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[test]
fn test_cached_lookup_clears_when_full() {
    let cached = CachedLookup::new(HashMap::<String, GeoAttributes>::new(), 2);
    cached.lookup("a").unwrap();
    cached.lookup("b").unwrap();
    assert_eq!(cached.len(), 2);

    cached.lookup("c").unwrap();
    assert_eq!(cached.len(), 1);
}

// ============================================================================
// Loader Tests
// ============================================================================

async fn serve_crosswalk(server: &MockServer, lines: &[String]) {
    let mut csv = String::from(XWALK_HEADER);
    for line in lines {
        csv.push('\n');
        csv.push_str(line);
    }
    csv.push('\n');

    Mock::given(method("GET"))
        .and(path("/ak/ak_xwalk.csv.gz"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(gzip(&latin1(&csv))))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_load_crosswalk_decodes_latin1_and_indexes() {
    let server = MockServer::start().await;
    serve_crosswalk(
        &server,
        &[
            xwalk_line("020010001001001", "Aleutians East Borough"),
            xwalk_line("020010001001002", "Doña Ana"),
        ],
    )
    .await;

    let fetcher = HttpFetcher::new(server.uri()).unwrap();
    let store = MemoryStore::new();
    let outcome = CrosswalkLoader::new(&fetcher, &store, 10_000)
        .load(&ak())
        .await
        .unwrap();

    assert_eq!(
        outcome,
        CrosswalkOutcome::Loaded(crate::loader::BatchStats {
            rows: 2,
            batches: 1
        })
    );

    let entry = store
        .find_one(Collection::GeoXwalk, "tabblk2010", "020010001001002")
        .unwrap()
        .unwrap();
    assert_eq!(entry["ctyname"], JsonValue::String("Doña Ana".to_string()));
    assert_eq!(entry["createdate"], "20130615");

    let mut indexes = store.index_names(Collection::GeoXwalk).unwrap();
    indexes.sort();
    assert_eq!(indexes, vec!["cty_-1", "stusps_-1", "tabblk2010_-1"]);
}

#[tokio::test]
async fn test_load_crosswalk_respects_batch_size() {
    let server = MockServer::start().await;
    let lines: Vec<String> = (0..5)
        .map(|i| xwalk_line(&format!("02001000100100{i}"), "Borough"))
        .collect();
    serve_crosswalk(&server, &lines).await;

    let fetcher = HttpFetcher::new(server.uri()).unwrap();
    let store = MemoryStore::new();
    CrosswalkLoader::new(&fetcher, &store, 2)
        .load(&ak())
        .await
        .unwrap();

    assert_eq!(
        store.batch_sizes(Collection::GeoXwalk).unwrap(),
        vec![2, 2, 1]
    );
}

#[tokio::test]
async fn test_load_crosswalk_twice_duplicates_rows() {
    let server = MockServer::start().await;
    serve_crosswalk(&server, &[xwalk_line("020010001001001", "Borough")]).await;

    let fetcher = HttpFetcher::new(server.uri()).unwrap();
    let store = MemoryStore::new();
    let loader = CrosswalkLoader::new(&fetcher, &store, 10_000);
    loader.load(&ak()).await.unwrap();
    loader.load(&ak()).await.unwrap();

    assert_eq!(
        store
            .count_where(Collection::GeoXwalk, "tabblk2010", "020010001001001")
            .unwrap(),
        2
    );
    // Index creation stays idempotent
    assert_eq!(store.index_names(Collection::GeoXwalk).unwrap().len(), 3);
}

#[tokio::test]
async fn test_load_crosswalk_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let fetcher = HttpFetcher::new(server.uri()).unwrap();
    let store = MemoryStore::new();
    let outcome = CrosswalkLoader::new(&fetcher, &store, 10_000)
        .load(&ak())
        .await
        .unwrap();

    assert!(matches!(outcome, CrosswalkOutcome::NotFound { url } if url.ends_with("/ak/ak_xwalk.csv.gz")));
    assert_eq!(store.count(Collection::GeoXwalk).unwrap(), 0);
    assert!(store.index_names(Collection::GeoXwalk).unwrap().is_empty());
}

#[tokio::test]
async fn test_load_crosswalk_write_failure_surfaces() {
    let server = MockServer::start().await;
    serve_crosswalk(&server, &[xwalk_line("020010001001001", "Borough")]).await;

    let fetcher = HttpFetcher::new(server.uri()).unwrap();
    let store = MemoryStore::new();
    store.fail_writes_to(Collection::GeoXwalk).unwrap();

    let result = CrosswalkLoader::new(&fetcher, &store, 10_000)
        .load(&ak())
        .await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_load_crosswalk_corrupt_payload() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ak/ak_xwalk.csv.gz"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"not gzip at all".to_vec()))
        .mount(&server)
        .await;

    let fetcher = HttpFetcher::new(server.uri()).unwrap();
    let store = MemoryStore::new();
    let err = CrosswalkLoader::new(&fetcher, &store, 10_000)
        .load(&ak())
        .await
        .unwrap_err();

    assert!(err.is_malformed_input());
    assert_eq!(store.count(Collection::GeoXwalk).unwrap(), 0);
}
