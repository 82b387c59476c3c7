//! Integration tests using mock HTTP server
//!
//! Tests the full end-to-end flow: LODES file server → gzip CSV → enrichment →
//! DuckDB collections

use flate2::write::GzEncoder;
use flate2::Compression;
use lodes_loader::config::{ConnectivityPolicy, LoaderConfig};
use lodes_loader::engine::{RunDriver, RunPlan};
use lodes_loader::store::{DocumentStore, DuckDbStore};
use lodes_loader::types::{
    AreaSegment, Collection, DatasetGroup, JobType, OdPart, Segment, Selection, StateCode,
};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::io::Write;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const BLOCK: &str = "020010001001001";
const OTHER_BLOCK: &str = "020010001001002";

fn gzip(data: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

fn latin1(text: &str) -> Vec<u8> {
    text.chars().map(|c| c as u8).collect()
}

fn crosswalk() -> Vec<u8> {
    let header = "tabblk2010,st,stusps,stname,cty,ctyname,trct,trctname,bgrp,bgrpname,zcta,zctaname,stplc,stplcname,stcd113,stcd113name,stsldl,stsldlname,stsldu,stslduname,createdate";
    let rows = [
        format!("{BLOCK},02,AK,Alaska,02000,Aleutians East,02000000100,Tract 1,020000001001,BG 1,99553,99553,0200890,Akutan city,0200,At large,02037,District 37,0200S,District S,20130615"),
        format!("{OTHER_BLOCK},02,AK,Alaska,02013,Aleutians West,02013000200,Tract 2,020130002001,BG 1,99685,99685,0280470,Unalaska Dévelopment,0200,At large,02037,District 37,0200S,District S,20130615"),
    ];
    gzip(&latin1(&format!("{header}\n{}\n", rows.join("\n"))))
}

fn dataset(header: &str, rows: &[String]) -> Vec<u8> {
    gzip(format!("{header}\n{}\n", rows.join("\n")).as_bytes())
}

async fn serve(server: &MockServer, file: &str, body: Vec<u8>) {
    Mock::given(method("GET"))
        .and(path(file))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(body))
        .mount(server)
        .await;
}

fn config(server: &MockServer) -> LoaderConfig {
    LoaderConfig::default()
        .with_endpoint(server.uri())
        .with_database(":memory:")
}

fn ak() -> StateCode {
    "ak".parse().unwrap()
}

fn single_file_plan(group: DatasetGroup, segment: Segment, year: u16) -> RunPlan {
    RunPlan::new(vec![ak()])
        .with_years(vec![year])
        .with_groups(vec![group])
        .with_segments(Selection::Only(vec![segment]))
        .with_job_types(vec![JobType::Jt00])
}

// ============================================================================
// End-to-end Tests
// ============================================================================

#[tokio::test]
async fn test_rac_end_to_end_into_duckdb() {
    let server = MockServer::start().await;
    serve(&server, "/ak/ak_xwalk.csv.gz", crosswalk()).await;
    serve(
        &server,
        "/ak/rac/ak_rac_S000_JT00_2013.csv.gz",
        dataset(
            "h_geocode,C000,CA01,CA02,CA03,createdate",
            &[format!("{BLOCK},15,4,8,3,20130615")],
        ),
    )
    .await;

    let driver = RunDriver::from_config(config(&server)).unwrap();
    let plan = single_file_plan(DatasetGroup::Rac, Segment::Area(AreaSegment::S000), 2013);
    let report = driver.run(&plan).await.unwrap();

    assert_eq!(report.crosswalks_loaded, 1);
    assert_eq!(report.loaded.len(), 1);
    assert!(report.loaded[0].ends_with("/ak/rac/ak_rac_S000_JT00_2013.csv.gz"));
    assert!(report.is_clean());

    let record = driver
        .store()
        .find_one(Collection::ResidenceArea, "h_geocode", BLOCK)
        .unwrap()
        .unwrap();
    assert_eq!(record["main_state"], "AK");
    assert_eq!(record["job_type"], "all");
    assert_eq!(record["segment_code"], "S000");
    assert_eq!(record["segment_name"], "all");
    assert_eq!(record["data_year"], json!(2013));
    assert_eq!(record["createdate"], "2013-06-15");
    assert_eq!(record["C000"], "15");
    assert_eq!(record["home_state_abrv"], "AK");
    assert_eq!(record["home_county_fips"], "02000");
    assert_eq!(record["home_county_name"], "Aleutians East");
    assert_eq!(record["home_place_name"], "Akutan city");
    assert_eq!(record["home_st_leg_upper_name"], "District S");
    assert!(!record.keys().any(|k| k.starts_with("work_")));

    let mut indexes = driver.store().index_names(Collection::GeoXwalk).unwrap();
    indexes.sort();
    assert_eq!(indexes, vec!["cty_-1", "stusps_-1", "tabblk2010_-1"]);
}

#[tokio::test]
async fn test_od_missing_geography_keeps_row() {
    let server = MockServer::start().await;
    serve(&server, "/ak/ak_xwalk.csv.gz", crosswalk()).await;
    serve(
        &server,
        "/ak/od/ak_od_aux_JT00_2011.csv.gz",
        dataset(
            "w_geocode,h_geocode,S000,SA01,SA02,SA03,createdate",
            &[
                format!("{OTHER_BLOCK},530330001001001,1,0,1,0,20130615"),
                format!("{BLOCK},{OTHER_BLOCK},2,1,1,0,20130615"),
            ],
        ),
    )
    .await;

    let driver = RunDriver::from_config(config(&server)).unwrap();
    let plan = single_file_plan(DatasetGroup::Od, Segment::Od(OdPart::Aux), 2011);
    let report = driver.run(&plan).await.unwrap();

    assert_eq!(report.rows_written, 2);
    assert_eq!(report.missing_geography, 1);

    let out_of_state = driver
        .store()
        .find_one(Collection::OriginDestination, "h_geocode", "530330001001001")
        .unwrap()
        .unwrap();
    assert!(!out_of_state.keys().any(|k| k.starts_with("home_")));
    assert_eq!(out_of_state["work_county_name"], "Aleutians West");
    assert_eq!(out_of_state["work_place_name"], "Unalaska Dévelopment");
    assert!(!out_of_state.contains_key("segment_code"));

    let inside = driver
        .store()
        .find_one(Collection::OriginDestination, "w_geocode", BLOCK)
        .unwrap()
        .unwrap();
    assert_eq!(inside["home_county_fips"], "02013");
    assert_eq!(inside["work_county_fips"], "02000");
}

#[tokio::test]
async fn test_absent_files_are_skipped() {
    let server = MockServer::start().await;
    serve(&server, "/ak/ak_xwalk.csv.gz", crosswalk()).await;

    let driver = RunDriver::from_config(config(&server)).unwrap();
    let plan = RunPlan::new(vec![ak()])
        .with_years(vec![2002, 2003])
        .with_groups(vec![DatasetGroup::Wac])
        .with_segments(Selection::Only(vec![
            Segment::Area(AreaSegment::Si01),
            Segment::Area(AreaSegment::Si02),
            Segment::Area(AreaSegment::Si03),
        ]))
        .with_job_types(vec![JobType::Jt02]);

    let report = driver.run(&plan).await.unwrap();

    assert_eq!(report.skipped.len(), 6);
    assert!(report.loaded.is_empty());
    assert!(report.is_clean());
    assert_eq!(driver.store().count(Collection::WorkArea).unwrap(), 0);
}

#[tokio::test]
async fn test_unreachable_server_aborts_by_default() {
    let config = LoaderConfig::default()
        .with_endpoint("http://127.0.0.1:9/LODES7")
        .with_database(":memory:");
    let driver = RunDriver::from_config(config).unwrap();

    let err = driver
        .run(&RunPlan::crosswalk_only(vec![ak(), "al".parse().unwrap()]))
        .await
        .unwrap_err();
    assert!(err.is_connectivity());
}

#[tokio::test]
async fn test_unreachable_server_with_skip_policy() {
    let config = LoaderConfig::default()
        .with_endpoint("http://127.0.0.1:9/LODES7")
        .with_database(":memory:")
        .with_connectivity_policy(ConnectivityPolicy::SkipResource);
    let driver = RunDriver::from_config(config).unwrap();

    let report = driver
        .run(&RunPlan::crosswalk_only(vec![ak(), "al".parse().unwrap()]))
        .await
        .unwrap();
    assert_eq!(report.failed.len(), 2);
}

// ============================================================================
// Persistence Tests
// ============================================================================

#[tokio::test]
async fn test_crosswalk_reload_doubles_rows_in_database_file() {
    let server = MockServer::start().await;
    serve(&server, "/ak/ak_xwalk.csv.gz", crosswalk()).await;

    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("lodes.duckdb");
    let config = config(&server).with_database(db_path.to_string_lossy().to_string());

    {
        let driver = RunDriver::from_config(config.clone()).unwrap();
        driver
            .run(&RunPlan::crosswalk_only(vec![ak()]))
            .await
            .unwrap();
    }
    {
        let driver = RunDriver::from_config(config).unwrap();
        let report = driver
            .run(&RunPlan::crosswalk_only(vec![ak()]))
            .await
            .unwrap();
        assert_eq!(report.crosswalk_rows, 2);
    }

    let store = DuckDbStore::open(&db_path.to_string_lossy()).unwrap();
    assert_eq!(store.count(Collection::GeoXwalk).unwrap(), 4);
    for block in [BLOCK, OTHER_BLOCK] {
        assert_eq!(
            store
                .count_where(Collection::GeoXwalk, "tabblk2010", block)
                .unwrap(),
            2
        );
    }
    assert_eq!(store.index_names(Collection::GeoXwalk).unwrap().len(), 3);
}
