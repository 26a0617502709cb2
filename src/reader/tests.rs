//! Tests for reader module

use super::*;
use crate::storage::StorageLocation;
use arrow::array::Array;
use arrow::datatypes::DataType;
use bytes::Bytes;
use object_store::path::Path as ObjectPath;

async fn seed(location: &StorageLocation, files: &[(&str, &str)]) {
    for (key, body) in files {
        location
            .put(&ObjectPath::from(*key), Bytes::from(body.to_string()))
            .await
            .unwrap();
    }
}

// ============================================================================
// Line Decoding Tests
// ============================================================================

#[test]
fn test_decode_lines_skips_blank_lines() {
    let mut records = Vec::new();
    let body = b"{\"a\": 1}\n\n   \n{\"a\": 2}\n";
    let skipped = decode_lines("f.json", body, MalformedRecords::Fail, &mut records).unwrap();
    assert_eq!(skipped, 0);
    assert_eq!(records.len(), 2);
    assert_eq!(records[1]["a"], 2);
}

#[test]
fn test_decode_lines_skip_policy() {
    let mut records = Vec::new();
    let body = b"{\"a\": 1}\nnot json\n[1, 2]\n{\"a\": 3}";
    let skipped = decode_lines("f.json", body, MalformedRecords::Skip, &mut records).unwrap();
    assert_eq!(skipped, 2);
    assert_eq!(records.len(), 2);
}

#[test]
fn test_decode_lines_fail_policy_names_line() {
    let mut records = Vec::new();
    let body = b"{\"a\": 1}\n{broken";
    let err = decode_lines("log_data/x.json", body, MalformedRecords::Fail, &mut records)
        .unwrap_err();
    let message = err.to_string();
    assert!(message.contains("log_data/x.json"));
    assert!(message.contains("line 2"));
}

#[test]
fn test_decode_lines_invalid_utf8() {
    let mut records = Vec::new();
    let body = b"{\"a\": \"\xff\"}";
    assert!(decode_lines("f.json", body, MalformedRecords::Fail, &mut records).is_err());

    let skipped = decode_lines("f.json", body, MalformedRecords::Skip, &mut records).unwrap();
    assert_eq!(skipped, 0);
    assert_eq!(records.len(), 1);
}

// ============================================================================
// Dataset Reader Tests
// ============================================================================

#[tokio::test]
async fn test_read_song_dataset_with_declared_schema() {
    let location = StorageLocation::in_memory();
    seed(
        &location,
        &[
            (
                "song_data/A/A/A/TRAAAAK128F9318786.json",
                r#"{"num_songs": 1, "artist_id": "AR1", "artist_latitude": null, "artist_longitude": null, "artist_location": "", "artist_name": "Adelitas Way", "song_id": "SOBLFFE12AF72AA5BA", "title": "Scream", "duration": 213.9424, "year": 2009}"#,
            ),
            (
                "song_data/A/A/B/TRAABJL12903CDCF1A.json",
                r#"{"num_songs": 1, "artist_id": "AR2", "artist_latitude": 35.14968, "artist_longitude": -90.04892, "artist_location": "Memphis, TN", "artist_name": "Tweeterfriendly Music", "song_id": "SOAOIBZ12AB01815BE", "title": "I Hold Your Hand In Mine", "duration": 43.36281, "year": 0}"#,
            ),
            ("song_data/README.md", "not a song"),
        ],
    )
    .await;

    let reader = JsonDatasetReader::new(location);
    let dataset = reader
        .read("song_data", "song_data/*/*/*/*.json", Some(song_schema()))
        .await
        .unwrap();

    assert_eq!(dataset.stats.files, 2);
    assert_eq!(dataset.stats.records, 2);
    assert_eq!(dataset.table.num_rows(), 2);
    assert_eq!(dataset.table.num_columns(), song_schema().fields().len());

    // files are read in key order
    let ids = dataset.table.string_column("song_id").unwrap();
    assert_eq!(ids.value(0), "SOBLFFE12AF72AA5BA");
    assert_eq!(ids.value(1), "SOAOIBZ12AB01815BE");

    let latitude = dataset.table.column("artist_latitude").unwrap();
    assert!(latitude.is_null(0));
    assert!(!latitude.is_null(1));
}

#[tokio::test]
async fn test_read_infers_schema_without_declaration() {
    let location = StorageLocation::in_memory();
    seed(
        &location,
        &[(
            "log_data/2018/11/2018-11-01-events.json",
            "{\"ts\": 1541105830796, \"page\": \"NextSong\"}\n{\"ts\": 1541106106796, \"page\": \"Home\"}\n",
        )],
    )
    .await;

    let dataset = JsonDatasetReader::new(location)
        .read("log_data", "log_data/*/*/*.json", None)
        .await
        .unwrap();

    assert_eq!(dataset.table.num_rows(), 2);
    assert_eq!(
        dataset.table.field("ts").unwrap().data_type(),
        &DataType::Int64
    );
    assert_eq!(
        dataset.table.field("page").unwrap().data_type(),
        &DataType::Utf8
    );
}

#[tokio::test]
async fn test_read_no_matching_files_is_empty() {
    let dataset = JsonDatasetReader::new(StorageLocation::in_memory())
        .read("log_data", "log_data/*/*/*.json", Some(log_schema()))
        .await
        .unwrap();

    assert_eq!(dataset.stats, ReadStats::default());
    assert!(dataset.table.is_empty());
    assert!(dataset.table.has_column("ts"));
}

#[tokio::test]
async fn test_read_fail_policy_aborts() {
    let location = StorageLocation::in_memory();
    seed(&location, &[("log_data/2018/11/bad.json", "{\"ts\": 1}\n{oops\n")]).await;

    let reader = JsonDatasetReader::new(location).with_malformed_records(MalformedRecords::Fail);
    let err = reader
        .read("log_data", "log_data/*/*/*.json", Some(log_schema()))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Decode { .. }));
}

#[tokio::test]
async fn test_read_skip_policy_counts() {
    let location = StorageLocation::in_memory();
    seed(&location, &[("log_data/2018/11/bad.json", "{\"ts\": 1}\n{oops\n")]).await;

    let dataset = JsonDatasetReader::new(location)
        .read("log_data", "log_data/*/*/*.json", Some(log_schema()))
        .await
        .unwrap();
    assert_eq!(dataset.stats.records, 1);
    assert_eq!(dataset.stats.skipped, 1);
}
