mod common;

use std::sync::Arc;
use tokio::io::BufReader;

use common::*;
use harborwatch::services::ingest::{run_ingest, IngestStats};
use harborwatch::CongestionRepository;

const STREAM: &str = r#"
{"type":"position","vesselId":"IMO9321483","position":{"lat":51.95,"lon":4.04},"navigationStatus":"AT_ANCHOR","timestamp":"2024-03-01T06:00:00Z"}
{"type":"position","vesselId":"IMO9321483","position":{"lat":51.951,"lon":4.041},"navigationStatus":"AT_ANCHOR","timestamp":"2024-03-01T07:00:00Z"}
{"type":"position","vesselId":"IMO9411111","position":{"lat":51.95,"lon":4.04},"navigationStatus":"UNDERWAY","timestamp":"2024-03-01T07:00:00Z"}
not json at all
{"type":"teleport","vesselId":"IMO9321483"}
{"type":"departure","vesselId":"IMO9321483","departureTime":"2024-03-01T18:00:00Z"}
"#;

#[tokio::test]
async fn test_stream_drives_detection_lifecycle() {
    let repo = Arc::new(catalog());
    let detector = detector(repo.clone());
    let mut output = Vec::new();

    let stats = run_ingest(&detector, BufReader::new(STREAM.as_bytes()), &mut output)
        .await
        .unwrap();

    assert_eq!(
        stats,
        IngestStats {
            lines: 6,
            opened: 1,
            refreshed: 1,
            ignored: 1,
            closed: 1,
            malformed: 2,
            failed: 0,
        }
    );
    assert!(repo.find_all_active_for_vessel("IMO9321483").await.unwrap().is_empty());

    let events: Vec<serde_json::Value> = String::from_utf8(output)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0]["event"], "arrival");
    assert_eq!(events[0]["zone_id"], ZONE_ANCHORAGE);
    assert_eq!(events[0]["congestion_level"], "NORMAL");
    assert_eq!(events[1]["event"], "departure");
    assert_eq!(events[1]["wait_time_hours"], 12.0);
    assert_eq!(events[1]["estimated_detention_cost"], 5000.0);
}

#[tokio::test]
async fn test_storage_failures_are_counted_not_fatal() {
    let repo = Arc::new(catalog());
    repo.set_offline(true);
    let detector = detector(repo.clone());
    let mut output = Vec::new();

    let stats = run_ingest(&detector, BufReader::new(STREAM.as_bytes()), &mut output)
        .await
        .unwrap();

    // the underway report never reaches storage
    assert_eq!(stats.failed, 3);
    assert_eq!(stats.ignored, 1);
    assert_eq!(stats.opened, 0);
    assert!(output.is_empty());
}

#[tokio::test]
async fn test_empty_stream() {
    let repo = Arc::new(catalog());
    let detector = detector(repo);
    let mut output = Vec::new();

    let stats = run_ingest(&detector, BufReader::new(&b"\n\n"[..]), &mut output)
        .await
        .unwrap();

    assert_eq!(stats, IngestStats::default());
    assert!(output.is_empty());
}
