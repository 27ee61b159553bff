use privlens_core::StateKind;
use privlens_engine::{AnalysisSession, Inspector, PrivacyStatus, Workbench};
use privlens_jpeg::segment::{EXIF_SIGNATURE, MARKER_APP1, SOI, XMP_SIGNATURE, encode_segment};
use privlens_jpeg::{ByteOrder, ExifDirectory, IfdEntry, IfdGroup, read_tags};
use privlens_sources::SourceFile;

fn photo() -> Vec<u8> {
    let order = ByteOrder::BigEndian;
    let mut dir = ExifDirectory::new(order);
    dir.insert(IfdGroup::Primary, IfdEntry::ascii(0x010F, "Canon"));
    dir.insert(IfdGroup::Primary, IfdEntry::ascii(0x0110, "EOS R6"));
    dir.insert(IfdGroup::Exif, IfdEntry::ascii(0xA431, "083024001234"));
    dir.insert(IfdGroup::Gps, IfdEntry::ascii(0x0001, "N"));
    dir.insert(IfdGroup::Gps, IfdEntry::rationals(order, 0x0002, &[(48, 1), (51, 1), (29, 1)]));
    dir.insert(IfdGroup::Gps, IfdEntry::ascii(0x0003, "E"));
    dir.insert(IfdGroup::Gps, IfdEntry::rationals(order, 0x0004, &[(2, 1), (17, 1), (40, 1)]));

    let mut exif = EXIF_SIGNATURE.to_vec();
    exif.extend_from_slice(&dir.to_bytes());
    let mut xmp = XMP_SIGNATURE.to_vec();
    xmp.extend_from_slice(b"<x:xmpmeta><dc:creator>jane@example.com</dc:creator></x:xmpmeta>");

    let mut data = SOI.to_vec();
    data.extend_from_slice(&encode_segment(0xE0, b"JFIF\0\x01\x01").unwrap());
    data.extend_from_slice(&encode_segment(MARKER_APP1, &exif).unwrap());
    data.extend_from_slice(&encode_segment(MARKER_APP1, &xmp).unwrap());
    data.extend_from_slice(&[0xFF, 0xDA, 0x00, 0x02, 0x01, 0x02, 0x03, 0xFF, 0xD9]);
    data
}

async fn open_photo() -> AnalysisSession {
    Inspector::new()
        .analyze(SourceFile::new("IMG_0001.jpg", "image/jpeg", photo()))
        .await
}

fn keys(bytes: &[u8]) -> Vec<String> {
    read_tags(bytes).unwrap().into_iter().map(|t| t.key).collect()
}

#[tokio::test]
async fn test_photo_analysis() {
    let session = open_photo().await;
    let report = session.report();

    assert_eq!(report.status, PrivacyStatus::Sensitive);
    assert!(session.tags().contains("GPS:GPSLatitude"));
    assert_eq!(session.tags().get("EXIF:Make"), Some("Canon"));
    assert!(report.sensitive_tags.iter().any(|k| k == "GPS:GPSLongitude"));
    assert!(report.warning_tags.iter().any(|k| k == "EXIF:Model"));
    assert!(report.findings.iter().any(|g| g.label == "Email"));
    assert!(report.score.value < 10.0);
    assert!(!session.can_undo());
}

#[tokio::test]
async fn test_redact_gps_and_rescan() {
    let inspector = Inspector::new();
    let mut session = open_photo().await;
    let before = session.report().score.value;

    let gps: Vec<String> = session
        .tags()
        .keys()
        .filter(|k| k.starts_with("GPS:"))
        .map(str::to_string)
        .collect();
    assert_eq!(gps.len(), 4);

    let state = session.redact(&gps).await.unwrap();
    assert_eq!(state.kind, StateKind::Selective);

    let remaining = keys(&session.artifact());
    assert!(remaining.iter().all(|k| !k.starts_with("GPS:")));
    assert!(remaining.contains(&"EXIF:Make".to_string()));

    let report = session.rescan(&inspector).await;
    assert!(report.sensitive_tags.iter().all(|k| !k.starts_with("GPS:")));
    assert!(report.score.value > before);

    let diff = session.diff();
    assert_eq!(diff.len(), 4);
    assert!(diff.iter().any(|d| d.key == "GPS:GPSLatitudeRef" && d.value == "N"));
}

#[tokio::test]
async fn test_undo_then_new_redaction_truncates_branch() {
    let mut session = open_photo().await;
    let original = session.artifact();

    session.redact(["GPS:GPSLatitude"]).await.unwrap();
    let after_a = session.artifact();
    session.redact(["XMP:Packet"]).await.unwrap();
    assert!(session.can_undo());

    session.undo();
    assert!(session.can_redo());
    assert_eq!(session.artifact(), after_a);

    session.redact(["EXIF:Make"]).await.unwrap();
    assert!(!session.can_redo());
    assert_eq!(session.history().len(), 3);
    assert_eq!(session.history().index(), 2);

    let removed: Vec<_> = session.current().removed_keys.iter().cloned().collect();
    assert_eq!(removed, vec!["EXIF:Make", "GPS:GPSLatitude"]);
    assert!(keys(&session.artifact()).contains(&"XMP:Packet".to_string()));

    session.undo();
    session.undo();
    assert_eq!(session.artifact(), original);
    assert!(!session.can_undo());
}

#[tokio::test]
async fn test_full_clean() {
    let inspector = Inspector::new();
    let mut session = open_photo().await;
    let tag_count = session.tags().len();

    let state = session.full_clean().await.unwrap();
    assert_eq!(state.kind, StateKind::FullClean);
    assert_eq!(state.removed_keys.len(), tag_count);

    assert!(keys(&session.artifact()).is_empty());
    let report = session.rescan(&inspector).await;
    assert_eq!(report.status, PrivacyStatus::Clean);
    assert_eq!(report.score.value, 10.0);

    session.undo();
    assert_eq!(&*session.artifact(), photo().as_slice());
}

#[tokio::test]
async fn test_unknown_key_is_reported_in_diff() {
    let mut session = open_photo().await;
    session.redact(["EXIF:ImageUniqueID"]).await.unwrap();

    let diff = session.diff();
    assert_eq!(diff.len(), 1);
    assert_eq!(diff[0].value, "unknown");
    // nothing matched, so the artifact is unchanged
    assert_eq!(&*session.artifact(), photo().as_slice());
}

#[tokio::test]
async fn test_workbench_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("holiday.jpg");
    std::fs::write(&path, photo()).unwrap();

    let mut bench = Workbench::new(Inspector::new());
    bench.open(SourceFile::load(&path).await.unwrap());
    let session = bench.ready().await.unwrap();

    assert_eq!(session.output_name(), "holiday_clean.jpg");
    session.redact(["GPS:GPSLongitude"]).await.unwrap();
    assert!(!keys(&session.artifact()).contains(&"GPS:GPSLongitude".to_string()));
}
