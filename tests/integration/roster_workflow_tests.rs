/*!
 * End-to-end tests: extract a roster, translate it and merge it back
 */

use rpgmtl::providers::MockBackend;
use rpgmtl::resource::{ActorsResource, ResourceHandler, merge_file};
use rpgmtl::translation::{BatchOrchestrator, OrchestratorConfig};
use serde_json::{Value, json};
use tokio_test::assert_ok;

use crate::common;

#[tokio::test(start_paused = true)]
async fn test_roster_withSingleActor_shouldTranslateOnlyNonEmptyFields() {
    let document = json!([null, {"id": 1, "name": "A", "nickname": "", "profile": "B\nC", "note": ""}]);
    let file = "www/data/Actors.json";

    let units = assert_ok!(ActorsResource.extract(file, &document));
    assert_eq!(units.len(), 2);
    assert_eq!(units[1].field, "profile");
    assert_eq!(units[1].source, "B\nC");

    // Identity translation merges back to the same document
    let identity = assert_ok!(BatchOrchestrator::default().run(&MockBackend::identity(), units.clone(), "ja", "en").await);
    assert_eq!(assert_ok!(merge_file(&ActorsResource, file, &document, &identity.units)), document);

    let backend = MockBackend::prefixed("EN:");
    let report = assert_ok!(BatchOrchestrator::default().run(&backend, units, "ja", "en").await);
    assert!(report.is_complete());

    let merged = assert_ok!(merge_file(&ActorsResource, file, &document, &report.units));
    assert_eq!(merged[1]["profile"], "EN:B\nC");
    assert_eq!(
        merged,
        json!([null, {"id": 1, "name": "EN:A", "nickname": "", "profile": "EN:B\nC", "note": ""}])
    );
}

#[tokio::test(start_paused = true)]
async fn test_roster_fromDisk_withIdentityBackend_shouldRoundTripUnchanged() {
    common::init_logging();
    let dir = common::create_temp_dir().unwrap();
    let path = common::create_test_roster(dir.path()).unwrap();
    let file = path.to_string_lossy().to_string();

    let original: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    let units = assert_ok!(ActorsResource.extract(&file, &original));

    let report = assert_ok!(BatchOrchestrator::default().run(&MockBackend::identity(), units, "ja", "en").await);
    let merged = assert_ok!(merge_file(&ActorsResource, &file, &original, &report.units));

    let out = dir.path().join("translated/Actors.json");
    std::fs::create_dir_all(out.parent().unwrap()).unwrap();
    std::fs::write(&out, serde_json::to_string(&merged).unwrap()).unwrap();

    let written = std::fs::read_to_string(&out).unwrap();
    assert_eq!(written, std::fs::read_to_string(&path).unwrap());
}

#[tokio::test(start_paused = true)]
async fn test_roster_withPartialFailure_shouldMergeSuccessfulUnitsOnly() {
    let document = common::sample_roster();
    let file = "data/Actors.json";
    let units = assert_ok!(ActorsResource.extract(file, &document));

    let backend = MockBackend::failing_on("勇者", rpgmtl::TranslationError::Network("reset".into()));
    let report = assert_ok!(BatchOrchestrator::new(OrchestratorConfig::new(2)).run(&backend, units, "ja", "en").await);
    assert_eq!(report.errors.len(), 1);

    let merged = assert_ok!(merge_file(&ActorsResource, file, &document, &report.units));
    // Identity translations equal the source, the failed field keeps its original
    assert_eq!(merged, document);
    assert_eq!(report.stats.success_count, 4);
}
