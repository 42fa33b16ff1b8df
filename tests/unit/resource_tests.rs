/*!
 * Tests for actor roster extraction and merge
 */

use rpgmtl::resource::{ActorsResource, ContentClass, ResourceHandler, TranslationUnit, merge_file};
use serde_json::json;

use crate::common;

const FILE: &str = "data/Actors.json";

#[test]
fn test_extract_withSampleRoster_shouldEmitUnitsInDocumentOrder() {
    let units = ActorsResource.extract(FILE, &common::sample_roster()).unwrap();

    let keys: Vec<(String, String)> = units.iter().map(|u| (u.resource_id.clone(), u.field.clone())).collect();
    assert_eq!(
        keys,
        vec![
            ("1".to_string(), "name".to_string()),
            ("1".to_string(), "nickname".to_string()),
            ("1".to_string(), "profile".to_string()),
            ("3".to_string(), "name".to_string()),
            ("3".to_string(), "profile".to_string()),
        ]
    );
    assert!(units.iter().all(|u| u.file == FILE && u.target.is_empty()));
    assert!(units.iter().all(|u| u.section.as_deref() == Some("actors")));
}

#[test]
fn test_extract_twice_shouldYieldIdenticalUnits() {
    let document = common::sample_roster();
    let first = ActorsResource.extract(FILE, &document).unwrap();
    let second = ActorsResource.extract(FILE, &document).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_extract_withNoteField_shouldNeverExtractIt() {
    let units = ActorsResource.extract(FILE, &common::sample_roster()).unwrap();
    assert!(units.iter().all(|u| u.field != "note"));
}

#[test]
fn test_extract_withFieldTable_shouldAssignContextAndClass() {
    let units = ActorsResource.extract(FILE, &common::sample_roster()).unwrap();

    let profile = units.iter().find(|u| u.field == "profile").unwrap();
    assert_eq!(profile.context.as_deref(), Some("Character profile"));
    assert_eq!(profile.content_class, ContentClass::Description);
    assert_eq!(profile.source, "王国の騎士。\n正義感が強い。");

    let nickname = units.iter().find(|u| u.field == "nickname").unwrap();
    assert_eq!(nickname.content_class, ContentClass::Name);
}

#[test]
fn test_extract_withNonStringOrMissingId_shouldSkipEntry() {
    let document = json!([null, {"name": "No id"}, {"id": 2, "name": 42, "profile": "Text"}]);
    let units = ActorsResource.extract(FILE, &document).unwrap();
    assert_eq!(units.len(), 1);
    assert_eq!(units[0].resource_id, "2");
    assert_eq!(units[0].field, "profile");
}

#[test]
fn test_extract_withEmptyRoster_shouldReturnNoUnits() {
    assert!(ActorsResource.extract(FILE, &json!([null])).unwrap().is_empty());
    assert!(ActorsResource.extract(FILE, &json!([])).unwrap().is_empty());
}

#[test]
fn test_merge_withUntranslatedUnits_shouldReturnEqualDocument() {
    let document = common::sample_roster();
    let units = ActorsResource.extract(FILE, &document).unwrap();

    let merged = ActorsResource.merge(&document, &units).unwrap();
    assert_eq!(merged, document);
}

#[test]
fn test_merge_withTranslatedUnits_shouldLeaveOtherFieldsAndHolesIntact() {
    let document = common::sample_roster();
    let mut units = ActorsResource.extract(FILE, &document).unwrap();
    for unit in &mut units {
        unit.target = format!("EN:{}", unit.field);
    }

    let merged = ActorsResource.merge(&document, &units).unwrap();
    assert_eq!(merged[0], json!(null));
    assert_eq!(merged[2], json!(null));
    assert_eq!(merged[1]["name"], "EN:name");
    assert_eq!(merged[1]["note"], "<Tag:1>");
    assert_eq!(merged[1]["classId"], 1);
    assert_eq!(merged[3]["nickname"], "");
    assert_eq!(merged[3]["initialLevel"], 5);
    // Input document is untouched
    assert_eq!(document[1]["name"], "ハロルド");
}

#[test]
fn test_merge_twice_shouldBeIdempotent() {
    let document = common::sample_roster();
    let mut units = ActorsResource.extract(FILE, &document).unwrap();
    units[0].target = "Harold".to_string();

    let once = ActorsResource.merge(&document, &units).unwrap();
    let twice = ActorsResource.merge(&once, &units).unwrap();
    assert_eq!(once, twice);
}

#[test]
fn test_merge_withUnknownIdOrField_shouldSkipSilently() {
    let document = common::sample_roster();
    let mut ghost = TranslationUnit::new("99", "name", "Ghost", FILE);
    ghost.target = "Fantôme".to_string();
    let mut note = TranslationUnit::new("1", "note", "<Tag:1>", FILE);
    note.target = "changed".to_string();

    let merged = ActorsResource.merge(&document, &[ghost, note]).unwrap();
    assert_eq!(merged, document);
}

#[test]
fn test_merge_file_withUnitsFromSeveralFiles_shouldApplyOnlyOwnUnits() {
    let document = common::sample_roster();
    let mut ours = TranslationUnit::new("3", "name", "テレーズ", FILE);
    ours.target = "Therese".to_string();
    let mut theirs = TranslationUnit::new("3", "name", "テレーズ", "other/Actors.json");
    theirs.target = "Teresa".to_string();

    let merged = merge_file(&ActorsResource, FILE, &document, &[theirs, ours]).unwrap();
    assert_eq!(merged[3]["name"], "Therese");
}

#[test]
fn test_merge_withNonArrayDocument_shouldFailValidation() {
    let err = ActorsResource.merge(&json!({"id": 1}), &[]).unwrap_err();
    assert_eq!(err.kind(), rpgmtl::errors::ErrorKind::Validation);
}
