/*!
 * Tests for language code utilities
 */

use rpgmtl::errors::ErrorKind;
use rpgmtl::language_utils::{
    LanguageCodeType, get_language_name, language_codes_match, normalize_to_part1_or_part2t, normalize_to_part2t,
    validate_language_code,
};

#[test]
fn test_validate_language_code_withValidCodes_shouldReturnType() {
    assert_eq!(validate_language_code("en").unwrap(), LanguageCodeType::Part1);
    assert_eq!(validate_language_code(" JA ").unwrap(), LanguageCodeType::Part1);
    assert_eq!(validate_language_code("fra").unwrap(), LanguageCodeType::Part2T);
    assert_eq!(validate_language_code("fre").unwrap(), LanguageCodeType::Part2B);
}

#[test]
fn test_validate_language_code_withInvalidCodes_shouldReturnLanguageError() {
    for code in ["", "e", "english", "zz-ZZ"] {
        let err = validate_language_code(code).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Language, "{}", code);
    }
}

#[test]
fn test_normalize_to_part2t_withAllForms_shouldReturnThreeLetterCode() {
    assert_eq!(normalize_to_part2t("ja").unwrap(), "jpn");
    assert_eq!(normalize_to_part2t("jpn").unwrap(), "jpn");
    assert_eq!(normalize_to_part2t("ger").unwrap(), "deu");
}

#[test]
fn test_normalize_to_part1_or_part2t_withPart2Code_shouldPreferTwoLetters() {
    assert_eq!(normalize_to_part1_or_part2t("deu").unwrap(), "de");
    assert_eq!(normalize_to_part1_or_part2t("ja").unwrap(), "ja");
}

#[test]
fn test_language_codes_match_withEquivalentCodes_shouldMatch() {
    assert!(language_codes_match("ja", "jpn"));
    assert!(language_codes_match("fr", "fre"));
    assert!(!language_codes_match("ja", "en"));
    assert!(!language_codes_match("ja", "not-a-code"));
}

#[test]
fn test_get_language_name_withKnownCodes_shouldReturnEnglishName() {
    assert_eq!(get_language_name("ja").unwrap(), "Japanese");
    assert_eq!(get_language_name("eng").unwrap(), "English");
    assert!(get_language_name("??").is_err());
}
