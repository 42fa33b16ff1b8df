/*!
 * Resource documents and translation units.
 *
 * - `unit`: the `TranslationUnit` flowing from extraction through translation to merge
 * - `actors`: extractor/merger for actor roster documents
 *
 * Extraction and merge are schema-specific, so every supported document type
 * gets its own `ResourceHandler`.
 */

use serde_json::Value;

use crate::errors::TranslationError;

pub mod actors;
pub mod unit;

pub use self::actors::{ActorsResource, TranslatableField, ACTOR_FIELDS};
pub use self::unit::{ContentClass, TranslationUnit, UnitKey};

/// Extract/merge transformation for one document schema
pub trait ResourceHandler: Send + Sync {
    /// Short schema name used in logs
    fn name(&self) -> &'static str;

    /// Whether a file path looks like a document of this schema
    fn matches_file(&self, file: &str) -> bool;

    /// Turn a document into a flat list of units, in document order
    fn extract(&self, file: &str, document: &Value) -> Result<Vec<TranslationUnit>, TranslationError>;

    /// Write translated units back into a copy of `document`.
    ///
    /// Units without a target, or that do not resolve to an existing entry
    /// and translatable field, are skipped silently.
    fn merge(&self, document: &Value, units: &[TranslationUnit]) -> Result<Value, TranslationError>;
}

/// Merge only the units that were extracted from `file`
pub fn merge_file(
    handler: &dyn ResourceHandler,
    file: &str,
    document: &Value,
    units: &[TranslationUnit],
) -> Result<Value, TranslationError> {
    let own: Vec<TranslationUnit> = units.iter().filter(|u| u.file == file).cloned().collect();
    handler.merge(document, &own)
}
