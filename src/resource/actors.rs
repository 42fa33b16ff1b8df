/*!
 * Actor roster documents.
 *
 * An actor roster is a JSON array where index 0 is reserved (usually `null`)
 * and every following slot holds an entry object with a numeric `id` and a
 * fixed set of optional string fields. Slots may also be `null` holes, which
 * are kept exactly as they are.
 */

use log::debug;
use serde_json::Value;

use crate::errors::TranslationError;
use crate::resource::ResourceHandler;
use crate::resource::unit::{ContentClass, TranslationUnit};

/// A translatable field of an actor entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TranslatableField {
    pub name: &'static str,
    pub context: &'static str,
    pub content_class: ContentClass,
}

/// Fields extracted from each actor entry, in extraction order.
/// `note` is deliberately absent: it carries engine metadata tags.
pub const ACTOR_FIELDS: &[TranslatableField] = &[
    TranslatableField { name: "name", context: "Character name", content_class: ContentClass::Name },
    TranslatableField { name: "nickname", context: "Character nickname", content_class: ContentClass::Name },
    TranslatableField { name: "profile", context: "Character profile", content_class: ContentClass::Description },
];

/// Extractor/merger for actor roster documents
#[derive(Debug, Clone, Copy, Default)]
pub struct ActorsResource;

impl ActorsResource {
    /// Section label attached to every unit extracted from a roster
    pub const SECTION: &'static str = "actors";

    pub fn new() -> Self {
        Self
    }

    /// Look up a translatable field by name
    pub fn field(name: &str) -> Option<&'static TranslatableField> {
        ACTOR_FIELDS.iter().find(|f| f.name == name)
    }

    fn entries(document: &Value) -> Result<&Vec<Value>, TranslationError> {
        document
            .as_array()
            .ok_or_else(|| TranslationError::Validation("Actor roster must be a JSON array".to_string()))
    }

    fn entry_id(entry: &Value) -> Option<u64> {
        entry.get("id").and_then(Value::as_u64)
    }
}

impl ResourceHandler for ActorsResource {
    fn name(&self) -> &'static str {
        "actors"
    }

    fn matches_file(&self, file: &str) -> bool {
        std::path::Path::new(file)
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.eq_ignore_ascii_case("Actors.json"))
    }

    fn extract(&self, file: &str, document: &Value) -> Result<Vec<TranslationUnit>, TranslationError> {
        let entries = Self::entries(document)?;
        let mut units = Vec::new();

        for entry in entries.iter().skip(1) {
            let Some(id) = Self::entry_id(entry) else {
                continue;
            };

            for field in ACTOR_FIELDS {
                let Some(text) = entry.get(field.name).and_then(Value::as_str) else {
                    continue;
                };
                if text.is_empty() {
                    continue;
                }

                units.push(
                    TranslationUnit::new(id.to_string(), field.name, text, file)
                        .with_context(field.context)
                        .with_section(Self::SECTION)
                        .with_content_class(field.content_class),
                );
            }
        }

        debug!("Extracted {} units from {}", units.len(), file);
        Ok(units)
    }

    fn merge(&self, document: &Value, units: &[TranslationUnit]) -> Result<Value, TranslationError> {
        Self::entries(document)?;
        let mut merged = document.clone();
        let mut applied = 0usize;

        if let Some(entries) = merged.as_array_mut() {
            for unit in units {
                if unit.target.is_empty() || Self::field(&unit.field).is_none() {
                    continue;
                }
                let Ok(id) = unit.resource_id.parse::<u64>() else {
                    continue;
                };

                let slot = entries
                    .iter_mut()
                    .skip(1)
                    .filter_map(Value::as_object_mut)
                    .find(|entry| entry.get("id").and_then(Value::as_u64) == Some(id));

                // Only existing fields are replaced; entries never gain keys
                if let Some(value) = slot.and_then(|entry| entry.get_mut(&unit.field)) {
                    *value = Value::String(unit.target.clone());
                    applied += 1;
                }
            }
        }

        debug!("Merged {} of {} units", applied, units.len());
        Ok(merged)
    }
}
