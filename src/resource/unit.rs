use serde::{Deserialize, Serialize};

use crate::errors::TranslationError;

/// Classification of a piece of text, used to pick prompts and to enforce
/// backend capability checks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ContentClass {
    /// Narrative text and dialogue
    #[default]
    Dialogue,
    /// Proper names and short titles
    Name,
    /// Longer descriptive text such as biographies
    Description,
    /// Interface labels and menu text
    Ui,
    /// Restricted content that needs an adult-capable backend
    Adult,
}

impl ContentClass {
    /// All content classes in declaration order
    pub const ALL: [ContentClass; 5] = [
        ContentClass::Dialogue,
        ContentClass::Name,
        ContentClass::Description,
        ContentClass::Ui,
        ContentClass::Adult,
    ];

    /// Whether a backend must declare adult-content support to accept this class
    pub fn requires_adult_support(self) -> bool {
        matches!(self, Self::Adult)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Dialogue => "dialogue",
            Self::Name => "name",
            Self::Description => "description",
            Self::Ui => "ui",
            Self::Adult => "adult",
        }
    }
}

impl std::fmt::Display for ContentClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ContentClass {
    type Err = TranslationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ContentClass::ALL
            .into_iter()
            .find(|class| class.as_str() == s.to_lowercase())
            .ok_or_else(|| TranslationError::Validation(format!("Invalid content class: {}", s)))
    }
}

/// Identity of a unit for merge-back
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UnitKey {
    pub resource_id: String,
    pub field: String,
    pub file: String,
}

impl std::fmt::Display for UnitKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}#{}.{}", self.file, self.resource_id, self.field)
    }
}

/// One extracted piece of source text plus the metadata needed to put its
/// translation back where it came from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslationUnit {
    /// Numeric id of the owning entry, as text
    pub resource_id: String,
    /// Field name inside the entry
    pub field: String,
    /// Original text
    pub source: String,
    /// Translated text, empty until a backend fills it
    #[serde(default)]
    pub target: String,
    /// Semantic label of the field
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    /// Path of the originating document
    pub file: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
    #[serde(default)]
    pub content_class: ContentClass,
}

impl TranslationUnit {
    /// Create an untranslated unit
    pub fn new(
        resource_id: impl Into<String>,
        field: impl Into<String>,
        source: impl Into<String>,
        file: impl Into<String>,
    ) -> Self {
        Self {
            resource_id: resource_id.into(),
            field: field.into(),
            source: source.into(),
            target: String::new(),
            context: None,
            file: file.into(),
            section: None,
            content_class: ContentClass::default(),
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn with_section(mut self, section: impl Into<String>) -> Self {
        self.section = Some(section.into());
        self
    }

    pub fn with_content_class(mut self, content_class: ContentClass) -> Self {
        self.content_class = content_class;
        self
    }

    /// The `(resource_id, field, file)` identity tuple
    pub fn key(&self) -> UnitKey {
        UnitKey {
            resource_id: self.resource_id.clone(),
            field: self.field.clone(),
            file: self.file.clone(),
        }
    }

    /// Whether a translation has been written into this unit
    pub fn is_translated(&self) -> bool {
        !self.target.is_empty()
    }
}
