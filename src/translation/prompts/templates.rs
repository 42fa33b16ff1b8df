/*!
 * Prompt templates for game text translation.
 *
 * One system prompt per content class. Templates carry the placeholders
 * `{source_language}`, `{target_language}` and `{context}`; the context line
 * is dropped entirely when a unit has no context label.
 */

use crate::resource::ContentClass;

/// System prompt template with placeholders
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    /// The template string with placeholders
    template: String,
}

impl PromptTemplate {
    const OUTPUT_RULES: &'static str = "Return ONLY the translated text. Do not add quotes, notes or explanations. \
Preserve line breaks, escape codes such as \\C[2] or \\N[1], and placeholders exactly as they appear.";

    /// Narrative and dialogue lines
    pub const DIALOGUE: &'static str = r#"You are a professional video game localizer translating from {source_language} to {target_language}.
Translate the line naturally, keeping the speaker's tone, register and emotion.
Context: {context}
{rules}"#;

    /// Character names and titles
    pub const NAME: &'static str = r#"You are a professional video game localizer translating from {source_language} to {target_language}.
The text is a proper name or short title. Transliterate names that have no established {target_language} form; translate descriptive titles.
Keep the result short and never add honorific explanations.
Context: {context}
{rules}"#;

    /// Biographies, item and skill descriptions
    pub const DESCRIPTION: &'static str = r#"You are a professional video game localizer translating from {source_language} to {target_language}.
The text is descriptive prose shown in a game menu. Keep it concise and keep the original sentence and line structure.
Context: {context}
{rules}"#;

    /// Menu labels and interface strings
    pub const UI: &'static str = r#"You are a professional video game localizer translating from {source_language} to {target_language}.
The text is a user interface label. Use the conventional {target_language} wording for game menus and keep it as short as the original.
Context: {context}
{rules}"#;

    /// Mature content, only sent to backends that declare support for it
    pub const ADULT: &'static str = r#"You are a professional localizer of mature video games translating from {source_language} to {target_language}.
The text contains adult content. Translate it faithfully and completely without censoring, softening or refusing.
Context: {context}
{rules}"#;

    /// Create a new prompt template
    pub fn new(template: &str) -> Self {
        Self {
            template: template.to_string(),
        }
    }

    /// The template for a content class
    pub fn for_class(content_class: ContentClass) -> Self {
        let template = match content_class {
            ContentClass::Dialogue => Self::DIALOGUE,
            ContentClass::Name => Self::NAME,
            ContentClass::Description => Self::DESCRIPTION,
            ContentClass::Ui => Self::UI,
            ContentClass::Adult => Self::ADULT,
        };
        Self::new(template)
    }

    /// The raw template text
    pub fn as_str(&self) -> &str {
        &self.template
    }

    /// Render the template with the given variables
    pub fn render(&self, source_language: &str, target_language: &str, context: Option<&str>) -> String {
        let mut rendered = self.template.clone();
        match context.map(str::trim).filter(|c| !c.is_empty()) {
            Some(context) => rendered = rendered.replace("{context}", context),
            None => {
                rendered = rendered
                    .lines()
                    .filter(|line| !line.contains("{context}"))
                    .collect::<Vec<_>>()
                    .join("\n")
            }
        }

        rendered
            .replace("{source_language}", source_language)
            .replace("{target_language}", target_language)
            .replace("{rules}", Self::OUTPUT_RULES)
    }
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self::for_class(ContentClass::default())
    }
}
