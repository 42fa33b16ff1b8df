/*!
 * Prompt engineering for game text translation.
 *
 * Each content class gets its own system prompt; backends render it with the
 * human-readable language names and the unit's context label.
 */

pub mod templates;

// Re-export main types
pub use templates::PromptTemplate;
