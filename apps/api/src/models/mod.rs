// Document Model: the versioned CV, styling, and letter shapes every other module
// reads and writes, plus the hydration rules that complete partial values.

pub mod customisation;
pub mod document;
pub mod hydrate;
pub mod letter;

pub use customisation::{Customisation, TemplateName};
pub use document::{Document, Education, Experience, PersonalInfo, SkillSet};
pub use hydrate::{hydrate_customisation, hydrate_document, hydrate_letter};
pub use letter::{Letter, Signature};
