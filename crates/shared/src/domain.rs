use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(pub i64);
    };
}

id_newtype!(EntityPk);

/// Plural-form selector. `-1` is the "entity has no plurals" sentinel and
/// addresses slot 0. Any other negative value is not a valid selector and
/// maps to a slot no translation list can contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PluralForm(pub i32);

impl PluralForm {
    pub const NONE: PluralForm = PluralForm(-1);

    pub fn slot(self) -> usize {
        if self == Self::NONE {
            0
        } else {
            usize::try_from(self.0).unwrap_or(usize::MAX)
        }
    }
}

/// One translation of one plural-form slot of an entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Translation {
    pub string: String,
    #[serde(default)]
    pub approved: bool,
    #[serde(default)]
    pub fuzzy: bool,
    #[serde(default)]
    pub errors: Vec<String>,
    #[serde(default)]
    pub warnings: Vec<String>,
}

impl Translation {
    fn active(&self) -> bool {
        self.approved || self.fuzzy
    }
}

/// A single translatable source string plus its translations, one per
/// plural-form slot (slot 0 when the entity has no plurals).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub pk: EntityPk,
    pub original: String,
    /// Markup kind of the source resource, e.g. "ftl" or "po".
    pub format: String,
    pub translation: Vec<Translation>,
}

/// Aggregate review status of an entity across all of its plural forms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TranslationStatus {
    /// At least one approved or fuzzy plural form has errors.
    Errors,
    /// At least one approved or fuzzy plural form has warnings.
    Warnings,
    /// Every plural form is approved, clean of errors and warnings.
    Approved,
    /// Every plural form is fuzzy, clean of errors and warnings.
    Fuzzy,
    /// Some plural forms have an approved or fuzzy translation, not all.
    Partial,
    /// No plural form has an approved or fuzzy translation.
    Missing,
}

impl Entity {
    /// Errors and warnings only count against translations that are actually
    /// shown to users, i.e. approved or fuzzy ones.
    pub fn status(&self) -> TranslationStatus {
        if self.translation.is_empty() {
            return TranslationStatus::Missing;
        }

        let mut approved = 0usize;
        let mut fuzzy = 0usize;
        let mut errors = 0usize;
        let mut warnings = 0usize;

        for translation in &self.translation {
            if translation.active() && !translation.errors.is_empty() {
                errors += 1;
            } else if translation.active() && !translation.warnings.is_empty() {
                warnings += 1;
            } else if translation.approved {
                approved += 1;
            } else if translation.fuzzy {
                fuzzy += 1;
            }
        }

        if errors > 0 {
            TranslationStatus::Errors
        } else if warnings > 0 {
            TranslationStatus::Warnings
        } else if approved == self.translation.len() {
            TranslationStatus::Approved
        } else if fuzzy == self.translation.len() {
            TranslationStatus::Fuzzy
        } else if approved > 0 || fuzzy > 0 {
            TranslationStatus::Partial
        } else {
            TranslationStatus::Missing
        }
    }
}
