//! Selectable report fields.

use serde::Serialize;
use strum::IntoEnumIterator;
use strum_macros::EnumIter;

/// A derived value a report can show. Declaration order is the order lines
/// are printed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, EnumIter)]
#[serde(rename_all = "lowercase")]
pub enum Field {
    Expiry,
    Issue,
    Days,
    Tls,
    Ciphers,
    Issuer,
}

impl Field {
    /// Label printed ahead of the value.
    pub fn label(self) -> &'static str {
        match self {
            Field::Expiry => "Certificate expires on:",
            Field::Issue => "Certificate was issued on:",
            Field::Days => "Days until certificate expiry:",
            Field::Tls => "TLS version:",
            Field::Ciphers => "Ciphers used:",
            Field::Issuer => "Issuer:",
        }
    }

    fn bit(self) -> u8 {
        1 << (self as u8)
    }
}

/// A set of [`Field`]s, always iterated in canonical order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FieldSet(u8);

impl FieldSet {
    pub fn empty() -> Self {
        FieldSet(0)
    }

    pub fn all() -> Self {
        Field::iter().collect()
    }

    /// Normalizes a command-line selection: `--all`, or no field at all, means
    /// every field.
    pub fn from_selection<I: IntoIterator<Item = Field>>(all: bool, selected: I) -> Self {
        let set: FieldSet = selected.into_iter().collect();
        if all || set.is_empty() {
            FieldSet::all()
        } else {
            set
        }
    }

    pub fn insert(&mut self, field: Field) {
        self.0 |= field.bit();
    }

    pub fn contains(&self, field: Field) -> bool {
        self.0 & field.bit() != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = Field> {
        let set = *self;
        Field::iter().filter(move |f| set.contains(*f))
    }
}

impl std::iter::FromIterator<Field> for FieldSet {
    fn from_iter<I: IntoIterator<Item = Field>>(iter: I) -> Self {
        let mut set = FieldSet::empty();
        for field in iter {
            set.insert(field);
        }
        set
    }
}
