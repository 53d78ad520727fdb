use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Record type under which shopping lists are stored remotely.
pub const RECORD_TYPE_LISTS: &str = "Lists";

/// Field used to order lists, both remotely and in memory.
pub const SORT_KEY_NAME: &str = "name";

/// Opaque identifier assigned by the remote store on first save.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A list that has been persisted at least once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedList {
    pub id: RecordId,
    pub name: String,
}

impl SavedList {
    pub fn new(id: RecordId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }

    /// Label shown for this list's row. Unnamed lists render as "-".
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            "-"
        } else {
            &self.name
        }
    }
}

/// A shopping list record, either staged locally or known to the remote store.
///
/// A saved record always carries its id; an unsaved one never does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListRecord {
    Unsaved { name: String },
    Saved(SavedList),
}

impl ListRecord {
    pub fn unsaved(name: impl Into<String>) -> Self {
        Self::Unsaved { name: name.into() }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Unsaved { name } => name,
            Self::Saved(list) => &list.name,
        }
    }

    pub fn id(&self) -> Option<&RecordId> {
        match self {
            Self::Unsaved { .. } => None,
            Self::Saved(list) => Some(&list.id),
        }
    }

    pub fn is_saved(&self) -> bool {
        matches!(self, Self::Saved(_))
    }

    /// Copy of this record with `name` overwritten, identity preserved.
    pub fn renamed(&self, name: impl Into<String>) -> Self {
        let name = name.into();
        match self {
            Self::Unsaved { .. } => Self::Unsaved { name },
            Self::Saved(list) => Self::Saved(SavedList::new(list.id.clone(), name)),
        }
    }
}

impl From<SavedList> for ListRecord {
    fn from(list: SavedList) -> Self {
        Self::Saved(list)
    }
}

/// Case-insensitive ordering of two list names.
///
/// Names are compared on their base letters first (lowercased, diacritics
/// removed), so "éclair" sorts between "dates" and "fig". Names with the same
/// base letters fall back to their lowercase form; names that differ only by
/// case compare equal so a stable sort keeps their arrival order.
pub fn compare_names(a: &str, b: &str) -> Ordering {
    base_letters(a)
        .cmp(base_letters(b))
        .then_with(|| lowercase(a).cmp(lowercase(b)))
}

fn base_letters(name: &str) -> impl Iterator<Item = char> + '_ {
    name.nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
}

fn lowercase(name: &str) -> impl Iterator<Item = char> + '_ {
    name.chars().flat_map(char::to_lowercase)
}

/// Stable in-place sort of lists by name, case-insensitive ascending.
pub fn sort_by_name(lists: &mut [SavedList]) {
    lists.sort_by(|a, b| compare_names(&a.name, &b.name));
}
