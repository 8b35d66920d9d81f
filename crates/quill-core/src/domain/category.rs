use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Category entity - groups posts under a unique name and slug.
///
/// Both `name` and `slug` are globally unique. The slug does not change
/// when the category is renamed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
}

impl Category {
    pub fn new(name: String, slug: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            slug,
        }
    }
}
