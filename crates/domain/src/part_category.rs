//! Hierarchical part categories.

use chrono::{DateTime, Utc};
use common::PartCategoryId;

use crate::entity::Entity;
use crate::error::DomainError;
use crate::validate;

const NAME_MAX: usize = 100;
const DESCRIPTION_MAX: usize = 500;

/// A node in the part category tree. Names are unique across the tree.
#[derive(Debug, Clone, PartialEq)]
pub struct PartCategory {
    id: PartCategoryId,
    name: String,
    description: Option<String>,
    parent_id: Option<PartCategoryId>,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Stored representation of a [`PartCategory`].
#[derive(Debug, Clone)]
pub struct PartCategoryRecord {
    pub id: PartCategoryId,
    pub name: String,
    pub description: Option<String>,
    pub parent_id: Option<PartCategoryId>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<PartCategoryRecord> for PartCategory {
    fn from(r: PartCategoryRecord) -> Self {
        Self {
            id: r.id,
            name: r.name,
            description: r.description,
            parent_id: r.parent_id,
            is_active: r.is_active,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

impl Entity for PartCategory {
    type Id = PartCategoryId;
    const NAME: &'static str = "Part category";

    fn id(&self) -> PartCategoryId {
        self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

impl PartCategory {
    pub fn new(
        name: &str,
        description: Option<&str>,
        parent_id: Option<PartCategoryId>,
    ) -> Result<Self, DomainError> {
        let now = Utc::now();
        Ok(Self {
            id: PartCategoryId::new(),
            name: validate::required("name", name, NAME_MAX)?,
            description: validate::optional("description", description, DESCRIPTION_MAX)?,
            parent_id,
            is_active: true,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn parent_id(&self) -> Option<PartCategoryId> {
        self.parent_id
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn rename(&mut self, name: &str) -> Result<(), DomainError> {
        self.name = validate::required("name", name, NAME_MAX)?;
        self.touch();
        Ok(())
    }

    pub fn change_description(&mut self, description: Option<&str>) -> Result<(), DomainError> {
        self.description = validate::optional("description", description, DESCRIPTION_MAX)?;
        self.touch();
        Ok(())
    }

    /// Re-parents the category. `None` makes it a root.
    ///
    /// Only the direct self-reference is caught here; deeper cycles need the
    /// ancestor chain and are checked by the caller.
    pub fn move_under(&mut self, parent_id: Option<PartCategoryId>) -> Result<(), DomainError> {
        if parent_id == Some(self.id) {
            return Err(DomainError::InvalidParentCategory);
        }
        self.parent_id = parent_id;
        self.touch();
        Ok(())
    }

    pub fn activate(&mut self) {
        self.is_active = true;
        self.touch();
    }

    pub fn deactivate(&mut self) {
        self.is_active = false;
        self.touch();
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_category_is_active_root() {
        let category = PartCategory::new("Brakes", Some("Pads and discs"), None).unwrap();
        assert!(category.is_active());
        assert_eq!(category.parent_id(), None);
    }

    #[test]
    fn cannot_be_own_parent() {
        let mut category = PartCategory::new("Brakes", None, None).unwrap();
        let own_id = category.id();
        assert_eq!(
            category.move_under(Some(own_id)),
            Err(DomainError::InvalidParentCategory)
        );
        assert_eq!(category.parent_id(), None);
    }

    #[test]
    fn deactivate_and_activate() {
        let mut category = PartCategory::new("Filters", None, None).unwrap();
        category.deactivate();
        assert!(!category.is_active());
        category.activate();
        assert!(category.is_active());
    }
}
