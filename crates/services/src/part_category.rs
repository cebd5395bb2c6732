//! Part category tree service.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use common::{ErrorCode, PartCategoryId, ServiceResponse};
use domain::{DomainError, Entity, PartCategory};
use serde::{Deserialize, Serialize};
use store::constraints;
use store::{
    CoverageRepository, PartCategoryRepository, PartRepository, Repository, Store, UnitOfWork,
};

use crate::error::{Result, ServiceError, is_still_referenced, on_conflict, respond};

fn duplicate_name(name: &str) -> ServiceError {
    ServiceError::rejected(
        ErrorCode::DUPLICATE_CATEGORY_NAME,
        format!("A category named '{name}' already exists"),
    )
}

fn parent_not_found(parent_id: PartCategoryId) -> ServiceError {
    ServiceError::rejected(
        ErrorCode::PARENT_CATEGORY_NOT_FOUND,
        format!("Parent category {parent_id} not found"),
    )
}

/// Rejection for a constraint the category row violated at commit.
fn conflict(constraint: &str, category: &PartCategory) -> Option<ServiceError> {
    match constraint {
        constraints::PART_CATEGORIES_NAME => Some(duplicate_name(category.name())),
        constraints::PART_CATEGORIES_PARENT => category.parent_id().map(parent_not_found),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartCategoryDto {
    pub id: PartCategoryId,
    pub name: String,
    pub description: Option<String>,
    pub parent_id: Option<PartCategoryId>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&PartCategory> for PartCategoryDto {
    fn from(category: &PartCategory) -> Self {
        Self {
            id: category.id(),
            name: category.name().to_string(),
            description: category.description().map(str::to_string),
            parent_id: category.parent_id(),
            is_active: category.is_active(),
            created_at: category.created_at(),
            updated_at: category.updated_at(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePartCategoryRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub parent_id: Option<PartCategoryId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdatePartCategoryRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub parent_id: Option<PartCategoryId>,
    pub is_active: bool,
}

/// Maintains the category hierarchy parts are filed under.
#[derive(Clone)]
pub struct PartCategoryService<S> {
    store: S,
}

impl<S: Store> PartCategoryService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    #[tracing::instrument(skip(self, request))]
    pub async fn create(
        &self,
        request: CreatePartCategoryRequest,
    ) -> ServiceResponse<PartCategoryDto> {
        let outcome: Result<PartCategoryDto> = async {
            let category = PartCategory::new(
                &request.name,
                request.description.as_deref(),
                request.parent_id,
            )?;

            let work = self.store.begin();
            ensure_unique_name(&work, &category).await?;
            if let Some(parent_id) = category.parent_id() {
                ensure_parent(&work, parent_id).await?;
            }

            work.part_categories().add(category.clone()).await?;
            work.commit()
                .await
                .map_err(|e| on_conflict(e, |c| conflict(c, &category)))?;
            Ok(PartCategoryDto::from(&category))
        }
        .await;
        respond(
            "part_category.create",
            "Part category created successfully",
            outcome,
        )
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_by_id(&self, id: PartCategoryId) -> ServiceResponse<PartCategoryDto> {
        let outcome: Result<PartCategoryDto> = async {
            let work = self.store.begin();
            Ok(PartCategoryDto::from(&load(&work, id).await?))
        }
        .await;
        respond(
            "part_category.get",
            "Part category retrieved successfully",
            outcome,
        )
    }

    #[tracing::instrument(skip(self))]
    pub async fn list(&self) -> ServiceResponse<Vec<PartCategoryDto>> {
        let outcome: Result<Vec<PartCategoryDto>> = async {
            let work = self.store.begin();
            let categories = work.part_categories().list().await?;
            Ok(categories.iter().map(PartCategoryDto::from).collect())
        }
        .await;
        respond(
            "part_category.list",
            "Part categories retrieved successfully",
            outcome,
        )
    }

    /// Direct children of a category.
    #[tracing::instrument(skip(self))]
    pub async fn list_children(
        &self,
        parent_id: PartCategoryId,
    ) -> ServiceResponse<Vec<PartCategoryDto>> {
        let outcome: Result<Vec<PartCategoryDto>> = async {
            let work = self.store.begin();
            load(&work, parent_id).await?;
            let children = work.part_categories().list_children(parent_id).await?;
            Ok(children.iter().map(PartCategoryDto::from).collect())
        }
        .await;
        respond(
            "part_category.list_children",
            "Child categories retrieved successfully",
            outcome,
        )
    }

    #[tracing::instrument(skip(self, request))]
    pub async fn update(
        &self,
        id: PartCategoryId,
        request: UpdatePartCategoryRequest,
    ) -> ServiceResponse<PartCategoryDto> {
        let outcome: Result<PartCategoryDto> = async {
            let work = self.store.begin();
            let mut category = load(&work, id).await?;

            category.rename(&request.name)?;
            category.change_description(request.description.as_deref())?;
            if request.parent_id != category.parent_id() {
                category.move_under(request.parent_id)?;
                if let Some(parent_id) = request.parent_id {
                    ensure_parent(&work, parent_id).await?;
                    ensure_not_descendant(&work, id, parent_id).await?;
                }
            }
            match (request.is_active, category.is_active()) {
                (true, false) => category.activate(),
                (false, true) => category.deactivate(),
                _ => {}
            }

            ensure_unique_name(&work, &category).await?;
            work.part_categories().update(category.clone()).await?;
            work.commit()
                .await
                .map_err(|e| on_conflict(e, |c| conflict(c, &category)))?;
            Ok(PartCategoryDto::from(&category))
        }
        .await;
        respond(
            "part_category.update",
            "Part category updated successfully",
            outcome,
        )
    }

    /// Removes a category nothing refers to any more.
    ///
    /// Children are checked first, so a category failing both counted guards
    /// reports `CATEGORY_HAS_CHILDREN`. Retired parts and coverage entries
    /// still hold the category and answer `CATEGORY_IN_USE`.
    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, id: PartCategoryId) -> ServiceResponse<()> {
        let outcome: Result<()> = async {
            let work = self.store.begin();
            load(&work, id).await?;

            if let Some(blocked) = delete_blocker(&work, id).await? {
                return Err(blocked);
            }

            work.part_categories().remove(id).await?;
            match work.commit().await {
                Ok(()) => {}
                Err(err) if is_still_referenced(&err) => {
                    let fresh = self.store.begin();
                    return Err(delete_blocker(&fresh, id)
                        .await?
                        .unwrap_or(ServiceError::Store(err)));
                }
                Err(err) => return Err(err.into()),
            }
            tracing::info!(category_id = %id, "part category deleted");
            Ok(())
        }
        .await;
        respond(
            "part_category.delete",
            "Part category deleted successfully",
            outcome,
        )
    }
}

async fn load<W: UnitOfWork>(work: &W, id: PartCategoryId) -> Result<PartCategory> {
    work.part_categories()
        .get_by_id(id)
        .await?
        .ok_or_else(|| ServiceError::not_found(PartCategory::NAME, id))
}

async fn ensure_unique_name<W: UnitOfWork>(work: &W, category: &PartCategory) -> Result<()> {
    match work.part_categories().find_by_name(category.name()).await? {
        Some(other) if other.id() != category.id() => Err(duplicate_name(category.name())),
        _ => Ok(()),
    }
}

async fn ensure_parent<W: UnitOfWork>(work: &W, parent_id: PartCategoryId) -> Result<()> {
    if work.part_categories().exists(parent_id).await? {
        Ok(())
    } else {
        Err(parent_not_found(parent_id))
    }
}

/// The rejection that keeps the category from being removed, if any.
async fn delete_blocker<W: UnitOfWork>(
    work: &W,
    id: PartCategoryId,
) -> Result<Option<ServiceError>> {
    let children = work.part_categories().count_children(id).await?;
    if children > 0 {
        return Ok(Some(ServiceError::rejected(
            ErrorCode::CATEGORY_HAS_CHILDREN,
            format!("Category has {children} child categories and cannot be deleted"),
        )));
    }
    let active_parts = work.parts().count_active_in_category(id).await?;
    if active_parts > 0 {
        return Ok(Some(ServiceError::rejected(
            ErrorCode::CATEGORY_HAS_ACTIVE_PARTS,
            format!("Category has {active_parts} active part(s) and cannot be deleted"),
        )));
    }
    let retired_parts = work.parts().count_in_category(id).await?;
    let coverage = work.coverage().count_by_category(id).await?;
    if retired_parts + coverage > 0 {
        return Ok(Some(ServiceError::rejected(
            ErrorCode::CATEGORY_IN_USE,
            format!(
                "Category is referenced by {retired_parts} retired part(s) and \
                 {coverage} coverage entr(ies) and cannot be deleted"
            ),
        )));
    }
    Ok(None)
}

/// Fails when `parent_id` is `id` itself or sits below it.
async fn ensure_not_descendant<W: UnitOfWork>(
    work: &W,
    id: PartCategoryId,
    parent_id: PartCategoryId,
) -> Result<()> {
    let mut seen = HashSet::new();
    let mut cursor = Some(parent_id);
    while let Some(current) = cursor {
        if current == id {
            return Err(DomainError::InvalidParentCategory.into());
        }
        if !seen.insert(current) {
            break;
        }
        cursor = work
            .part_categories()
            .get_by_id(current)
            .await?
            .and_then(|c| c.parent_id());
    }
    Ok(())
}
