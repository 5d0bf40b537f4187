use chrono::Utc;
use sqlx::{Pool, Sqlite};
use tracing::{info, instrument};

use crate::error::AppError;
use crate::models::{
    DbResource, DbResourceCategory, Resource, ResourceCategory, ResourceType, mirrored_file_url,
};

const RESOURCE_SELECT: &str = "SELECT r.id, r.title, r.description, r.resource_type, \
     r.category_id, rc.name AS category_name, r.file_path, r.external_url, r.file_url, \
     r.is_premium, r.is_active, r.created_at \
     FROM resources r LEFT JOIN resource_categories rc ON rc.id = r.category_id";

#[instrument]
pub async fn list_categories(pool: &Pool<Sqlite>) -> Result<Vec<ResourceCategory>, AppError> {
    let rows = sqlx::query_as::<_, DbResourceCategory>(
        "SELECT id, name, description, is_active, created_at FROM resource_categories
         WHERE is_active = 1 ORDER BY name",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(ResourceCategory::from).collect())
}

#[instrument]
pub async fn create_category(
    pool: &Pool<Sqlite>,
    name: &str,
    description: &str,
) -> Result<i64, AppError> {
    info!("Creating resource category");
    let res = sqlx::query(
        "INSERT INTO resource_categories (name, description, is_active, created_at) VALUES (?, ?, 1, ?)",
    )
    .bind(name)
    .bind(description)
    .bind(Utc::now().naive_utc())
    .execute(pool)
    .await
    .map_err(AppError::from)
    .map_err(|e| {
        if e.is_unique_violation() {
            AppError::Conflict(format!("Category '{}' already exists", name))
        } else {
            e
        }
    })?;

    Ok(res.last_insert_rowid())
}

#[derive(Debug, Clone, Default)]
pub struct ResourceFilter {
    pub include_premium: bool,
    pub category_id: Option<i64>,
    pub resource_type: Option<ResourceType>,
}

/// Active resources, newest first. Premium items are left out unless requested.
#[instrument]
pub async fn list_resources(
    pool: &Pool<Sqlite>,
    filter: &ResourceFilter,
) -> Result<Vec<Resource>, AppError> {
    info!("Listing resources");
    let mut sql = format!("{RESOURCE_SELECT} WHERE r.is_active = 1");
    if !filter.include_premium {
        sql.push_str(" AND r.is_premium = 0");
    }
    if filter.category_id.is_some() {
        sql.push_str(" AND r.category_id = ?");
    }
    if filter.resource_type.is_some() {
        sql.push_str(" AND r.resource_type = ?");
    }
    sql.push_str(" ORDER BY r.created_at DESC, r.id DESC");

    let mut query = sqlx::query_as::<_, DbResource>(&sql);
    if let Some(category_id) = filter.category_id {
        query = query.bind(category_id);
    }
    if let Some(resource_type) = filter.resource_type {
        query = query.bind(resource_type.as_str());
    }

    let rows = query.fetch_all(pool).await?;
    Ok(rows.into_iter().map(Resource::from).collect())
}

/// An active resource by id.
#[instrument]
pub async fn get_resource(pool: &Pool<Sqlite>, resource_id: i64) -> Result<Resource, AppError> {
    let row = sqlx::query_as::<_, DbResource>(&format!(
        "{RESOURCE_SELECT} WHERE r.id = ? AND r.is_active = 1"
    ))
    .bind(resource_id)
    .fetch_optional(pool)
    .await?;

    row.map(Resource::from)
        .ok_or_else(|| AppError::NotFound(format!("Resource {} not found", resource_id)))
}

#[derive(Debug, Clone, Default)]
pub struct NewResource {
    pub title: String,
    pub description: String,
    pub resource_type: ResourceType,
    pub category_id: Option<i64>,
    pub file_path: Option<String>,
    pub external_url: Option<String>,
    pub file_url: Option<String>,
    pub is_premium: bool,
}

#[instrument(skip(resource), fields(title = %resource.title))]
pub async fn create_resource(pool: &Pool<Sqlite>, resource: &NewResource) -> Result<i64, AppError> {
    info!("Creating resource");
    let file_url = mirrored_file_url(
        resource.external_url.as_deref(),
        resource.file_url.as_deref(),
    );

    let res = sqlx::query(
        "INSERT INTO resources (title, description, resource_type, category_id, file_path,
             external_url, file_url, is_premium, is_active, created_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, 1, ?)",
    )
    .bind(&resource.title)
    .bind(&resource.description)
    .bind(resource.resource_type.as_str())
    .bind(resource.category_id)
    .bind(resource.file_path.as_deref().filter(|p| !p.is_empty()))
    .bind(resource.external_url.as_deref().filter(|u| !u.is_empty()))
    .bind(file_url)
    .bind(resource.is_premium)
    .bind(Utc::now().naive_utc())
    .execute(pool)
    .await?;

    Ok(res.last_insert_rowid())
}
