use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::utc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceType {
    Video,
    Pdf,
    Image,
    Audio,
    Link,
    #[default]
    Document,
}

impl ResourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceType::Video => "video",
            ResourceType::Pdf => "pdf",
            ResourceType::Image => "image",
            ResourceType::Audio => "audio",
            ResourceType::Link => "link",
            ResourceType::Document => "document",
        }
    }

    pub fn display(&self) -> &'static str {
        match self {
            ResourceType::Video => "Video",
            ResourceType::Pdf => "PDF Document",
            ResourceType::Image => "Image",
            ResourceType::Audio => "Audio",
            ResourceType::Link => "External Link",
            ResourceType::Document => "Document",
        }
    }
}

impl FromStr for ResourceType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "video" => Ok(ResourceType::Video),
            "pdf" => Ok(ResourceType::Pdf),
            "image" => Ok(ResourceType::Image),
            "audio" => Ok(ResourceType::Audio),
            "link" => Ok(ResourceType::Link),
            "document" => Ok(ResourceType::Document),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ResourceCategory {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow, Clone, Default)]
pub struct DbResourceCategory {
    pub id: Option<i64>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub is_active: Option<bool>,
    pub created_at: Option<NaiveDateTime>,
}

impl From<DbResourceCategory> for ResourceCategory {
    fn from(db: DbResourceCategory) -> Self {
        Self {
            id: db.id.unwrap_or_default(),
            name: db.name.unwrap_or_default(),
            description: db.description.unwrap_or_default(),
            is_active: db.is_active.unwrap_or_default(),
            created_at: utc(db.created_at),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Resource {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub resource_type: ResourceType,
    pub resource_type_display: &'static str,
    pub category_id: Option<i64>,
    pub category_name: Option<String>,
    #[serde(skip)]
    pub file_path: Option<String>,
    pub external_url: Option<String>,
    pub file_url: Option<String>,
    pub is_premium: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow, Clone, Default)]
pub struct DbResource {
    pub id: Option<i64>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub resource_type: Option<String>,
    pub category_id: Option<i64>,
    pub category_name: Option<String>,
    pub file_path: Option<String>,
    pub external_url: Option<String>,
    pub file_url: Option<String>,
    pub is_premium: Option<bool>,
    pub is_active: Option<bool>,
    pub created_at: Option<NaiveDateTime>,
}

impl From<DbResource> for Resource {
    fn from(db: DbResource) -> Self {
        let resource_type: ResourceType = db
            .resource_type
            .and_then(|t| t.parse().ok())
            .unwrap_or_default();
        Self {
            id: db.id.unwrap_or_default(),
            title: db.title.unwrap_or_default(),
            description: db.description.unwrap_or_default(),
            resource_type,
            resource_type_display: resource_type.display(),
            category_id: db.category_id,
            category_name: db.category_name,
            file_path: db.file_path.filter(|p| !p.is_empty()),
            external_url: db.external_url.filter(|u| !u.is_empty()),
            file_url: db.file_url.filter(|u| !u.is_empty()),
            is_premium: db.is_premium.unwrap_or_default(),
            is_active: db.is_active.unwrap_or_default(),
            created_at: utc(db.created_at),
        }
    }
}

/// Where a download request for a resource leads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceLocation {
    File(String),
    Url(String),
    Missing,
}

impl Resource {
    /// A stored file wins over links; `external_url` wins over `file_url`.
    /// Blank values count as absent.
    pub fn location(&self) -> ResourceLocation {
        let present = |value: &Option<String>| {
            value
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };

        if let Some(path) = present(&self.file_path) {
            return ResourceLocation::File(path);
        }
        match present(&self.external_url).or_else(|| present(&self.file_url)) {
            Some(url) => ResourceLocation::Url(url),
            None => ResourceLocation::Missing,
        }
    }

    /// Non-premium resources are open to all customers; premium ones need premium access.
    pub fn accessible_with(&self, has_premium_access: bool) -> bool {
        !self.is_premium || has_premium_access
    }
}

/// `file_url` takes the external URL when it was left empty.
pub fn mirrored_file_url(external_url: Option<&str>, file_url: Option<&str>) -> Option<String> {
    match (file_url.filter(|u| !u.is_empty()), external_url) {
        (Some(file_url), _) => Some(file_url.to_string()),
        (None, Some(external)) if !external.is_empty() => Some(external.to_string()),
        _ => None,
    }
}
