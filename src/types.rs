//! Documents returned by the content repository.
//!
//! Field names follow the repository's wire format (`_id`, `_createdAt`,
//! `mainImage`, ...) through serde renames; the Rust side uses snake case.

use crate::portable_text::Block;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A published blog post, composed with its author and approved comments.
#[derive(Debug, Clone, Deserialize)]
pub struct Article {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "mainImage", default)]
    pub main_image: Option<ImageRef>,
    pub slug: Slug,
    #[serde(default, deserialize_with = "null_as_default")]
    pub body: Vec<Block>,
    #[serde(default)]
    pub author: Option<Author>,
    /// Approved comments in query order.
    #[serde(default, deserialize_with = "null_as_default")]
    pub comments: Vec<Comment>,
}

/// Joined author of an article.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Author {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default)]
    pub image: Option<ImageRef>,
}

/// A visitor comment. Only approved comments ever reach an [`Article`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    /// Not projected by the page query; present on raw documents.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub comment: String,
    #[serde(default)]
    pub approved: bool,
}

/// URL slug wrapper as stored by the repository (`slug.current`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slug {
    pub current: String,
}

/// Image field: a reference to an uploaded asset plus optional alt text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageRef {
    pub asset: AssetRef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetRef {
    #[serde(rename = "_ref")]
    pub reference: String,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
