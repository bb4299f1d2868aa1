//! Offline repository backed by a dataset export.
//!
//! A dataset export is NDJSON: one document per line, each with `_id` and
//! `_type`. This repository evaluates the two page queries directly over
//! those documents and produces the same shapes the hosted API returns:
//!
//! - posts are matched on `slug.current`; the first match wins
//! - `author._ref` is dereferenced to `{name, image}`
//! - comments are those with `post._ref == <post _id>` and `approved == true`,
//!   in export order, projected to `{_id, name, comment, approved}`
//! - draft documents (`_id` starting with `drafts.`) are invisible, as they
//!   are to unauthenticated API reads

use super::{ContentRepository, Query, RepositoryError};
use async_trait::async_trait;
use serde_json::{Map, Value, json};
use std::path::Path;

pub struct FixtureRepository {
    documents: Vec<Value>,
}

impl FixtureRepository {
    pub fn new(documents: Vec<Value>) -> Self {
        let documents = documents
            .into_iter()
            .filter(|doc| !is_draft(doc))
            .collect();
        Self { documents }
    }

    /// Parse NDJSON export text. Blank lines are skipped.
    pub fn from_ndjson(text: &str) -> Result<Self, RepositoryError> {
        let mut documents = Vec::new();
        for (idx, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let doc: Value =
                serde_json::from_str(line).map_err(|e| RepositoryError::Export {
                    line: idx + 1,
                    message: e.to_string(),
                })?;
            if !doc.is_object() {
                return Err(RepositoryError::Export {
                    line: idx + 1,
                    message: "document is not an object".into(),
                });
            }
            documents.push(doc);
        }
        Ok(Self::new(documents))
    }

    pub fn load(path: &Path) -> Result<Self, RepositoryError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_ndjson(&text)
    }

    fn of_type<'a>(&'a self, kind: &'a str) -> impl Iterator<Item = &'a Value> + 'a {
        self.documents
            .iter()
            .filter(move |doc| doc.get("_type").and_then(Value::as_str) == Some(kind))
    }

    fn by_id(&self, id: &str) -> Option<&Value> {
        self.documents
            .iter()
            .find(|doc| doc.get("_id").and_then(Value::as_str) == Some(id))
    }

    fn all_slugs(&self) -> Value {
        let posts: Vec<Value> = self
            .of_type("post")
            .map(|post| {
                json!({
                    "_id": post.get("_id").cloned().unwrap_or(Value::Null),
                    "title": post.get("title").cloned().unwrap_or(Value::Null),
                    "slug": post
                        .get("slug")
                        .and_then(|s| s.get("current"))
                        .map(|current| json!({ "current": current }))
                        .unwrap_or(Value::Null),
                })
            })
            .collect();
        Value::Array(posts)
    }

    fn post_by_slug(&self, slug: &str) -> Value {
        let Some(post) = self.of_type("post").find(|post| {
            post.pointer("/slug/current").and_then(Value::as_str) == Some(slug)
        }) else {
            return Value::Null;
        };
        let post_id = post.get("_id").and_then(Value::as_str).unwrap_or_default();

        let author = post
            .pointer("/author/_ref")
            .and_then(Value::as_str)
            .and_then(|id| self.by_id(id))
            .map(|author| {
                json!({
                    "name": field(author, "name"),
                    "image": field(author, "image"),
                })
            })
            .unwrap_or(Value::Null);

        let comments: Vec<Value> = self
            .of_type("comment")
            .filter(|c| c.pointer("/post/_ref").and_then(Value::as_str) == Some(post_id))
            .filter(|c| c.get("approved").and_then(Value::as_bool) == Some(true))
            .map(|c| {
                json!({
                    "_id": field(c, "_id"),
                    "name": field(c, "name"),
                    "comment": field(c, "comment"),
                    "approved": field(c, "approved"),
                })
            })
            .collect();

        let mut out = Map::new();
        for key in [
            "_id",
            "_createdAt",
            "title",
            "description",
            "mainImage",
            "slug",
            "body",
        ] {
            out.insert(key.to_string(), field(post, key));
        }
        out.insert("author".into(), author);
        out.insert("comments".into(), Value::Array(comments));
        Value::Object(out)
    }
}

fn is_draft(doc: &Value) -> bool {
    doc.get("_id")
        .and_then(Value::as_str)
        .is_some_and(|id| id.starts_with("drafts."))
}

/// Missing fields project to `null`, as in GROQ.
fn field(doc: &Value, key: &str) -> Value {
    doc.get(key).cloned().unwrap_or(Value::Null)
}

#[async_trait]
impl ContentRepository for FixtureRepository {
    async fn fetch(&self, query: &Query) -> Result<Value, RepositoryError> {
        Ok(match query {
            Query::AllSlugs => self.all_slugs(),
            Query::PostBySlug { slug } => self.post_by_slug(slug),
        })
    }
}
