// --- Request/Response Models (Data Transfer Objects - DTOs) ---

use chrono::{DateTime, Utc};
use domain::{
    Comment, CommentFields, CommentId, DomainError, Item, ItemFields, ItemId, Post, PostFields,
    PostId, UserId,
};
use serde::{Deserialize, Serialize};

/// Client-facing shape of an [`Item`].
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ItemDto {
    pub id: ItemId,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub created_date: DateTime<Utc>,
}

impl From<&Item> for ItemDto {
    fn from(item: &Item) -> Self {
        Self {
            id: *item.id(),
            name: item.name.clone(),
            description: item.description.clone(),
            price: item.price,
            created_date: item.created_date(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CommentDto {
    pub id: CommentId,
    pub title: String,
    pub content: String,
    pub author: Option<UserId>,
    pub post_id: PostId,
    pub created_date: DateTime<Utc>,
}

impl From<&Comment> for CommentDto {
    fn from(comment: &Comment) -> Self {
        Self {
            id: *comment.id(),
            title: comment.title.clone(),
            content: comment.content.clone(),
            author: comment.author,
            post_id: *comment.post_id(),
            created_date: comment.created_date(),
        }
    }
}

/// Client-facing shape of a [`Post`], comments included.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PostDto {
    pub id: PostId,
    pub title: String,
    pub content: String,
    pub author: Option<UserId>,
    pub comments: Vec<CommentDto>,
    pub created_date: DateTime<Utc>,
}

impl From<&Post> for PostDto {
    fn from(post: &Post) -> Self {
        Self {
            id: *post.id(),
            title: post.title.clone(),
            content: post.content.clone(),
            author: post.author,
            comments: post.comments().iter().map(CommentDto::from).collect(),
            created_date: post.created_date(),
        }
    }
}

// Payload fields are optional at the serde level so that a missing field is
// reported as a validation error instead of a body rejection.

/// Request to create an item. Carries client fields only.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct CreateItemDto {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
}

impl CreateItemDto {
    pub fn into_fields(self) -> Result<ItemFields, DomainError> {
        ItemFields::new(self.name, self.description, self.price)
    }
}

/// Request to replace the mutable fields of an item.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct UpdateItemDto {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
}

impl UpdateItemDto {
    pub fn into_fields(self) -> Result<ItemFields, DomainError> {
        ItemFields::new(self.name, self.description, self.price)
    }
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct CreateCommentDto {
    pub title: Option<String>,
    pub content: Option<String>,
    pub author: Option<UserId>,
}

impl CreateCommentDto {
    pub fn into_fields(self) -> Result<CommentFields, DomainError> {
        CommentFields::new(self.title, self.content, self.author)
    }
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct CreatePostDto {
    pub title: Option<String>,
    pub content: Option<String>,
    pub author: Option<UserId>,
    #[serde(default)]
    pub comments: Vec<CreateCommentDto>,
}

impl CreatePostDto {
    pub fn into_parts(self) -> Result<(PostFields, Vec<CommentFields>), DomainError> {
        let fields = PostFields::new(self.title, self.content, self.author)?;
        let comments = comment_fields(self.comments)?;
        Ok((fields, comments))
    }
}

/// Request to replace a post. The comment list is replaced as a whole.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct UpdatePostDto {
    pub title: Option<String>,
    pub content: Option<String>,
    pub author: Option<UserId>,
    #[serde(default)]
    pub comments: Vec<CreateCommentDto>,
}

impl UpdatePostDto {
    pub fn into_parts(self) -> Result<(PostFields, Vec<CommentFields>), DomainError> {
        let fields = PostFields::new(self.title, self.content, self.author)?;
        let comments = comment_fields(self.comments)?;
        Ok((fields, comments))
    }
}

/// Validates nested comment payloads, reporting failing fields by position
/// (e.g. `comments[1].title`).
fn comment_fields(comments: Vec<CreateCommentDto>) -> Result<Vec<CommentFields>, DomainError> {
    comments
        .into_iter()
        .enumerate()
        .map(|(index, comment)| {
            comment.into_fields().map_err(|e| match e {
                DomainError::MissingField(field) => {
                    DomainError::MissingField(format!("comments[{}].{}", index, field))
                }
                DomainError::InvalidFieldValue { field, reason } => {
                    DomainError::InvalidFieldValue {
                        field: format!("comments[{}].{}", index, field),
                        reason,
                    }
                }
                other => other,
            })
        })
        .collect()
}

// --- Filtering ---

/// Query parameters accepted by the list endpoints.
#[derive(Deserialize, Debug, Default)]
pub struct NameFilter {
    #[serde(rename = "match")]
    pub needle: Option<String>,
}

/// The text a listing is filtered on.
pub trait DisplayName {
    fn display_name(&self) -> &str;
}

impl DisplayName for ItemDto {
    fn display_name(&self) -> &str {
        &self.name
    }
}

impl DisplayName for PostDto {
    fn display_name(&self) -> &str {
        &self.title
    }
}

/// Keeps the entries whose display name contains `needle`, ignoring case.
/// A missing, empty or whitespace-only needle disables filtering.
pub fn filter_by_name<T: DisplayName>(dtos: Vec<T>, needle: Option<&str>) -> Vec<T> {
    let needle = match needle {
        Some(needle) if !needle.trim().is_empty() => fold_case(needle),
        _ => return dtos,
    };
    dtos.into_iter()
        .filter(|dto| fold_case(dto.display_name()).contains(&needle))
        .collect()
}

/// Upper-cases char by char, keeping any char whose upper case form is not a
/// single char (`ß`, ligatures). Char counts never change.
fn fold_case(text: &str) -> String {
    text.chars()
        .map(|c| {
            let mut upper = c.to_uppercase();
            match (upper.next(), upper.next()) {
                (Some(single), None) => single,
                _ => c,
            }
        })
        .collect()
}
