use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize}; // Identities travel inside DTOs
use std::fmt;
use std::str::FromStr;
use thiserror::Error; // For domain-specific errors
use uuid::Uuid;

// --- Domain Errors ---
#[derive(Error, Debug, PartialEq)]
pub enum DomainError {
    #[error("Invalid field value for field '{field}': {reason}")]
    InvalidFieldValue { field: String, reason: String },
    #[error("Missing required field '{0}'")]
    MissingField(String),
    #[error("Invalid identity: {0}")]
    InvalidIdentity(String),
}

// --- Identities ---

/// Declares a UUID-backed identity newtype. Identities are generated once,
/// server side, and serialize as their hyphenated text form.
macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Generates a fresh random identity.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl FromStr for $name {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s)
                    .map(Self)
                    .map_err(|e| DomainError::InvalidIdentity(format!("'{}': {}", s, e)))
            }
        }
    };
}

entity_id!(
    /// Identity of an [`Item`].
    ItemId
);
entity_id!(
    /// Identity of a [`Post`].
    PostId
);
entity_id!(
    /// Identity of a [`Comment`].
    CommentId
);
entity_id!(
    /// Identity of a [`User`].
    UserId
);

// --- Validated Field Sets ---

/// Inclusive bounds accepted for an item price.
pub const MIN_ITEM_PRICE: f64 = 1.0;
pub const MAX_ITEM_PRICE: f64 = 1000.0;

fn required_text(field: &str, value: Option<String>) -> Result<String, DomainError> {
    let value = value.ok_or_else(|| DomainError::MissingField(field.to_string()))?;
    if value.trim().is_empty() {
        return Err(DomainError::InvalidFieldValue {
            field: field.to_string(),
            reason: "must not be blank".to_string(),
        });
    }
    Ok(value)
}

/// Client-supplied, validated fields of an item. Never carries identity or
/// creation time.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemFields {
    pub name: String,
    pub description: String,
    pub price: f64,
}

impl ItemFields {
    /// Validates raw payload values: name required and non-blank, price
    /// required and within [`MIN_ITEM_PRICE`, `MAX_ITEM_PRICE`].
    pub fn new(
        name: Option<String>,
        description: Option<String>,
        price: Option<f64>,
    ) -> Result<Self, DomainError> {
        let name = required_text("name", name)?;
        let price = price.ok_or_else(|| DomainError::MissingField("price".to_string()))?;
        // NaN falls outside the range as well
        if !(MIN_ITEM_PRICE..=MAX_ITEM_PRICE).contains(&price) {
            return Err(DomainError::InvalidFieldValue {
                field: "price".to_string(),
                reason: format!(
                    "must be between {} and {}, got {}",
                    MIN_ITEM_PRICE, MAX_ITEM_PRICE, price
                ),
            });
        }
        Ok(Self {
            name,
            description: description.unwrap_or_default(),
            price,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PostFields {
    pub title: String,
    pub content: String,
    pub author: Option<UserId>,
}

impl PostFields {
    pub fn new(
        title: Option<String>,
        content: Option<String>,
        author: Option<UserId>,
    ) -> Result<Self, DomainError> {
        Ok(Self {
            title: required_text("title", title)?,
            content: content.unwrap_or_default(),
            author,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CommentFields {
    pub title: String,
    pub content: String,
    pub author: Option<UserId>,
}

impl CommentFields {
    pub fn new(
        title: Option<String>,
        content: Option<String>,
        author: Option<UserId>,
    ) -> Result<Self, DomainError> {
        Ok(Self {
            title: required_text("title", title)?,
            content: content.unwrap_or_default(),
            author,
        })
    }
}

// --- Entities ---

/// A purchasable item. Independent entity without relations.
#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    id: ItemId,
    pub name: String,
    pub description: String,
    pub price: f64,
    created_date: DateTime<Utc>,
}

impl Item {
    /// Creates a new item with a fresh identity.
    pub fn create(fields: ItemFields, created_date: DateTime<Utc>) -> Self {
        Self::from_parts(
            ItemId::new(),
            fields.name,
            fields.description,
            fields.price,
            created_date,
        )
    }

    /// Rebuilds an item from already-persisted values.
    pub fn from_parts(
        id: ItemId,
        name: String,
        description: String,
        price: f64,
        created_date: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            name,
            description,
            price,
            created_date,
        }
    }

    /// Overwrites every mutable field. Identity and creation time are kept.
    pub fn apply(&mut self, fields: ItemFields) {
        self.name = fields.name;
        self.description = fields.description;
        self.price = fields.price;
    }

    pub fn id(&self) -> &ItemId {
        &self.id
    }

    pub fn created_date(&self) -> DateTime<Utc> {
        self.created_date
    }
}

/// A comment embedded in its parent post. `post_id` is a back-reference
/// only; the post owns the comment.
#[derive(Debug, Clone, PartialEq)]
pub struct Comment {
    id: CommentId,
    pub title: String,
    pub content: String,
    pub author: Option<UserId>,
    post_id: PostId,
    created_date: DateTime<Utc>,
}

impl Comment {
    pub fn create(fields: CommentFields, post_id: PostId, created_date: DateTime<Utc>) -> Self {
        Self::from_parts(
            CommentId::new(),
            fields.title,
            fields.content,
            fields.author,
            post_id,
            created_date,
        )
    }

    pub fn from_parts(
        id: CommentId,
        title: String,
        content: String,
        author: Option<UserId>,
        post_id: PostId,
        created_date: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            title,
            content,
            author,
            post_id,
            created_date,
        }
    }

    pub fn id(&self) -> &CommentId {
        &self.id
    }

    pub fn post_id(&self) -> &PostId {
        &self.post_id
    }

    pub fn created_date(&self) -> DateTime<Utc> {
        self.created_date
    }
}

/// A post and the ordered list of comments it owns.
#[derive(Debug, Clone, PartialEq)]
pub struct Post {
    id: PostId,
    pub title: String,
    pub content: String,
    pub author: Option<UserId>,
    comments: Vec<Comment>,
    created_date: DateTime<Utc>,
}

impl Post {
    /// Creates a new post; each initial comment gets its own identity and a
    /// back-reference to the new post.
    pub fn create(
        fields: PostFields,
        comments: Vec<CommentFields>,
        created_date: DateTime<Utc>,
    ) -> Self {
        let mut post = Self::from_parts(
            PostId::new(),
            fields.title,
            fields.content,
            fields.author,
            Vec::new(),
            created_date,
        );
        for comment in comments {
            post.append_comment(comment, created_date);
        }
        post
    }

    pub fn from_parts(
        id: PostId,
        title: String,
        content: String,
        author: Option<UserId>,
        comments: Vec<Comment>,
        created_date: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            title,
            content,
            author,
            comments,
            created_date,
        }
    }

    /// Overwrites every mutable field, including the comment list, which is
    /// rebuilt from `comments` with fresh comment identities.
    pub fn apply(&mut self, fields: PostFields, comments: Vec<CommentFields>, now: DateTime<Utc>) {
        self.title = fields.title;
        self.content = fields.content;
        self.author = fields.author;
        self.comments.clear();
        for comment in comments {
            self.append_comment(comment, now);
        }
    }

    /// Appends a comment at the end of the list and returns it.
    pub fn append_comment(&mut self, fields: CommentFields, created_date: DateTime<Utc>) -> &Comment {
        let comment = Comment::create(fields, self.id, created_date);
        self.comments.push(comment);
        &self.comments[self.comments.len() - 1]
    }

    /// Appends an already-built comment. Rejected when the comment points at
    /// another post.
    pub fn push_comment(&mut self, comment: Comment) -> Result<(), DomainError> {
        if comment.post_id != self.id {
            return Err(DomainError::InvalidFieldValue {
                field: "postId".to_string(),
                reason: format!("comment belongs to post {}, not {}", comment.post_id, self.id),
            });
        }
        self.comments.push(comment);
        Ok(())
    }

    /// First comment whose title equals `title` exactly.
    pub fn find_comment(&self, title: &str) -> Option<&Comment> {
        self.comments.iter().find(|comment| comment.title == title)
    }

    pub fn id(&self) -> &PostId {
        &self.id
    }

    pub fn comments(&self) -> &[Comment] {
        &self.comments
    }

    pub fn created_date(&self) -> DateTime<Utc> {
        self.created_date
    }
}

/// A user profile. Posts and comments reference users by [`UserId`]; the
/// user keeps only the identities of what it authored.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub biography: String,
    pub image_url: String,
    pub age: u32,
    created_date: DateTime<Utc>,
    posts: Vec<PostId>,
    comments: Vec<CommentId>,
}

impl User {
    pub fn create(
        first_name: String,
        last_name: String,
        biography: String,
        image_url: String,
        age: u32,
        created_date: DateTime<Utc>,
    ) -> Self {
        Self {
            id: UserId::new(),
            first_name,
            last_name,
            biography,
            image_url,
            age,
            created_date,
            posts: Vec::new(),
            comments: Vec::new(),
        }
    }

    pub fn id(&self) -> &UserId {
        &self.id
    }

    pub fn created_date(&self) -> DateTime<Utc> {
        self.created_date
    }

    pub fn posts(&self) -> &[PostId] {
        &self.posts
    }

    pub fn comments(&self) -> &[CommentId] {
        &self.comments
    }
}
