//! BSON document shapes for the document store.
//!
//! Identities and timestamps are stored as text (hyphenated UUIDs and
//! RFC 3339 strings) rather than native binary/date types, so documents stay
//! portable and readable.

use chrono::{DateTime, SecondsFormat, Utc};
use domain::{Comment, DomainError, Item, Post, UserId};
use serde::{Deserialize, Serialize};

fn timestamp_to_text(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

fn timestamp_from_text(field: &str, text: &str) -> Result<DateTime<Utc>, DomainError> {
    DateTime::parse_from_rfc3339(text)
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(|e| DomainError::InvalidFieldValue {
            field: field.to_string(),
            reason: format!("'{}' is not an RFC 3339 timestamp: {}", text, e),
        })
}

fn author_from_text(author: Option<String>) -> Result<Option<UserId>, DomainError> {
    author.map(|text| text.parse()).transpose()
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ItemRecord {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub created_date: String,
}

impl From<&Item> for ItemRecord {
    fn from(item: &Item) -> Self {
        Self {
            id: item.id().to_string(),
            name: item.name.clone(),
            description: item.description.clone(),
            price: item.price,
            created_date: timestamp_to_text(item.created_date()),
        }
    }
}

impl TryFrom<ItemRecord> for Item {
    type Error = DomainError;

    fn try_from(record: ItemRecord) -> Result<Self, Self::Error> {
        Ok(Item::from_parts(
            record.id.parse()?,
            record.name,
            record.description,
            record.price,
            timestamp_from_text("created_date", &record.created_date)?,
        ))
    }
}

/// A comment embedded inside its post document.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CommentRecord {
    pub id: String,
    pub title: String,
    pub content: String,
    pub author: Option<String>,
    pub post_id: String,
    pub created_date: String,
}

impl From<&Comment> for CommentRecord {
    fn from(comment: &Comment) -> Self {
        Self {
            id: comment.id().to_string(),
            title: comment.title.clone(),
            content: comment.content.clone(),
            author: comment.author.map(|author| author.to_string()),
            post_id: comment.post_id().to_string(),
            created_date: timestamp_to_text(comment.created_date()),
        }
    }
}

impl TryFrom<CommentRecord> for Comment {
    type Error = DomainError;

    fn try_from(record: CommentRecord) -> Result<Self, Self::Error> {
        Ok(Comment::from_parts(
            record.id.parse()?,
            record.title,
            record.content,
            author_from_text(record.author)?,
            record.post_id.parse()?,
            timestamp_from_text("comments.created_date", &record.created_date)?,
        ))
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PostRecord {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    pub content: String,
    pub author: Option<String>,
    #[serde(default)]
    pub comments: Vec<CommentRecord>,
    pub created_date: String,
}

impl From<&Post> for PostRecord {
    fn from(post: &Post) -> Self {
        Self {
            id: post.id().to_string(),
            title: post.title.clone(),
            content: post.content.clone(),
            author: post.author.map(|author| author.to_string()),
            comments: post.comments().iter().map(CommentRecord::from).collect(),
            created_date: timestamp_to_text(post.created_date()),
        }
    }
}

impl TryFrom<PostRecord> for Post {
    type Error = DomainError;

    fn try_from(record: PostRecord) -> Result<Self, Self::Error> {
        let comments = record
            .comments
            .into_iter()
            .map(Comment::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Post::from_parts(
            record.id.parse()?,
            record.title,
            record.content,
            author_from_text(record.author)?,
            comments,
            timestamp_from_text("created_date", &record.created_date)?,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::{CommentFields, ItemFields, PostFields};
    use mongodb::bson::{self, Bson};

    fn sample_post() -> Post {
        Post::create(
            PostFields::new(
                Some("Hello".to_string()),
                Some("World".to_string()),
                Some(UserId::new()),
            )
            .unwrap(),
            vec![CommentFields::new(Some("first".to_string()), None, None).unwrap()],
            Utc::now(),
        )
    }

    #[test]
    fn item_document_stores_identity_and_timestamp_as_text() {
        let item = Item::create(
            ItemFields::new(Some("Potion".to_string()), None, Some(9.0)).unwrap(),
            Utc::now(),
        );

        let document = bson::to_document(&ItemRecord::from(&item)).unwrap();

        assert_eq!(document.get("_id"), Some(&Bson::String(item.id().to_string())));
        assert!(matches!(document.get("created_date"), Some(Bson::String(_))));
        assert_eq!(document.get("price"), Some(&Bson::Double(9.0)));
    }

    #[test]
    fn item_converts_back_losslessly() {
        let item = Item::create(
            ItemFields::new(Some("Potion".to_string()), Some("red".to_string()), Some(9.5)).unwrap(),
            Utc::now(),
        );

        let document = bson::to_document(&ItemRecord::from(&item)).unwrap();
        let record: ItemRecord = bson::from_document(document).unwrap();

        assert_eq!(Item::try_from(record).unwrap(), item);
    }

    #[test]
    fn post_converts_back_with_embedded_comments() {
        let post = sample_post();

        let document = bson::to_document(&PostRecord::from(&post)).unwrap();
        let comments = document.get_array("comments").unwrap();
        assert_eq!(comments.len(), 1);

        let record: PostRecord = bson::from_document(document).unwrap();
        assert_eq!(Post::try_from(record).unwrap(), post);
    }

    #[test]
    fn unparsable_identity_is_rejected() {
        let mut record = PostRecord::from(&sample_post());
        record.id = "not-a-uuid".to_string();
        assert!(matches!(
            Post::try_from(record),
            Err(DomainError::InvalidIdentity(_))
        ));
    }

    #[test]
    fn unparsable_timestamp_is_rejected() {
        let mut record = PostRecord::from(&sample_post());
        record.comments[0].created_date = "yesterday".to_string();
        assert!(matches!(
            Post::try_from(record),
            Err(DomainError::InvalidFieldValue { field, .. }) if field == "comments.created_date"
        ));
    }
}
