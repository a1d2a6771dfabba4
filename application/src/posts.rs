use crate::dto::{CommentDto, CreateCommentDto, CreatePostDto, PostDto, UpdatePostDto, filter_by_name};
use crate::{ApplicationError, PostRepository};
use chrono::Utc;
use domain::{Comment, Post, PostId};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Use cases for posts and the comments they own.
pub struct PostService {
    repo: Arc<dyn PostRepository>,
}

impl PostService {
    pub fn new(repo: Arc<dyn PostRepository>) -> Self {
        Self { repo }
    }

    /// Lists posts, optionally keeping only those whose title contains
    /// `needle` (case-insensitive).
    #[instrument(skip(self))]
    pub async fn list_posts(&self, needle: Option<&str>) -> Result<Vec<PostDto>, ApplicationError> {
        let posts = self.repo.list().await?;
        let dtos = filter_by_name(posts.iter().map(PostDto::from).collect(), needle);
        info!(total = posts.len(), returned = dtos.len(), "Retrieved posts");
        Ok(dtos)
    }

    #[instrument(skip(self), fields(post_id = %id))]
    pub async fn get_post(&self, id: &PostId) -> Result<PostDto, ApplicationError> {
        let post = self.find(id).await?;
        Ok(PostDto::from(&post))
    }

    #[instrument(skip(self, request))]
    pub async fn create_post(&self, request: CreatePostDto) -> Result<PostDto, ApplicationError> {
        let (fields, comments) = request
            .into_parts()
            .inspect_err(|e| warn!("Post creation rejected: {}", e))?;
        let post = Post::create(fields, comments, Utc::now());
        self.repo.insert(&post).await?;
        info!(post_id = %post.id(), comments = post.comments().len(), "Post created");
        Ok(PostDto::from(&post))
    }

    /// Replaces title, content, author and the whole comment list of an
    /// existing post.
    #[instrument(skip(self, request), fields(post_id = %id))]
    pub async fn update_post(
        &self,
        id: &PostId,
        request: UpdatePostDto,
    ) -> Result<(), ApplicationError> {
        let (fields, comments) = request
            .into_parts()
            .inspect_err(|e| warn!("Post update rejected: {}", e))?;
        let mut post = self.find(id).await?;
        post.apply(fields, comments, Utc::now());
        if !self.repo.replace(&post).await? {
            return Err(vanished(id));
        }
        info!("Post updated");
        Ok(())
    }

    #[instrument(skip(self), fields(post_id = %id))]
    pub async fn delete_post(&self, id: &PostId) -> Result<(), ApplicationError> {
        let post = self.find(id).await?;
        if !self.repo.delete(&post).await? {
            return Err(vanished(id));
        }
        info!("Post deleted");
        Ok(())
    }

    // --- Comments ---

    #[instrument(skip(self), fields(post_id = %post_id))]
    pub async fn list_comments(&self, post_id: &PostId) -> Result<Vec<CommentDto>, ApplicationError> {
        let comments = self.repo.comments_of(post_id).await?.ok_or_else(|| {
            warn!("Post not found while listing comments");
            ApplicationError::NotFound(format!("Post '{}'", post_id))
        })?;
        debug!(count = comments.len(), "Retrieved comments");
        Ok(comments.iter().map(CommentDto::from).collect())
    }

    #[instrument(skip(self), fields(post_id = %post_id))]
    pub async fn get_comment(
        &self,
        post_id: &PostId,
        title: &str,
    ) -> Result<CommentDto, ApplicationError> {
        let comment = self.repo.comment_of(post_id, title).await?.ok_or_else(|| {
            warn!(title = %title, "Comment not found");
            ApplicationError::NotFound(format!("Comment '{}' of post '{}'", title, post_id))
        })?;
        Ok(CommentDto::from(&comment))
    }

    /// Appends a comment to the end of a post's comment list. The store does
    /// the append in one write, so concurrent additions are all kept.
    #[instrument(skip(self, request), fields(post_id = %post_id))]
    pub async fn add_comment(
        &self,
        post_id: &PostId,
        request: CreateCommentDto,
    ) -> Result<CommentDto, ApplicationError> {
        let fields = request
            .into_fields()
            .inspect_err(|e| warn!("Comment rejected: {}", e))?;
        let comment = Comment::create(fields, *post_id, Utc::now());
        if !self.repo.append_comment(post_id, &comment).await? {
            warn!("Post not found while adding comment");
            return Err(ApplicationError::NotFound(format!("Post '{}'", post_id)));
        }
        info!(comment_id = %comment.id(), "Comment added");
        Ok(CommentDto::from(&comment))
    }

    async fn find(&self, id: &PostId) -> Result<Post, ApplicationError> {
        self.repo.get(id).await?.ok_or_else(|| {
            warn!(post_id = %id, "Post not found");
            ApplicationError::NotFound(format!("Post '{}'", id))
        })
    }
}

/// The post was found but removed before the write landed.
fn vanished(id: &PostId) -> ApplicationError {
    warn!(post_id = %id, "Post removed concurrently");
    ApplicationError::NotFound(format!("Post '{}'", id))
}
