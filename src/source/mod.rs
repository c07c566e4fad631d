/// Upstream comment source
///
/// The paginated comment/channel provider consumed through a narrow
/// collaborator trait; the pipeline drives "fetch next page" and never
/// sees the provider's paging protocol. `YouTubeClient` is the production
/// implementation; tests substitute fakes.
pub mod youtube;

use crate::error::InsightError;
use crate::types::{ChannelSummary, Comment};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

pub use youtube::YouTubeClient;

/// Failures the comment source can signal.
///
/// `CommentsDisabled` is distinguished so the pipeline can map it to an
/// all-zero result instead of a fatal error.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("comments are disabled")]
    CommentsDisabled,

    #[error("source unavailable: {0}")]
    Unavailable(String),
}

impl From<SourceError> for InsightError {
    fn from(err: SourceError) -> Self {
        match err {
            SourceError::NotFound(what) => InsightError::NotFound(what),
            SourceError::CommentsDisabled => InsightError::CommentsDisabled,
            SourceError::Unavailable(why) => InsightError::UpstreamUnavailable(why),
        }
    }
}

/// One page of comments plus the continuation token, if any
#[derive(Debug, Clone)]
pub struct CommentPage {
    pub items: Vec<Comment>,
    pub next_page_token: Option<String>,
}

/// Title and thumbnail for a single video
#[derive(Debug, Clone)]
pub struct VideoDetails {
    pub video_id: String,
    pub title: String,
    pub thumbnail_url: String,
}

/// Narrow interface over the external video/comment provider
#[async_trait]
pub trait CommentSource: Send + Sync {
    /// Fetch one page of top-level comments for a video
    async fn fetch_comment_page(
        &self,
        video_id: &str,
        page_token: Option<&str>,
    ) -> Result<CommentPage, SourceError>;

    /// Fetch title/thumbnail for a video
    async fn video_details(&self, video_id: &str) -> Result<VideoDetails, SourceError>;

    /// Resolve a channel by name and list its latest uploads
    async fn channel_summary(
        &self,
        channel_name: &str,
        max_videos: usize,
    ) -> Result<ChannelSummary, SourceError>;
}

/// Drive pagination until `max_items` comments are collected or the source
/// runs out of pages.
pub async fn fetch_comments(
    source: &Arc<dyn CommentSource>,
    video_id: &str,
    max_items: usize,
) -> Result<Vec<Comment>, SourceError> {
    let mut comments: Vec<Comment> = Vec::new();
    let mut page_token: Option<String> = None;

    while comments.len() < max_items {
        let page = source
            .fetch_comment_page(video_id, page_token.as_deref())
            .await?;

        for comment in page.items {
            comments.push(comment);
            if comments.len() >= max_items {
                break;
            }
        }

        match page.next_page_token {
            Some(token) if comments.len() < max_items => page_token = Some(token),
            _ => break,
        }
    }

    debug!("Fetched {} comments for video {}", comments.len(), video_id);
    Ok(comments)
}
