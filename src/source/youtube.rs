use crate::source::{CommentPage, CommentSource, SourceError, VideoDetails};
use crate::types::{ChannelSummary, Comment, VideoRef};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::{debug, warn};

const API_BASE: &str = "https://www.googleapis.com/youtube/v3";

/// YouTube Data API v3 client.
///
/// Implements the `CommentSource` collaborator: channel resolution goes
/// search -> channels (statistics + uploads playlist) -> playlistItems;
/// comments come from commentThreads, 100 per page.
pub struct YouTubeClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl YouTubeClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: API_BASE.to_string(),
        }
    }

    /// Point the client at a different API base (testing)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, &str)],
    ) -> Result<T, SourceError> {
        let url = format!("{}/{}", self.base_url, path);
        let response = self
            .http
            .get(&url)
            .query(params)
            .query(&[("key", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| SourceError::Unavailable(format!("request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            // The API reports disabled comments as a 403 with a
            // distinguishing reason in the error body.
            if status.as_u16() == 403 && body.contains("commentsDisabled") {
                return Err(SourceError::CommentsDisabled);
            }
            if status.as_u16() == 404 {
                return Err(SourceError::NotFound(path.to_string()));
            }
            warn!("YouTube API {} returned {}", path, status);
            return Err(SourceError::Unavailable(format!(
                "{} returned {}",
                path, status
            )));
        }

        response
            .json()
            .await
            .map_err(|e| SourceError::Unavailable(format!("malformed response: {}", e)))
    }
}

#[async_trait]
impl CommentSource for YouTubeClient {
    async fn fetch_comment_page(
        &self,
        video_id: &str,
        page_token: Option<&str>,
    ) -> Result<CommentPage, SourceError> {
        let mut params = vec![
            ("part", "snippet"),
            ("videoId", video_id),
            ("maxResults", "100"),
            ("textFormat", "plainText"),
        ];
        if let Some(token) = page_token {
            params.push(("pageToken", token));
        }

        let response: CommentThreadsResponse = self.get_json("commentThreads", &params).await?;

        let items = response
            .items
            .into_iter()
            .map(|item| {
                let snippet = item.snippet.top_level_comment.snippet;
                Comment {
                    text: snippet.text_display,
                    like_count: snippet.like_count,
                    published_at: snippet.published_at,
                }
            })
            .collect();

        Ok(CommentPage {
            items,
            next_page_token: response.next_page_token,
        })
    }

    async fn video_details(&self, video_id: &str) -> Result<VideoDetails, SourceError> {
        let response: VideosResponse = self
            .get_json("videos", &[("part", "snippet"), ("id", video_id)])
            .await?;

        let item = response
            .items
            .into_iter()
            .next()
            .ok_or_else(|| SourceError::NotFound(format!("video {}", video_id)))?;

        Ok(VideoDetails {
            video_id: video_id.to_string(),
            title: item.snippet.title,
            thumbnail_url: item.snippet.thumbnails.best_url(),
        })
    }

    async fn channel_summary(
        &self,
        channel_name: &str,
        max_videos: usize,
    ) -> Result<ChannelSummary, SourceError> {
        // Resolve the channel by name.
        let search: SearchResponse = self
            .get_json(
                "search",
                &[
                    ("part", "id,snippet"),
                    ("type", "channel"),
                    ("maxResults", "1"),
                    ("q", channel_name),
                ],
            )
            .await?;

        let hit = search
            .items
            .into_iter()
            .next()
            .ok_or_else(|| SourceError::NotFound(format!("channel {}", channel_name)))?;
        let channel_id = hit.id.channel_id;

        // Statistics and the uploads playlist come from one channels call.
        let channels: ChannelsResponse = self
            .get_json(
                "channels",
                &[("part", "statistics,contentDetails"), ("id", &channel_id)],
            )
            .await?;
        let channel = channels
            .items
            .into_iter()
            .next()
            .ok_or_else(|| SourceError::NotFound(format!("channel {}", channel_id)))?;

        let uploads_playlist = channel.content_details.related_playlists.uploads;
        let max_results = max_videos.to_string();
        let playlist: PlaylistItemsResponse = self
            .get_json(
                "playlistItems",
                &[
                    ("part", "snippet"),
                    ("playlistId", &uploads_playlist),
                    ("maxResults", &max_results),
                ],
            )
            .await?;

        let latest_videos = playlist
            .items
            .into_iter()
            .map(|item| VideoRef {
                video_id: item.snippet.resource_id.video_id,
                title: item.snippet.title,
                thumbnail_url: item.snippet.thumbnails.best_url(),
            })
            .collect();

        debug!("Resolved channel {} -> {}", channel_name, channel_id);

        Ok(ChannelSummary {
            channel_id,
            channel_name: hit.snippet.title,
            profile_image: hit.snippet.thumbnails.best_url(),
            subscriber_count: channel
                .statistics
                .subscriber_count
                .and_then(|raw| raw.parse().ok())
                .unwrap_or(0),
            latest_videos,
        })
    }
}

// Wire types for the slices of the API responses this client reads.

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommentThreadsResponse {
    #[serde(default)]
    items: Vec<CommentThread>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CommentThread {
    snippet: CommentThreadSnippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommentThreadSnippet {
    top_level_comment: TopLevelComment,
}

#[derive(Debug, Deserialize)]
struct TopLevelComment {
    snippet: CommentSnippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommentSnippet {
    text_display: String,
    #[serde(default)]
    like_count: u64,
    published_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct VideosResponse {
    #[serde(default)]
    items: Vec<VideoItem>,
}

#[derive(Debug, Deserialize)]
struct VideoItem {
    snippet: VideoSnippet,
}

#[derive(Debug, Deserialize)]
struct VideoSnippet {
    title: String,
    #[serde(default)]
    thumbnails: Thumbnails,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    id: SearchItemId,
    snippet: SearchSnippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchItemId {
    channel_id: String,
}

#[derive(Debug, Deserialize)]
struct SearchSnippet {
    title: String,
    #[serde(default)]
    thumbnails: Thumbnails,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChannelsResponse {
    #[serde(default)]
    items: Vec<ChannelItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChannelItem {
    statistics: ChannelStatistics,
    content_details: ContentDetails,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChannelStatistics {
    subscriber_count: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ContentDetails {
    related_playlists: RelatedPlaylists,
}

#[derive(Debug, Deserialize)]
struct RelatedPlaylists {
    uploads: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlaylistItemsResponse {
    #[serde(default)]
    items: Vec<PlaylistItem>,
}

#[derive(Debug, Deserialize)]
struct PlaylistItem {
    snippet: PlaylistSnippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlaylistSnippet {
    title: String,
    resource_id: ResourceId,
    #[serde(default)]
    thumbnails: Thumbnails,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResourceId {
    video_id: String,
}

#[derive(Debug, Default, Deserialize)]
struct Thumbnails {
    high: Option<Thumbnail>,
    default: Option<Thumbnail>,
}

impl Thumbnails {
    /// Prefer the high-resolution thumbnail, falling back to default
    fn best_url(&self) -> String {
        self.high
            .as_ref()
            .or(self.default.as_ref())
            .map(|t| t.url.clone())
            .unwrap_or_default()
    }
}

#[derive(Debug, Deserialize)]
struct Thumbnail {
    url: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_comment_threads_response_decodes() {
        let raw = json!({
            "items": [{
                "snippet": {
                    "topLevelComment": {
                        "snippet": {
                            "textDisplay": "great video",
                            "likeCount": 7,
                            "publishedAt": "2026-08-20T10:15:00Z"
                        }
                    }
                }
            }],
            "nextPageToken": "CAoQAA"
        });

        let decoded: CommentThreadsResponse = serde_json::from_value(raw).unwrap();
        assert_eq!(decoded.items.len(), 1);
        let snippet = &decoded.items[0].snippet.top_level_comment.snippet;
        assert_eq!(snippet.text_display, "great video");
        assert_eq!(snippet.like_count, 7);
        assert_eq!(decoded.next_page_token.as_deref(), Some("CAoQAA"));
    }

    #[test]
    fn test_missing_like_count_defaults_to_zero() {
        let raw = json!({
            "items": [{
                "snippet": {
                    "topLevelComment": {
                        "snippet": {
                            "textDisplay": "hi",
                            "publishedAt": "2026-08-20T10:15:00Z"
                        }
                    }
                }
            }]
        });

        let decoded: CommentThreadsResponse = serde_json::from_value(raw).unwrap();
        assert_eq!(decoded.items[0].snippet.top_level_comment.snippet.like_count, 0);
        assert!(decoded.next_page_token.is_none());
    }

    #[test]
    fn test_thumbnail_fallback_order() {
        let both: Thumbnails = serde_json::from_value(json!({
            "high": {"url": "https://img/high.jpg"},
            "default": {"url": "https://img/default.jpg"}
        }))
        .unwrap();
        assert_eq!(both.best_url(), "https://img/high.jpg");

        let default_only: Thumbnails =
            serde_json::from_value(json!({"default": {"url": "https://img/default.jpg"}})).unwrap();
        assert_eq!(default_only.best_url(), "https://img/default.jpg");

        let none: Thumbnails = serde_json::from_value(json!({})).unwrap();
        assert_eq!(none.best_url(), "");
    }

    #[test]
    fn test_channel_statistics_decode() {
        let decoded: ChannelsResponse = serde_json::from_value(json!({
            "items": [{
                "statistics": {"subscriberCount": "123456"},
                "contentDetails": {"relatedPlaylists": {"uploads": "UUabc"}}
            }]
        }))
        .unwrap();
        let item = &decoded.items[0];
        assert_eq!(item.statistics.subscriber_count.as_deref(), Some("123456"));
        assert_eq!(item.content_details.related_playlists.uploads, "UUabc");
    }
}
