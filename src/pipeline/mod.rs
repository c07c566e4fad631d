
use crate::analysis::{daily_counts, most_liked, select_diverse};
use crate::cache::Cache;
use crate::classify::{classify_comments, partition, ClassifierOracle, Partition};
use crate::error::{InsightError, InsightResult};
use crate::limiter::{Admission, RateLimiter};
use crate::source::{fetch_comments, CommentSource, SourceError};
use crate::types::{
    CategoryCounts, ChannelSummary, Comment, CommentTrend, MostLiked, MultiVideoTrend, Tier,
    VideoAnalysis, VideoTrend,
};
use chrono::Utc;
use futures::future::try_join_all;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Representative comments returned per summarized category
const SUMMARY_K: usize = 10;
/// Comments fetched per video when only counts are needed
const COUNT_FETCH_LIMIT: usize = 200;
/// Comments fetched for trend and most-liked scans
const SCAN_FETCH_LIMIT: usize = 1000;

/// Orchestrates cache, admission control, fetch, classification, and
/// ranking. Constructed once per process with its collaborators threaded
/// in explicitly; tests substitute fakes for the source and the oracle.
pub struct TriagePipeline {
    cache: Cache,
    limiter: Arc<RateLimiter>,
    source: Arc<dyn CommentSource>,
    oracle: Arc<dyn ClassifierOracle>,
    batch_size: usize,
}

impl TriagePipeline {
    pub fn new(
        cache: Cache,
        limiter: Arc<RateLimiter>,
        source: Arc<dyn CommentSource>,
        oracle: Arc<dyn ClassifierOracle>,
        batch_size: usize,
    ) -> Self {
        Self {
            cache,
            limiter,
            source,
            oracle,
            batch_size,
        }
    }

    /// Channel profile plus latest uploads (tier scales the video count)
    pub async fn channel_summary(
        &self,
        identity: &str,
        channel_name: &str,
        tier: Tier,
    ) -> InsightResult<ChannelSummary> {
        let key = cache_key("channel_summary", channel_name, tier);
        self.shielded(identity, &key, tier.quota(), async {
            Ok(self
                .source
                .channel_summary(channel_name, tier.max_videos())
                .await?)
        })
        .await
    }

    /// Per-video category counts across a channel's latest uploads
    pub async fn multi_video_trend(
        &self,
        identity: &str,
        channel_name: &str,
        tier: Tier,
    ) -> InsightResult<MultiVideoTrend> {
        let key = cache_key("multi_video_trend", channel_name, tier);
        self.shielded(identity, &key, tier.quota(), async {
            let channel = self
                .source
                .channel_summary(channel_name, tier.max_videos())
                .await?;

            let counts = try_join_all(
                channel
                    .latest_videos
                    .iter()
                    .map(|video| self.video_counts(&video.video_id)),
            )
            .await?;

            let trend_data = channel
                .latest_videos
                .into_iter()
                .zip(counts)
                .map(|(video, counts)| VideoTrend {
                    video_id: video.video_id,
                    title: video.title,
                    counts,
                })
                .collect();

            Ok(MultiVideoTrend { trend_data })
        })
        .await
    }

    /// Full single-video analysis: counts plus diversity-ranked summaries
    pub async fn video_analysis(
        &self,
        identity: &str,
        video_id: &str,
        tier: Tier,
        batch_size: Option<usize>,
    ) -> InsightResult<VideoAnalysis> {
        let key = cache_key("video_analysis", video_id, tier);
        let batch_size = batch_size.unwrap_or(self.batch_size);

        self.shielded(identity, &key, tier.quota(), async {
            let details = self.source.video_details(video_id).await?;
            let parts = self
                .classified_comments(video_id, tier.max_comments(), batch_size)
                .await?;

            let summaries = crate::types::CategorySummaries {
                questions: summarize(&parts.questions),
                requests: summarize(&parts.requests),
                feedback: summarize(&parts.feedback),
            };

            info!(
                "Video {} analyzed: {} comments across categories",
                video_id,
                parts.counts.total()
            );

            Ok(VideoAnalysis {
                video_id: details.video_id,
                title: details.title,
                thumbnail_url: details.thumbnail_url,
                counts: parts.counts,
                summaries,
            })
        })
        .await
    }

    /// Most-liked comment per summarized category
    pub async fn most_liked(
        &self,
        identity: &str,
        video_id: &str,
        tier: Tier,
    ) -> InsightResult<MostLiked> {
        let key = cache_key("most_liked", video_id, tier);
        self.shielded(identity, &key, tier.quota(), async {
            let parts = self
                .classified_comments(video_id, SCAN_FETCH_LIMIT, self.batch_size)
                .await?;
            Ok(most_liked(&parts))
        })
        .await
    }

    /// Daily comment counts over the tier's trend window
    pub async fn comment_trend(
        &self,
        identity: &str,
        video_id: &str,
        tier: Tier,
    ) -> InsightResult<CommentTrend> {
        let key = cache_key("comment_trend", video_id, tier);
        self.shielded(identity, &key, tier.quota(), async {
            let comments = self.fetch_or_empty(video_id, SCAN_FETCH_LIMIT).await?;
            let today = Utc::now().date_naive();
            Ok(CommentTrend {
                video_id: video_id.to_string(),
                days: daily_counts(&comments, tier.trend_days(), today),
            })
        })
        .await
    }

    /// The shielding wrapper shared by every operation: serve from cache
    /// without consuming quota, otherwise admit, compute, and store.
    async fn shielded<T, Fut>(
        &self,
        identity: &str,
        key: &str,
        quota: u32,
        compute: Fut,
    ) -> InsightResult<T>
    where
        T: Serialize + DeserializeOwned,
        Fut: Future<Output = InsightResult<T>>,
    {
        if let Some(hit) = self.cache.get_json::<T>(key).await {
            debug!("Serving {} from cache", key);
            return Ok(hit);
        }

        match self.limiter.admit_unique(identity, key, quota) {
            Admission::Denied { retry_after } => {
                return Err(InsightError::RateLimitExceeded { retry_after });
            }
            Admission::Allowed => {}
        }

        let result = compute.await?;
        self.cache.set_json(key, &result).await;
        Ok(result)
    }

    /// Fetch and classify a video's comments; comments-disabled yields an
    /// empty partition (all-zero counts) rather than an error.
    async fn classified_comments(
        &self,
        video_id: &str,
        max_comments: usize,
        batch_size: usize,
    ) -> InsightResult<Partition> {
        let comments = self.fetch_or_empty(video_id, max_comments).await?;
        let labels = classify_comments(&self.oracle, &comments, batch_size).await;
        Ok(partition(&comments, &labels))
    }

    async fn video_counts(&self, video_id: &str) -> InsightResult<CategoryCounts> {
        let parts = self
            .classified_comments(video_id, COUNT_FETCH_LIMIT, self.batch_size)
            .await?;
        Ok(parts.counts)
    }

    async fn fetch_or_empty(
        &self,
        video_id: &str,
        max_comments: usize,
    ) -> InsightResult<Vec<Comment>> {
        match fetch_comments(&self.source, video_id, max_comments).await {
            Ok(comments) => Ok(comments),
            Err(SourceError::CommentsDisabled) => {
                warn!("Comments disabled for video {}", video_id);
                Ok(Vec::new())
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// Deterministic cache key for (operation, resource, tier)
fn cache_key(operation: &str, resource: &str, tier: Tier) -> String {
    format!("{}:{}:{}", operation, resource, tier.as_str())
}

/// Diversity-ranked representative texts for one category
fn summarize(comments: &[Comment]) -> Vec<String> {
    select_diverse(comments, SUMMARY_K)
        .into_iter()
        .map(|c| c.text)
        .collect()
}
