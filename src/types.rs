use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A single top-level comment fetched from the upstream source.
///
/// Immutable once fetched; downstream components receive it by value or
/// shared reference and never mutate it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    /// Plain-text comment body
    pub text: String,
    /// Upstream like count
    pub like_count: u64,
    /// Publication timestamp (UTC)
    pub published_at: DateTime<Utc>,
}

impl Comment {
    /// Convenience constructor used widely in tests
    pub fn new(text: impl Into<String>, like_count: u64, published_at: DateTime<Utc>) -> Self {
        Self {
            text: text.into(),
            like_count,
            published_at,
        }
    }
}

/// Mutually exclusive comment category.
///
/// Assigned by priority order hate > question > request > feedback >
/// neutral: the first oracle that fires wins. The ordering is deliberate
/// policy and must not be reordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Label {
    Hate,
    Question,
    Request,
    Feedback,
    Neutral,
}

/// Subscription tier controlling fetch volume and admission quota
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Free,
    Premium,
}

impl Tier {
    pub fn from_premium_flag(is_premium: bool) -> Self {
        if is_premium {
            Tier::Premium
        } else {
            Tier::Free
        }
    }

    /// Number of latest channel videos considered
    pub fn max_videos(self) -> usize {
        match self {
            Tier::Free => 3,
            Tier::Premium => 10,
        }
    }

    /// Maximum comments fetched for a single video analysis
    pub fn max_comments(self) -> usize {
        match self {
            Tier::Free => 200,
            Tier::Premium => 1000,
        }
    }

    /// Calendar days covered by the comment trend
    pub fn trend_days(self) -> usize {
        match self {
            Tier::Free => 7,
            Tier::Premium => 28,
        }
    }

    /// Unique-miss admission quota per rate-limit window
    pub fn quota(self) -> u32 {
        match self {
            Tier::Free => 5,
            Tier::Premium => 50,
        }
    }

    /// Stable key fragment for cache key construction
    pub fn as_str(self) -> &'static str {
        match self {
            Tier::Free => "free",
            Tier::Premium => "premium",
        }
    }
}

/// Per-category comment counts for one video
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryCounts {
    pub hate: u64,
    pub questions: u64,
    pub requests: u64,
    pub feedback: u64,
    pub neutral: u64,
}

impl CategoryCounts {
    pub fn total(&self) -> u64 {
        self.hate + self.questions + self.requests + self.feedback + self.neutral
    }
}

/// Reference to a single uploaded video
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoRef {
    pub video_id: String,
    pub title: String,
    pub thumbnail_url: String,
}

/// Channel profile plus its latest uploads
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelSummary {
    pub channel_id: String,
    pub channel_name: String,
    pub profile_image: String,
    pub subscriber_count: u64,
    pub latest_videos: Vec<VideoRef>,
}

/// Category counts for one video within a multi-video trend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoTrend {
    pub video_id: String,
    pub title: String,
    pub counts: CategoryCounts,
}

/// Multi-video trend across a channel's latest uploads
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiVideoTrend {
    pub trend_data: Vec<VideoTrend>,
}

/// Diversity-ranked representative comments per summarized category
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategorySummaries {
    pub questions: Vec<String>,
    pub requests: Vec<String>,
    pub feedback: Vec<String>,
}

/// Full single-video comment analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoAnalysis {
    pub video_id: String,
    pub title: String,
    pub thumbnail_url: String,
    pub counts: CategoryCounts,
    pub summaries: CategorySummaries,
}

/// Most-liked comment within one category, if any matched
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LikedComment {
    pub text: Option<String>,
    pub like_count: u64,
}

/// Most-liked comment per summarized category
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MostLiked {
    pub most_liked_question: LikedComment,
    pub most_liked_request: LikedComment,
    pub most_liked_feedback: LikedComment,
}

/// One calendar day of the comment trend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayBucket {
    pub date: NaiveDate,
    pub count: u64,
}

/// Daily comment counts over the tier's trend window, oldest day first
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentTrend {
    pub video_id: String,
    pub days: Vec<DayBucket>,
}
