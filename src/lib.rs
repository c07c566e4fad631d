pub mod analysis;
pub mod cache;
pub mod classify;
pub mod config;
pub mod error;
pub mod limiter;
pub mod pipeline;
pub mod server;
pub mod source;
pub mod types;

pub use analysis::{daily_counts, most_liked, select_diverse};
pub use cache::{Cache, CacheStore, MemoryCacheStore, RedisCacheStore};
pub use classify::{ClassifierOracle, KeywordClassifier, LabelKind};
pub use config::Config;
pub use error::{InsightError, InsightResult};
pub use limiter::{Admission, RateLimiter};
pub use pipeline::TriagePipeline;
pub use server::InsightServer;
pub use source::{CommentSource, SourceError, YouTubeClient};
pub use types::*;
