/// Comment classification
///
/// The classifier itself is an opaque batch-prediction oracle behind the
/// `ClassifierOracle` trait; this module owns how it is driven: batched
/// invocation, the label priority cascade, fail-soft recovery, and the
/// partitioning of classified comments into categories. A keyword-matching
/// oracle implementation ships as the default.
use crate::error::{InsightError, InsightResult};
use crate::types::{CategoryCounts, Comment, Label};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

/// The four binary classifiers consulted per comment, in priority order.
/// Hate wins over question, question over request, request over feedback;
/// a comment no classifier claims is neutral. The ordering is deliberate
/// policy and must be preserved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelKind {
    Hate,
    Question,
    Request,
    Feedback,
}

impl LabelKind {
    /// Priority order: first oracle that fires wins
    pub const PRIORITY: [LabelKind; 4] = [
        LabelKind::Hate,
        LabelKind::Question,
        LabelKind::Request,
        LabelKind::Feedback,
    ];

    pub fn label(self) -> Label {
        match self {
            LabelKind::Hate => Label::Hate,
            LabelKind::Question => Label::Question,
            LabelKind::Request => Label::Request,
            LabelKind::Feedback => Label::Feedback,
        }
    }
}

/// Opaque batch text-classification oracle.
///
/// `predict` returns one flag per input text for the given label. Invoked
/// in batches rather than one item at a time for throughput.
#[async_trait]
pub trait ClassifierOracle: Send + Sync {
    async fn predict(&self, kind: LabelKind, batch: &[String]) -> InsightResult<Vec<bool>>;
}

/// Clamp a caller-supplied batch size to the supported range
pub fn clamp_batch_size(requested: usize) -> usize {
    requested.clamp(1, 128)
}

/// Classify a list of comments, one label each, in oracle batches.
///
/// A batch the oracle fails to score is treated as all-neutral and the
/// remaining batches continue; classification failures never abort the
/// caller's pipeline.
pub async fn classify_comments(
    oracle: &Arc<dyn ClassifierOracle>,
    comments: &[Comment],
    batch_size: usize,
) -> Vec<Label> {
    let batch_size = clamp_batch_size(batch_size);
    let mut labels = Vec::with_capacity(comments.len());

    for batch in comments.chunks(batch_size) {
        let texts: Vec<String> = batch.iter().map(|c| c.text.clone()).collect();
        match classify_batch(oracle, &texts).await {
            Ok(mut batch_labels) => labels.append(&mut batch_labels),
            Err(e) => {
                warn!(
                    "Oracle failed on a batch of {}, treating as neutral: {}",
                    texts.len(),
                    e
                );
                labels.extend(std::iter::repeat(Label::Neutral).take(texts.len()));
            }
        }
    }

    labels
}

/// Run the priority cascade over one batch
async fn classify_batch(
    oracle: &Arc<dyn ClassifierOracle>,
    texts: &[String],
) -> InsightResult<Vec<Label>> {
    let mut labels = vec![Label::Neutral; texts.len()];
    let mut decided = vec![false; texts.len()];

    for kind in LabelKind::PRIORITY {
        let flags = oracle.predict(kind, texts).await?;
        if flags.len() != texts.len() {
            return Err(InsightError::ClassificationFailure(format!(
                "oracle returned {} flags for {} texts",
                flags.len(),
                texts.len()
            )));
        }
        for (i, fired) in flags.iter().enumerate() {
            if *fired && !decided[i] {
                labels[i] = kind.label();
                decided[i] = true;
            }
        }
    }

    debug!("Classified batch of {}", texts.len());
    Ok(labels)
}

/// Comments partitioned by label, with per-category counts
#[derive(Debug, Default, Clone)]
pub struct Partition {
    pub counts: CategoryCounts,
    pub questions: Vec<Comment>,
    pub requests: Vec<Comment>,
    pub feedback: Vec<Comment>,
}

/// Split classified comments into category buckets. Hate and neutral are
/// counted but their texts are not retained for summarization.
pub fn partition(comments: &[Comment], labels: &[Label]) -> Partition {
    let mut out = Partition::default();
    for (comment, label) in comments.iter().zip(labels.iter()) {
        match label {
            Label::Hate => out.counts.hate += 1,
            Label::Question => {
                out.counts.questions += 1;
                out.questions.push(comment.clone());
            }
            Label::Request => {
                out.counts.requests += 1;
                out.requests.push(comment.clone());
            }
            Label::Feedback => {
                out.counts.feedback += 1;
                out.feedback.push(comment.clone());
            }
            Label::Neutral => out.counts.neutral += 1,
        }
    }
    out
}

/// Keyword-matching classifier oracle.
///
/// Substring match against per-label phrase lists on the lowercased text,
/// covering common English plus Hinglish audience phrasing.
pub struct KeywordClassifier;

const HATE_KEYWORDS: &[&str] = &[
    "you are trash",
    "worst video",
    "worst channel",
    "garbage content",
    "clickbait",
    "scam",
    "fraud",
    "waste of time",
    "stop making videos",
    "unsubscribed",
    "bakwas",
    "faltu video",
    "jhoota",
];

const QUESTION_KEYWORDS: &[&str] = &[
    "how do i",
    "how can i",
    "how to",
    "what is",
    "why does",
    "why is",
    "where can",
    "which one",
    "can i",
    "should i",
    "does it",
    "anyone know",
    "any idea",
    "can someone",
    "need help with",
    "please explain",
    "doubt",
    "query",
    "confused",
    "kaise",
    "kyu",
    "kya yeh",
    "samjhao",
    "pata nahi",
    "?",
];

const REQUEST_KEYWORDS: &[&str] = &[
    "please make",
    "please upload",
    "please add",
    "pls make",
    "pls upload",
    "can you",
    "could you",
    "would you",
    "make a video",
    "need tutorial",
    "need course",
    "want video on",
    "i request",
    "request you to",
    "kindly share",
    "video chahiye",
    "banao",
    "video lao",
    "course lao",
    "sikhao",
    "kripya",
];

const FEEDBACK_KEYWORDS: &[&str] = &[
    "thank you",
    "thanks",
    "helped me",
    "very helpful",
    "super helpful",
    "really appreciate",
    "best video",
    "great content",
    "amazing content",
    "great work",
    "love your videos",
    "well explained",
    "easy to understand",
    "keep it up",
    "learnt a lot",
    "finally understood",
    "best tutorial",
    "bahut badiya",
    "mast content",
    "shandaar",
    "maza aa gaya",
    "next level content",
];

impl KeywordClassifier {
    fn keywords(kind: LabelKind) -> &'static [&'static str] {
        match kind {
            LabelKind::Hate => HATE_KEYWORDS,
            LabelKind::Question => QUESTION_KEYWORDS,
            LabelKind::Request => REQUEST_KEYWORDS,
            LabelKind::Feedback => FEEDBACK_KEYWORDS,
        }
    }
}

#[async_trait]
impl ClassifierOracle for KeywordClassifier {
    async fn predict(&self, kind: LabelKind, batch: &[String]) -> InsightResult<Vec<bool>> {
        let keywords = Self::keywords(kind);
        Ok(batch
            .iter()
            .map(|text| {
                let lower = text.to_lowercase();
                keywords.iter().any(|k| lower.contains(k))
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn comment(text: &str) -> Comment {
        Comment::new(text, 0, Utc::now())
    }

    /// Oracle that fires a fixed set of kinds for every text
    struct FixedOracle(Vec<LabelKind>);

    #[async_trait]
    impl ClassifierOracle for FixedOracle {
        async fn predict(&self, kind: LabelKind, batch: &[String]) -> InsightResult<Vec<bool>> {
            Ok(vec![self.0.contains(&kind); batch.len()])
        }
    }

    /// Oracle that always fails
    struct BrokenOracle;

    #[async_trait]
    impl ClassifierOracle for BrokenOracle {
        async fn predict(&self, _kind: LabelKind, _batch: &[String]) -> InsightResult<Vec<bool>> {
            Err(InsightError::ClassificationFailure("model offline".into()))
        }
    }

    #[tokio::test]
    async fn test_priority_order_first_firing_wins() {
        // Both question and request fire; question outranks request.
        let oracle: Arc<dyn ClassifierOracle> =
            Arc::new(FixedOracle(vec![LabelKind::Question, LabelKind::Request]));
        let comments = vec![comment("please make a video on how to do this")];
        let labels = classify_comments(&oracle, &comments, 64).await;
        assert_eq!(labels, vec![Label::Question]);

        // Hate outranks everything.
        let oracle: Arc<dyn ClassifierOracle> = Arc::new(FixedOracle(vec![
            LabelKind::Hate,
            LabelKind::Question,
            LabelKind::Feedback,
        ]));
        let labels = classify_comments(&oracle, &comments, 64).await;
        assert_eq!(labels, vec![Label::Hate]);
    }

    #[tokio::test]
    async fn test_unclaimed_comment_is_neutral() {
        let oracle: Arc<dyn ClassifierOracle> = Arc::new(FixedOracle(vec![]));
        let labels = classify_comments(&oracle, &[comment("ok")], 64).await;
        assert_eq!(labels, vec![Label::Neutral]);
    }

    #[tokio::test]
    async fn test_failed_batch_recovers_as_neutral() {
        let oracle: Arc<dyn ClassifierOracle> = Arc::new(BrokenOracle);
        let comments: Vec<Comment> = (0..5).map(|i| comment(&format!("c{}", i))).collect();
        let labels = classify_comments(&oracle, &comments, 2).await;
        assert_eq!(labels.len(), 5);
        assert!(labels.iter().all(|l| *l == Label::Neutral));
    }

    #[tokio::test]
    async fn test_keyword_classifier_scenario() {
        let oracle: Arc<dyn ClassifierOracle> = Arc::new(KeywordClassifier);
        let comments = vec![
            comment("How do I install this?"),
            comment("please make a tutorial"),
            comment("thanks so much!!"),
            comment("you are trash"),
        ];
        let labels = classify_comments(&oracle, &comments, 64).await;
        assert_eq!(
            labels,
            vec![Label::Question, Label::Request, Label::Feedback, Label::Hate]
        );

        let parts = partition(&comments, &labels);
        assert_eq!(parts.counts.hate, 1);
        assert_eq!(parts.counts.questions, 1);
        assert_eq!(parts.counts.requests, 1);
        assert_eq!(parts.counts.feedback, 1);
        assert_eq!(parts.counts.neutral, 0);
        assert_eq!(parts.questions[0].text, "How do I install this?");
    }

    #[test]
    fn test_batch_size_clamped() {
        assert_eq!(clamp_batch_size(0), 1);
        assert_eq!(clamp_batch_size(64), 64);
        assert_eq!(clamp_batch_size(4096), 128);
    }

    #[test]
    fn test_partition_retains_summarizable_categories_only() {
        let comments = vec![comment("a"), comment("b"), comment("c")];
        let labels = vec![Label::Hate, Label::Neutral, Label::Feedback];
        let parts = partition(&comments, &labels);
        assert_eq!(parts.counts.total(), 3);
        assert!(parts.questions.is_empty());
        assert!(parts.requests.is_empty());
        assert_eq!(parts.feedback.len(), 1);
    }
}
