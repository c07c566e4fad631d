/// Comment analysis
///
/// Pure functions over classified comment lists: the TF-IDF diversity
/// ranker, the date-bucketed trend aggregator, and the most-liked
/// selector. Nothing here touches the network or shared state.
pub mod ranking;
pub mod trend;

use crate::classify::Partition;
use crate::types::{Comment, LikedComment, MostLiked};

pub use ranking::select_diverse;
pub use trend::daily_counts;

/// Highest-liked comment per summarized category. Ties keep the earliest
/// comment in fetch order.
pub fn most_liked(parts: &Partition) -> MostLiked {
    MostLiked {
        most_liked_question: top_by_likes(&parts.questions),
        most_liked_request: top_by_likes(&parts.requests),
        most_liked_feedback: top_by_likes(&parts.feedback),
    }
}

fn top_by_likes(comments: &[Comment]) -> LikedComment {
    let mut best: Option<&Comment> = None;
    for comment in comments {
        match best {
            Some(current) if comment.like_count <= current.like_count => {}
            _ => best = Some(comment),
        }
    }
    match best {
        Some(comment) => LikedComment {
            text: Some(comment.text.clone()),
            like_count: comment.like_count,
        },
        None => LikedComment::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_most_liked_per_category() {
        let parts = Partition {
            questions: vec![
                Comment::new("q low", 2, Utc::now()),
                Comment::new("q high", 9, Utc::now()),
            ],
            requests: vec![Comment::new("r only", 4, Utc::now())],
            ..Default::default()
        };

        let top = most_liked(&parts);
        assert_eq!(top.most_liked_question.text.as_deref(), Some("q high"));
        assert_eq!(top.most_liked_question.like_count, 9);
        assert_eq!(top.most_liked_request.like_count, 4);
        // Empty category reports no comment.
        assert_eq!(top.most_liked_feedback.text, None);
        assert_eq!(top.most_liked_feedback.like_count, 0);
    }

    #[test]
    fn test_most_liked_tie_keeps_first() {
        let parts = Partition {
            feedback: vec![
                Comment::new("first", 5, Utc::now()),
                Comment::new("second", 5, Utc::now()),
            ],
            ..Default::default()
        };
        let top = most_liked(&parts);
        assert_eq!(top.most_liked_feedback.text.as_deref(), Some("first"));
    }
}
