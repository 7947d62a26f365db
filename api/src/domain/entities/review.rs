//! Review domain entity
//!
//! A review is a short piece of text that players classify as describing
//! headphones ("cans") or wine ("bottles"). Each review keeps one vote counter
//! per category.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Maximum length of a review text, in characters
pub const MAX_REVIEW_LENGTH: usize = 500;

/// Unique identifier for a review
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReviewId(pub Uuid);

impl ReviewId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ReviewId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for ReviewId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for ReviewId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The two things a review can be about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Headphones,
    Wine,
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Category::Headphones => write!(f, "headphones"),
            Category::Wine => write!(f, "wine"),
        }
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "headphones" => Ok(Category::Headphones),
            "wine" => Ok(Category::Wine),
            _ => Err(format!("Unknown vote type: {}", s)),
        }
    }
}

/// A review that is live in the game
#[derive(Debug, Clone, Serialize)]
pub struct Review {
    pub id: ReviewId,
    pub text: String,
    pub votes_headphones: i32,
    pub votes_wine: i32,
    pub created_at: DateTime<Utc>,
}

impl Review {
    pub fn total_votes(&self) -> i64 {
        i64::from(self.votes_headphones) + i64::from(self.votes_wine)
    }

    /// Current vote split for this review
    pub fn percentages(&self) -> VotePercentages {
        VotePercentages::from_counts(
            i64::from(self.votes_headphones),
            i64::from(self.votes_wine),
        )
    }
}

/// Data needed to create a new review
#[derive(Debug, Clone)]
pub struct NewReview {
    pub text: String,
    pub votes_headphones: i32,
    pub votes_wine: i32,
    pub created_at: DateTime<Utc>,
}

/// Integer vote split between the two categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VotePercentages {
    pub headphones_percentage: i32,
    pub wine_percentage: i32,
}

impl VotePercentages {
    pub fn from_counts(headphones: i64, wine: i64) -> Self {
        let (headphones_percentage, wine_percentage) =
            calculate_vote_percentages(headphones, wine);
        Self {
            headphones_percentage,
            wine_percentage,
        }
    }
}

/// Split two vote counts into integer percentages using largest-remainder
/// rounding.
///
/// Returns `(0, 0)` when there are no votes. Otherwise both values are in
/// `[0, 100]` and sum to exactly 100. The leftover point after truncation goes
/// to the count with the larger fractional share; ties go to `count_a`.
///
/// Both counts must be non-negative. Counters only ever grow from zero, so a
/// negative input means the caller handed over corrupt data.
pub fn calculate_vote_percentages(count_a: i64, count_b: i64) -> (i32, i32) {
    debug_assert!(count_a >= 0 && count_b >= 0, "vote counts must be non-negative");

    let total = count_a + count_b;
    if total == 0 {
        return (0, 0);
    }

    // Exact integer shares: floor = 100*c / total, fraction = (100*c % total) / total.
    // Fractions share a denominator so the remainders compare directly.
    let scaled_a = 100 * count_a;
    let scaled_b = 100 * count_b;
    let (mut pct_a, frac_a) = (scaled_a / total, scaled_a % total);
    let (mut pct_b, frac_b) = (scaled_b / total, scaled_b % total);

    let remainder = 100 - (pct_a + pct_b);
    if remainder > 0 {
        if frac_a >= frac_b {
            pct_a += remainder;
        } else {
            pct_b += remainder;
        }
    }

    (pct_a as i32, pct_b as i32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_votes_is_zero_zero() {
        assert_eq!(calculate_vote_percentages(0, 0), (0, 0));
    }

    #[test]
    fn one_third_rounds_toward_larger_fraction() {
        // 33.33 / 66.67 -> remainder goes to the second category
        assert_eq!(calculate_vote_percentages(1, 2), (33, 67));
        assert_eq!(calculate_vote_percentages(2, 1), (67, 33));
    }

    #[test]
    fn even_split() {
        assert_eq!(calculate_vote_percentages(50, 50), (50, 50));
        assert_eq!(calculate_vote_percentages(1, 1), (50, 50));
    }

    #[test]
    fn single_sided_votes() {
        assert_eq!(calculate_vote_percentages(1, 0), (100, 0));
        assert_eq!(calculate_vote_percentages(0, 7), (0, 100));
    }

    #[test]
    fn tie_on_fraction_favours_first_category() {
        // 100/8 = 12.5, 700/8 = 87.5: equal fractions, A gets the point
        assert_eq!(calculate_vote_percentages(1, 7), (13, 87));
    }

    #[test]
    fn always_sums_to_hundred() {
        for a in 0..60 {
            for b in 0..60 {
                if a + b == 0 {
                    continue;
                }
                let (pa, pb) = calculate_vote_percentages(a, b);
                assert_eq!(pa + pb, 100, "a={} b={}", a, b);
                assert!((0..=100).contains(&pa));
                assert!((0..=100).contains(&pb));
            }
        }
    }

    #[test]
    fn large_counts_do_not_overflow() {
        let (pa, pb) = calculate_vote_percentages(i32::MAX as i64, i32::MAX as i64);
        assert_eq!((pa, pb), (50, 50));
    }

    #[test]
    fn pure_function() {
        assert_eq!(
            calculate_vote_percentages(17, 29),
            calculate_vote_percentages(17, 29)
        );
    }

    #[test]
    fn category_from_str() {
        assert_eq!("headphones".parse::<Category>().unwrap(), Category::Headphones);
        assert_eq!("WINE".parse::<Category>().unwrap(), Category::Wine);
        assert!("beer".parse::<Category>().is_err());
    }

    #[test]
    fn category_display() {
        assert_eq!(Category::Headphones.to_string(), "headphones");
        assert_eq!(Category::Wine.to_string(), "wine");
    }

    #[test]
    fn review_percentages_use_counters() {
        let review = Review {
            id: ReviewId::new(),
            text: "Crisp highs, tight bass".to_string(),
            votes_headphones: 3,
            votes_wine: 1,
            created_at: Utc::now(),
        };

        assert_eq!(review.total_votes(), 4);
        assert_eq!(
            review.percentages(),
            VotePercentages {
                headphones_percentage: 75,
                wine_percentage: 25,
            }
        );
    }
}
