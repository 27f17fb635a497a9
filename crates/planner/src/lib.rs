//! Planning layer - eligibility resolution and course recommendations.

#![warn(missing_docs)]

pub mod eligibility;
pub mod recommend;

pub use eligibility::{compute_available, EligibilityResolver, EligibilitySet, Resolution};
pub use recommend::{
    Priority, Recommendation, RecommendationReport, Recommender, TieredRecommender,
};
