//! Personalised recommendations and feedback on them.

use derive_more::Display;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::books::{Book, BookId, GenreId};
use crate::client::{ApiClient, ApiRequest};
use crate::error::Error;
use crate::types::UserId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationKind {
    #[display("content_based")]
    ContentBased,
    #[display("popularity_based")]
    PopularityBased,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[non_exhaustive]
pub struct RecommendationItem {
    pub book: Book,
    pub score: f64,
    #[serde(default)]
    pub reason: String,
    pub recommendation_type: RecommendationKind,
}

/// Both recommendation lists for the signed-in user.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[non_exhaustive]
pub struct Recommendations {
    pub user_id: UserId,
    #[serde(default)]
    pub content_based: Vec<RecommendationItem>,
    #[serde(default)]
    pub popularity_based: Vec<RecommendationItem>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub generated_at: Option<OffsetDateTime>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecommendationQuery {
    pub limit: Option<u32>,
    pub exclude_user_books: Option<bool>,
    pub min_rating: Option<f64>,
    pub genres: Vec<GenreId>,
}

impl RecommendationQuery {
    #[must_use]
    pub fn limit(limit: u32) -> Self {
        Self {
            limit: Some(limit),
            ..Self::default()
        }
    }

    fn apply(&self, request: ApiRequest) -> ApiRequest {
        let request = request
            .with_optional_query("limit", self.limit)
            .with_optional_query("exclude_user_books", self.exclude_user_books)
            .with_optional_query("min_rating", self.min_rating);
        self.genres
            .iter()
            .fold(request, |request, genre| request.with_query("genres", genre))
    }
}

/// Thumbs up or down on one recommended book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Feedback {
    pub book_id: BookId,
    pub recommendation_type: RecommendationKind,
    pub is_positive: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context_data: Option<String>,
}

impl Feedback {
    #[must_use]
    pub fn new(book_id: BookId, kind: RecommendationKind, is_positive: bool) -> Self {
        Self {
            book_id,
            recommendation_type: kind,
            is_positive,
            context_data: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[non_exhaustive]
pub struct RecommendationFeedback {
    pub id: i64,
    pub user_id: UserId,
    pub book_id: BookId,
    pub recommendation_type: RecommendationKind,
    pub is_positive: bool,
    #[serde(default)]
    pub context_data: Option<String>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub created_at: Option<OffsetDateTime>,
}

impl ApiClient {
    /// `GET /recommendations`
    ///
    /// # Errors
    ///
    /// Returns the authenticated channel's errors.
    pub async fn recommendations(
        &self,
        query: &RecommendationQuery,
    ) -> Result<Recommendations, Error> {
        self.authenticated(query.apply(ApiRequest::get("/recommendations")))
            .await
    }

    /// `POST /recommendations/feedback`
    ///
    /// # Errors
    ///
    /// Returns the authenticated channel's errors.
    pub async fn submit_feedback(
        &self,
        feedback: &Feedback,
    ) -> Result<RecommendationFeedback, Error> {
        self.authenticated(ApiRequest::post("/recommendations/feedback").with_json(feedback)?)
            .await
    }
}
