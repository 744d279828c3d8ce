//! Book reviews and ratings.

use derive_more::{Display, From, FromStr, Into};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::PageInfo;
use super::books::BookId;
use crate::client::{ApiClient, ApiRequest};
use crate::error::Error;
use crate::types::UserId;

/// Lowest accepted star rating.
pub const MIN_RATING: u8 = 1;
/// Highest accepted star rating.
pub const MAX_RATING: u8 = 5;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, FromStr, From, Into,
)]
#[serde(transparent)]
pub struct ReviewId(pub i64);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub struct Review {
    pub id: ReviewId,
    pub book_id: BookId,
    pub user_id: UserId,
    pub rating: u8,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub created_at: Option<OffsetDateTime>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub updated_at: Option<OffsetDateTime>,
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default)]
    pub book_title: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[non_exhaustive]
pub struct ReviewList {
    pub reviews: Vec<Review>,
    #[serde(flatten)]
    pub page: PageInfo,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewReview {
    pub book_id: BookId,
    pub rating: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl NewReview {
    #[must_use]
    pub fn new(book_id: BookId, rating: u8) -> Self {
        Self {
            book_id,
            rating,
            title: None,
            content: None,
        }
    }

    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    #[must_use]
    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }
}

/// Partial update; unset fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReviewUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum ReviewSort {
    #[display("created_at")]
    CreatedAt,
    #[display("rating")]
    Rating,
    #[display("updated_at")]
    UpdatedAt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum SortOrder {
    #[display("asc")]
    Asc,
    #[display("desc")]
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReviewQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub sort_by: Option<ReviewSort>,
    pub sort_order: Option<SortOrder>,
}

impl ReviewQuery {
    #[must_use]
    pub fn sorted(sort_by: ReviewSort, order: SortOrder) -> Self {
        Self {
            sort_by: Some(sort_by),
            sort_order: Some(order),
            ..Self::default()
        }
    }

    pub(super) fn apply(self, request: ApiRequest) -> ApiRequest {
        request
            .with_optional_query("page", self.page)
            .with_optional_query("per_page", self.per_page)
            .with_optional_query("sort_by", self.sort_by)
            .with_optional_query("sort_order", self.sort_order)
    }
}

fn check_rating(rating: u8) -> Result<(), Error> {
    if (MIN_RATING..=MAX_RATING).contains(&rating) {
        Ok(())
    } else {
        Err(Error::InvalidRequest(format!(
            "Rating must be between {MIN_RATING} and {MAX_RATING}"
        )))
    }
}

impl ApiClient {
    /// `GET /reviews/books/{id}`
    ///
    /// # Errors
    ///
    /// Returns the HTTP layer's errors.
    pub async fn book_reviews(&self, book: BookId, query: ReviewQuery) -> Result<ReviewList, Error> {
        self.public(query.apply(ApiRequest::get(format!("/reviews/books/{book}"))))
            .await
    }

    /// `POST /reviews`
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRequest`] without calling the API when the
    /// rating is outside 1 to 5.
    pub async fn create_review(&self, review: &NewReview) -> Result<Review, Error> {
        check_rating(review.rating)?;
        self.authenticated(ApiRequest::post("/reviews").with_json(review)?)
            .await
    }

    /// `PUT /reviews/{id}`
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRequest`] without calling the API when a new
    /// rating is outside 1 to 5.
    pub async fn update_review(&self, id: ReviewId, update: &ReviewUpdate) -> Result<Review, Error> {
        if let Some(rating) = update.rating {
            check_rating(rating)?;
        }
        self.authenticated(ApiRequest::put(format!("/reviews/{id}")).with_json(update)?)
            .await
    }

    /// `DELETE /reviews/{id}`
    ///
    /// # Errors
    ///
    /// Returns the HTTP layer's errors.
    pub async fn delete_review(&self, id: ReviewId) -> Result<(), Error> {
        self.authenticated_unit(ApiRequest::delete(format!("/reviews/{id}")))
            .await
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::resources::tests::client;

    pub(crate) fn review_json(id: i64, rating: u8) -> serde_json::Value {
        json!({
            "id": id,
            "book_id": 1,
            "user_id": 1,
            "rating": rating,
            "title": "Great",
            "content": "Loved it",
            "created_at": "2024-03-01T12:00:00Z",
            "updated_at": "2024-03-01T12:00:00Z",
            "user_name": "Ann"
        })
    }

    #[tokio::test]
    async fn book_reviews_are_public_and_sorted() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/reviews/books/1"))
            .and(query_param("sort_by", "rating"))
            .and(query_param("sort_order", "desc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "reviews": [review_json(9, 5)],
                "total": 1,
                "page": 1,
                "per_page": 10,
                "total_pages": 1
            })))
            .mount(&server)
            .await;

        let list = client(&server, true)
            .book_reviews(BookId(1), ReviewQuery::sorted(ReviewSort::Rating, SortOrder::Desc))
            .await
            .unwrap();

        assert_eq!(list.reviews[0].id, ReviewId(9));
        assert_eq!(list.reviews[0].user_name.as_deref(), Some("Ann"));
        let requests = server.received_requests().await.unwrap();
        assert!(!requests[0].headers.contains_key("authorization"));
    }

    #[tokio::test]
    async fn create_review_is_authenticated() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/reviews"))
            .and(header("authorization", "Bearer A1"))
            .and(body_json(json!({"book_id": 1, "rating": 4, "title": "Great"})))
            .respond_with(ResponseTemplate::new(201).set_body_json(review_json(9, 4)))
            .expect(1)
            .mount(&server)
            .await;

        let review = client(&server, true)
            .create_review(&NewReview::new(BookId(1), 4).with_title("Great"))
            .await
            .unwrap();

        assert_eq!(review.rating, 4);
    }

    #[tokio::test]
    async fn out_of_range_rating_is_rejected_locally() {
        let server = MockServer::start().await;
        let client = client(&server, true);

        let err = client
            .create_review(&NewReview::new(BookId(1), 0))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidRequest(_)));
        assert_eq!(err.display_message("Review failed"), "Rating must be between 1 and 5");

        let update = ReviewUpdate {
            rating: Some(6),
            ..ReviewUpdate::default()
        };
        assert!(client.update_review(ReviewId(9), &update).await.is_err());
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn update_and_delete_review() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/reviews/9"))
            .and(body_json(json!({"content": "Even better"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(review_json(9, 5)))
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/reviews/9"))
            .and(header("authorization", "Bearer A1"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;
        let client = client(&server, true);

        let update = ReviewUpdate {
            content: Some("Even better".into()),
            ..ReviewUpdate::default()
        };
        client.update_review(ReviewId(9), &update).await.unwrap();
        client.delete_review(ReviewId(9)).await.unwrap();
    }

    #[tokio::test]
    async fn deleting_someone_elses_review_surfaces_forbidden() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/reviews/3"))
            .respond_with(
                ResponseTemplate::new(403)
                    .set_body_json(json!({"detail": "Not authorized to delete this review"})),
            )
            .mount(&server)
            .await;

        let err = client(&server, true)
            .delete_review(ReviewId(3))
            .await
            .unwrap_err();

        assert_eq!(err.status(), Some(403));
        assert_eq!(err.detail(), Some("Not authorized to delete this review"));
    }
}
