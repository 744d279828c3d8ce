//! Typed wrappers for the PlotTwist REST resources.
//!
//! Catalogue reads (books, genres, a book's reviews) go through the public
//! channel. Everything scoped to the signed-in user goes through the
//! authenticated channel and therefore benefits from refresh-on-`401`.

pub mod books;
pub mod favorites;
pub mod recommendations;
pub mod reviews;
pub mod users;

use serde::{Deserialize, Serialize};

use crate::client::ApiRequest;

pub use books::{Book, BookId, BookList, BookQuery, BookSearchResults, Genre, GenreId};
pub use favorites::{Favorite, FavoriteList, FavoriteStatus, FavoriteToggle};
pub use recommendations::{
    Feedback, RecommendationFeedback, RecommendationItem, RecommendationKind, RecommendationQuery,
    Recommendations,
};
pub use reviews::{
    NewReview, Review, ReviewId, ReviewList, ReviewQuery, ReviewSort, ReviewUpdate, SortOrder,
};
pub use users::{ProfileUpdate, UserProfile, UserProfileStats, UserReviews};

/// Pagination block shared by every list response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PageInfo {
    pub total: u64,
    pub page: u32,
    pub per_page: u32,
    pub total_pages: u32,
}

impl PageInfo {
    #[must_use]
    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }
}

/// `page` / `per_page` query parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PageQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl PageQuery {
    #[must_use]
    pub fn page(page: u32) -> Self {
        Self {
            page: Some(page),
            per_page: None,
        }
    }

    #[must_use]
    pub fn with_per_page(mut self, per_page: u32) -> Self {
        self.per_page = Some(per_page);
        self
    }

    pub(crate) fn apply(self, request: ApiRequest) -> ApiRequest {
        request
            .with_optional_query("page", self.page)
            .with_optional_query("per_page", self.per_page)
    }
}
