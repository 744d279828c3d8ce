//! Book catalogue and genres.

use derive_more::{Display, From, FromStr, Into};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::PageInfo;
use crate::client::{ApiClient, ApiRequest};
use crate::error::Error;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, FromStr, From, Into,
)]
#[serde(transparent)]
pub struct BookId(pub i64);

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, FromStr, From, Into,
)]
#[serde(transparent)]
pub struct GenreId(pub i64);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub struct Genre {
    pub id: GenreId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub created_at: Option<OffsetDateTime>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub struct Book {
    pub id: BookId,
    pub title: String,
    pub author: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub published_year: Option<i32>,
    #[serde(default)]
    pub isbn: Option<String>,
    #[serde(default)]
    pub cover_url: Option<String>,
    #[serde(default)]
    pub average_rating: f64,
    #[serde(default)]
    pub total_reviews: u32,
    #[serde(default)]
    pub genres: Vec<Genre>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub created_at: Option<OffsetDateTime>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub updated_at: Option<OffsetDateTime>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[non_exhaustive]
pub struct BookList {
    pub books: Vec<Book>,
    #[serde(flatten)]
    pub page: PageInfo,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[non_exhaustive]
pub struct BookSearchResults {
    pub books: Vec<Book>,
    #[serde(flatten)]
    pub page: PageInfo,
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub filters_applied: serde_json::Map<String, serde_json::Value>,
}

/// Filters for listing and searching books. Unset fields are not sent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BookQuery {
    pub query: Option<String>,
    pub genre_id: Option<GenreId>,
    pub min_rating: Option<f64>,
    pub published_year_start: Option<i32>,
    pub published_year_end: Option<i32>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl BookQuery {
    /// Free-text search.
    #[must_use]
    pub fn text(query: impl Into<String>) -> Self {
        Self {
            query: Some(query.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_genre(mut self, genre: GenreId) -> Self {
        self.genre_id = Some(genre);
        self
    }

    #[must_use]
    pub fn with_min_rating(mut self, rating: f64) -> Self {
        self.min_rating = Some(rating);
        self
    }

    #[must_use]
    pub fn with_published_between(mut self, start: i32, end: i32) -> Self {
        self.published_year_start = Some(start);
        self.published_year_end = Some(end);
        self
    }

    #[must_use]
    pub fn with_page(mut self, page: u32, per_page: u32) -> Self {
        self.page = Some(page);
        self.per_page = Some(per_page);
        self
    }

    fn apply(&self, request: ApiRequest) -> ApiRequest {
        request
            .with_optional_query("query", self.query.as_deref())
            .with_optional_query("genre_id", self.genre_id)
            .with_optional_query("min_rating", self.min_rating)
            .with_optional_query("published_year_start", self.published_year_start)
            .with_optional_query("published_year_end", self.published_year_end)
            .with_optional_query("page", self.page)
            .with_optional_query("per_page", self.per_page)
    }
}

impl ApiClient {
    /// `GET /books`
    ///
    /// # Errors
    ///
    /// Returns the HTTP layer's errors.
    pub async fn list_books(&self, query: &BookQuery) -> Result<BookList, Error> {
        self.public(query.apply(ApiRequest::get("/books"))).await
    }

    /// `GET /books/search`
    ///
    /// # Errors
    ///
    /// Returns the HTTP layer's errors.
    pub async fn search_books(&self, query: &BookQuery) -> Result<BookSearchResults, Error> {
        self.public(query.apply(ApiRequest::get("/books/search"))).await
    }

    /// `GET /books/{id}`
    ///
    /// # Errors
    ///
    /// Returns [`Error::Api`] with status 404 for an unknown book.
    pub async fn get_book(&self, id: BookId) -> Result<Book, Error> {
        self.public(ApiRequest::get(format!("/books/{id}"))).await
    }

    /// `GET /books/genres`
    ///
    /// # Errors
    ///
    /// Returns the HTTP layer's errors.
    pub async fn list_genres(&self) -> Result<Vec<Genre>, Error> {
        self.public(ApiRequest::get("/books/genres")).await
    }

    /// `GET /books/genres/{id}`
    ///
    /// # Errors
    ///
    /// Returns [`Error::Api`] with status 404 for an unknown genre.
    pub async fn get_genre(&self, id: GenreId) -> Result<Genre, Error> {
        self.public(ApiRequest::get(format!("/books/genres/{id}"))).await
    }
}
