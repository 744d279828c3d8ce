//! The signed-in user's favourite books.

use serde::Deserialize;
use time::OffsetDateTime;

use super::books::{Book, BookId};
use super::{PageInfo, PageQuery};
use crate::client::{ApiClient, ApiRequest};
use crate::error::Error;
use crate::types::UserId;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[non_exhaustive]
pub struct Favorite {
    pub id: i64,
    pub book_id: BookId,
    pub user_id: UserId,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub created_at: Option<OffsetDateTime>,
    pub book: Book,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[non_exhaustive]
pub struct FavoriteList {
    pub favorites: Vec<Favorite>,
    #[serde(flatten)]
    pub page: PageInfo,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct FavoriteStatus {
    pub is_favorite: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[non_exhaustive]
pub struct FavoriteToggle {
    pub is_favorite: bool,
    #[serde(default)]
    pub message: String,
}

impl ApiClient {
    /// `GET /favorites`
    ///
    /// # Errors
    ///
    /// Returns the authenticated channel's errors.
    pub async fn my_favorites(&self, query: PageQuery) -> Result<FavoriteList, Error> {
        self.authenticated(query.apply(ApiRequest::get("/favorites")))
            .await
    }

    /// `GET /favorites/{id}/status`
    ///
    /// # Errors
    ///
    /// Returns the authenticated channel's errors.
    pub async fn favorite_status(&self, book: BookId) -> Result<FavoriteStatus, Error> {
        self.authenticated(ApiRequest::get(format!("/favorites/{book}/status")))
            .await
    }

    /// `POST /favorites/{id}/toggle`
    ///
    /// # Errors
    ///
    /// Returns the authenticated channel's errors.
    pub async fn toggle_favorite(&self, book: BookId) -> Result<FavoriteToggle, Error> {
        let toggle: FavoriteToggle = self
            .authenticated(ApiRequest::post(format!("/favorites/{book}/toggle")))
            .await?;
        tracing::debug!(book_id = %book, is_favorite = toggle.is_favorite, "Favorite toggled");
        Ok(toggle)
    }
}
