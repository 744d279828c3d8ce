//! The signed-in user's profile and review history.

use serde::{Deserialize, Serialize};

use super::reviews::{Review, ReviewQuery};
use crate::client::{ApiClient, ApiRequest};
use crate::error::Error;
use crate::types::{User, UserId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub struct UserProfileStats {
    pub total_reviews: u32,
    #[serde(default)]
    pub average_rating_given: Option<f64>,
    pub total_favorites: u32,
    pub books_reviewed: u32,
    pub reviews_this_month: u32,
}

/// User record plus activity statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub struct UserProfile {
    #[serde(flatten)]
    pub user: User,
    pub stats: UserProfileStats,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[non_exhaustive]
pub struct UserReviews {
    pub user_id: UserId,
    pub reviews: Vec<Review>,
    pub total_reviews: u32,
    #[serde(default)]
    pub average_rating_given: Option<f64>,
}

/// Profile edit; unset fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
}

impl ProfileUpdate {
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_bio(mut self, bio: impl Into<String>) -> Self {
        self.bio = Some(bio.into());
        self
    }

    #[must_use]
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    #[must_use]
    pub fn with_website(mut self, website: impl Into<String>) -> Self {
        self.website = Some(website.into());
        self
    }
}

impl ApiClient {
    /// `GET /users/me/profile`
    ///
    /// # Errors
    ///
    /// Returns the authenticated channel's errors.
    pub async fn my_profile(&self) -> Result<UserProfile, Error> {
        self.authenticated(ApiRequest::get("/users/me/profile")).await
    }

    /// `PUT /users/me`
    ///
    /// The session's user record is replaced with the updated one.
    ///
    /// # Errors
    ///
    /// Returns the authenticated channel's errors, e.g. [`Error::Api`] with
    /// status 400 when the new email is already taken.
    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<User, Error> {
        let user: User = self
            .authenticated(ApiRequest::put("/users/me").with_json(update)?)
            .await?;
        if self.session().update_user(user.clone()) {
            tracing::debug!(user_id = %user.id, "Session user updated");
        }
        Ok(user)
    }

    /// `GET /users/me/reviews`
    ///
    /// # Errors
    ///
    /// Returns the authenticated channel's errors.
    pub async fn my_reviews(&self, query: ReviewQuery) -> Result<UserReviews, Error> {
        self.authenticated(query.apply(ApiRequest::get("/users/me/reviews")))
            .await
    }
}
