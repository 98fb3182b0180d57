//! Shared database models

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Media item category
///
/// Fixed enumeration; stored as lowercase TEXT and enforced by a CHECK
/// constraint on the media_items table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Book,
    Course,
    Podcast,
    Movie,
    Game,
    Debate,
}

impl MediaType {
    pub const ALL: [MediaType; 6] = [
        MediaType::Book,
        MediaType::Course,
        MediaType::Podcast,
        MediaType::Movie,
        MediaType::Game,
        MediaType::Debate,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Book => "book",
            MediaType::Course => "course",
            MediaType::Podcast => "podcast",
            MediaType::Movie => "movie",
            MediaType::Game => "game",
            MediaType::Debate => "debate",
        }
    }
}

impl std::str::FromStr for MediaType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "book" => Ok(MediaType::Book),
            "course" => Ok(MediaType::Course),
            "podcast" => Ok(MediaType::Podcast),
            "movie" => Ok(MediaType::Movie),
            "game" => Ok(MediaType::Game),
            "debate" => Ok(MediaType::Debate),
            other => Err(Error::Validation(format!("Unknown media type: {}", other))),
        }
    }
}

impl std::fmt::Display for MediaType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// User-authored content category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    Video,
    Article,
    DebateContribution,
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Video => "video",
            ContentType::Article => "article",
            ContentType::DebateContribution => "debate_contribution",
        }
    }
}

impl std::str::FromStr for ContentType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "video" => Ok(ContentType::Video),
            "article" => Ok(ContentType::Article),
            "debate_contribution" => Ok(ContentType::DebateContribution),
            other => Err(Error::Validation(format!("Unknown content type: {}", other))),
        }
    }
}

/// User account
///
/// wisdom_score and critic_score are gamified metrics maintained by
/// processes outside the rating aggregator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub guid: Uuid,
    pub username: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub profile_image_url: Option<String>,
    pub wisdom_score: i64,
    pub critic_score: f64,
    pub expertise_goal: i64,
    pub junk_tolerance: i64,
    pub created_at: String,
    pub updated_at: String,
}

/// A piece of content users rate and consume
///
/// The three avg_* fields are the arithmetic mean of all ratings recorded
/// for this item along that dimension, or 3.0 when total_ratings is zero.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaItem {
    pub guid: Uuid,
    pub title: String,
    pub media_type: MediaType,
    pub author: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub external_id: Option<String>,
    pub avg_mind_expanding: f64,
    pub avg_informative: f64,
    pub avg_entertaining: f64,
    pub total_ratings: i64,
    pub created_at: String,
    pub updated_at: String,
}

/// One user's three-dimensional judgment of one media item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserMediaRating {
    pub guid: Uuid,
    pub user_id: Uuid,
    pub media_id: Uuid,
    pub mind_expanding: i64,
    pub informative: i64,
    pub entertaining: i64,
    pub review: Option<String>,
    pub consumed_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Rating joined with the media item it refers to
#[derive(Debug, Clone, Serialize)]
pub struct RatingWithMedia {
    #[serde(flatten)]
    pub rating: UserMediaRating,
    pub media: MediaItem,
}
