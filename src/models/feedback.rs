use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackLabel {
    Issue,
    Idea,
    Question,
    Complaint,
    FeatureRequest,
    Other,
}

impl FeedbackLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Issue => "issue",
            Self::Idea => "idea",
            Self::Question => "question",
            Self::Complaint => "complaint",
            Self::FeatureRequest => "feature_request",
            Self::Other => "other",
        }
    }
}

impl std::str::FromStr for FeedbackLabel {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "issue" => Ok(Self::Issue),
            "idea" => Ok(Self::Idea),
            "question" => Ok(Self::Question),
            "complaint" => Ok(Self::Complaint),
            "feature_request" => Ok(Self::FeatureRequest),
            "other" => Ok(Self::Other),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackStatus {
    Open,
    InProgress,
    Closed,
}

impl FeedbackStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::InProgress => "in_progress",
            Self::Closed => "closed",
        }
    }
}

impl std::str::FromStr for FeedbackStatus {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "open" => Ok(Self::Open),
            "in_progress" => Ok(Self::InProgress),
            "closed" => Ok(Self::Closed),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Feedback {
    pub id: String,
    pub account_id: String,
    pub title: String,
    pub message: String,
    pub label: FeedbackLabel,
    pub status: FeedbackStatus,
    pub created_at: i64,
}

/// Feedback joined with the submitter for the admin table.
#[derive(Debug, Clone, Serialize)]
pub struct FeedbackWithAccount {
    pub id: String,
    pub account_id: String,
    pub account_name: String,
    pub account_email: String,
    pub title: String,
    pub message: String,
    pub label: FeedbackLabel,
    pub status: FeedbackStatus,
    pub created_at: i64,
}

#[derive(Debug, Deserialize)]
pub struct CreateFeedback {
    pub title: String,
    pub message: String,
    pub label: FeedbackLabel,
}

impl CreateFeedback {
    pub fn validate(&self) -> Result<()> {
        if self.title.len() < 3 {
            return Err(AppError::BadRequest("Title is too short".into()));
        }
        if self.title.len() > 255 {
            return Err(AppError::BadRequest("Title is too long".into()));
        }
        if self.message.len() < 10 {
            return Err(AppError::BadRequest("Message is too short".into()));
        }
        if self.message.len() > 1000 {
            return Err(AppError::BadRequest("Message is too long".into()));
        }
        Ok(())
    }
}

/// Admin-side triage update.
#[derive(Debug, Deserialize)]
pub struct UpdateFeedback {
    pub status: FeedbackStatus,
    pub label: FeedbackLabel,
}

/// Filters for the admin feedback table.
#[derive(Debug, Default, Deserialize)]
pub struct FeedbackFilters {
    /// Substring match on title
    pub title: Option<String>,
    pub label: Option<FeedbackLabel>,
    pub status: Option<FeedbackStatus>,
}
