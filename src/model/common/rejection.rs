use rocket::http::Status;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::WindowRejection;

/// A user-facing reason for refusing a vote.
///
/// Rejections are produced by the gates in order, and callers rely on seeing
/// the first applicable one, so each carries its own message.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "reason", content = "detail", rename_all = "snake_case")]
pub enum Rejection {
    #[error("You are not authorized to vote")]
    NotAuthorized,
    #[error("No face image is on file for this voter")]
    FaceImageMissing,
    #[error("The face image on file for this voter could not be read")]
    FaceImageInvalid,
    #[error("Face verification did not pass")]
    FaceNotVerified,
    #[error("You are not eligible to vote in this election")]
    NotEligible,
    #[error("You have already voted in this election")]
    AlreadyVoted,
    #[error("{0}")]
    ElectionNotActive(WindowRejection),
    #[error("The candidate does not belong to this election")]
    CandidateMismatch,
}

impl Rejection {
    /// The HTTP status this rejection is reported with.
    pub fn status(&self) -> Status {
        match self {
            Self::NotAuthorized | Self::NotEligible => Status::Forbidden,
            Self::FaceImageMissing | Self::FaceImageInvalid | Self::FaceNotVerified => {
                Status::BadRequest
            }
            Self::AlreadyVoted => Status::Conflict,
            Self::ElectionNotActive(_) | Self::CandidateMismatch => Status::UnprocessableEntity,
        }
    }
}
