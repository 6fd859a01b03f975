use std::fmt::Display;

use jsonwebtoken::errors::{Error as JwtError, ErrorKind as JwtErrorKind};
use log::{debug, error, warn};
use mongodb::error::Error as DbError;
use rocket::{
    http::Status,
    response::{self, status::Custom, Responder},
    serde::json::{serde_json::json, Json},
    Request,
};
use thiserror::Error;

use crate::biometric::FaceError;
use crate::integrity::IntegrityFailure;
use crate::model::common::Rejection;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Db(#[from] DbError),
    #[error(transparent)]
    Jwt(#[from] JwtError),
    /// A gate refused the request; the reason is safe to show the user.
    #[error(transparent)]
    Rejected(#[from] Rejection),
    /// The ledger already holds a vote for this (voter, election).
    #[error("A vote for this voter and election already exists")]
    StorageConflict,
    #[error(transparent)]
    Integrity(#[from] IntegrityFailure),
    #[error(transparent)]
    Face(#[from] FaceError),
    #[error("{1}")]
    Status(Status, String),
}

impl Error {
    pub fn not_found(what: impl Display) -> Self {
        Self::Status(Status::NotFound, format!("{what} not found"))
    }

    pub fn status(&self) -> Status {
        match self {
            Self::Db(_) | Self::Integrity(_) => Status::InternalServerError,
            Self::Jwt(err) => match err.kind() {
                JwtErrorKind::ExpiredSignature | JwtErrorKind::ImmatureSignature => {
                    Status::Unauthorized
                }
                _ => Status::BadRequest,
            },
            Self::Rejected(rejection) => rejection.status(),
            Self::StorageConflict => Status::Conflict,
            Self::Face(FaceError::Unavailable) => Status::ServiceUnavailable,
            Self::Face(FaceError::BadSample) => Status::BadRequest,
            Self::Face(FaceError::Http(_)) => Status::BadGateway,
            Self::Status(status, _) => *status,
        }
    }
}

impl<'r, 'o: 'r> Responder<'r, 'o> for Error {
    fn respond_to(self, req: &'r Request<'_>) -> response::Result<'o> {
        let status = self.status();
        let body = match &self {
            Self::Rejected(rejection) => {
                debug!("Rejected: {rejection}");
                json!({ "rejection": rejection, "message": rejection.to_string() })
            }
            // Never leak internals to the client.
            Self::Db(_) | Self::Integrity(_) | Self::Face(FaceError::Http(_)) => {
                error!("{self}");
                json!({ "message": status.reason_lossy() })
            }
            _ => {
                warn!("{self}");
                json!({ "message": self.to_string() })
            }
        };
        Custom(status, Json(body)).respond_to(req)
    }
}
