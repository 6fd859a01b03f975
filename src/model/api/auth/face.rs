use chrono::{serde::ts_seconds, DateTime, Utc};
use jsonwebtoken::{errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation};
use log::{debug, warn};
use rocket::{
    http::{Cookie, CookieJar, SameSite},
    time::Duration,
};
use serde::{Deserialize, Serialize};

use crate::biometric::FaceMatch;
use crate::config::Config;
use crate::error::Error;
use crate::model::common::VoterId;

pub const FACE_TOKEN_COOKIE: &str = "face_token";

/// The face service's verdict on a sample, as issued to one voter's session.
///
/// Only the server mints these, so a cast can trust its contents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaceToken {
    #[serde(rename = "vid")]
    pub voter_id: VoterId,
    #[serde(rename = "face")]
    pub result: FaceMatch,
}

#[derive(Serialize, Deserialize)]
struct Claims {
    #[serde(flatten)]
    token: FaceToken,
    #[serde(rename = "exp", with = "ts_seconds")]
    expire_at: DateTime<Utc>,
    /// Keeps an auth token from being replayed as a face token.
    typ: String,
}

const TOKEN_TYPE: &str = "face";

impl FaceToken {
    pub fn new(voter_id: VoterId, result: FaceMatch) -> Self {
        Self { voter_id, result }
    }

    pub fn into_cookie(self, config: &Config) -> Result<Cookie<'static>, Error> {
        let claims = Claims {
            token: self,
            expire_at: Utc::now() + config.face_ttl(),
            typ: TOKEN_TYPE.to_string(),
        };

        let token = jsonwebtoken::encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(config.jwt_secret()),
        )?;

        Ok(Cookie::build(FACE_TOKEN_COOKIE, token)
            .max_age(Duration::seconds(config.face_ttl().num_seconds()))
            .http_only(true)
            .same_site(SameSite::Strict)
            .finish())
    }

    pub fn from_cookie(cookie: &Cookie<'_>, config: &Config) -> Result<Self, Error> {
        let claims = jsonwebtoken::decode::<Claims>(
            cookie.value(),
            &DecodingKey::from_secret(config.jwt_secret()),
            &Validation::default(),
        )?
        .claims;
        if claims.typ != TOKEN_TYPE {
            return Err(Error::Jwt(ErrorKind::InvalidToken.into()));
        }
        Ok(claims.token)
    }

    /// The face result this session holds for `voter_id`, if any.
    ///
    /// Expired, forged and other voters' tokens count as no result.
    pub fn for_voter(
        cookies: &CookieJar<'_>,
        config: &Config,
        voter_id: &VoterId,
    ) -> Option<FaceMatch> {
        let cookie = cookies.get(FACE_TOKEN_COOKIE)?;
        match Self::from_cookie(cookie, config) {
            Ok(token) if &token.voter_id == voter_id => Some(token.result),
            Ok(token) => {
                warn!(
                    "Face token for {} presented by voter {voter_id}",
                    token.voter_id
                );
                None
            }
            Err(e) => {
                debug!("Ignoring face token of voter {voter_id}: {e}");
                None
            }
        }
    }
}
