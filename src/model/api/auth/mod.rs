mod face;
mod token;
mod user;

pub use face::{FaceToken, FACE_TOKEN_COOKIE};
pub use token::{AuthToken, AUTH_TOKEN_COOKIE};
pub use user::{Admin, Rights, User};
