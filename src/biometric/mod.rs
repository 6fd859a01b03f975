//! The boundary with the external face-verification capability.
//!
//! The service's verdict is never trusted alone: [`BiometricPolicy`] re-checks
//! the reported distance before a vote may proceed.

mod policy;
mod templates;
mod verifier;

pub use policy::{BiometricPolicy, FaceMatch, DEFAULT_FACE_THRESHOLD};
pub use templates::{DirectoryTemplates, FaceTemplates, TemplateStatus};
pub use verifier::{FaceError, FaceVerifier, HttpFaceVerifier, UnavailableFaceVerifier};
