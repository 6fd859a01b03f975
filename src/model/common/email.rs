use std::fmt::{Display, Formatter};
use std::ops::Deref;

use mongodb::bson::Bson;
use serde::{Deserialize, Serialize};

/// A normalised email address: trimmed and lowercased.
///
/// Eligibility lookups are plain equality matches on this form, so every
/// value entering storage must pass through [`Email::normalize`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Email(String);

impl Email {
    pub fn normalize(raw: &str) -> Self {
        Self(raw.trim().to_lowercase())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Deref for Email {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Display for Email {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// Deserialisation also normalises, so stale un-normalised rows still match.
impl From<String> for Email {
    fn from(raw: String) -> Self {
        Self::normalize(&raw)
    }
}

impl From<Email> for String {
    fn from(email: Email) -> Self {
        email.0
    }
}

impl From<Email> for Bson {
    fn from(email: Email) -> Self {
        Bson::String(email.0)
    }
}

#[cfg(test)]
mod tests {
    use mongodb::bson::doc;
    use rocket::serde::json::serde_json;

    use super::*;

    #[test]
    fn normalisation() {
        assert_eq!(
            Email::normalize("  Alice.Smith@Example.ORG \n"),
            Email::normalize("alice.smith@example.org")
        );
        assert_eq!(&*Email::normalize(" Bob@X.io"), "bob@x.io");
        assert!(Email::normalize("   ").is_empty());
    }

    #[test]
    fn deserialising_normalises() {
        let email: Email = serde_json::from_str("\" CAROL@example.com\"").unwrap();
        assert_eq!(&*email, "carol@example.com");
    }

    #[test]
    fn borrowed_email_in_filters() {
        let email = Email::normalize("Dave@X.org");
        let filter = doc! { "email": &email };
        assert_eq!(filter.get_str("email").unwrap(), "dave@x.org");
        assert_eq!(Bson::from(&email), Bson::from(email.clone()));
    }
}
