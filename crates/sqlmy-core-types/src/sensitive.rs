//! Redacting wrapper for credentials
//!
//! Database passwords travel through configuration as `Sensitive<String>`.
//! The value is only readable through `expose`; formatting and
//! serialisation both print the same mask engine URLs use.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Mask printed in place of a credential
pub const MASK: &str = "***";

/// ```
/// use sqlmy_core_types::Sensitive;
///
/// let password = Sensitive::new("s3cret");
/// assert_eq!(format!("{:?} {}", password, password), "*** ***");
/// assert_eq!(*password.expose(), "s3cret");
/// ```
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Sensitive<T>(T);

impl<T> Sensitive<T> {
    pub fn new(value: T) -> Self {
        Self(value)
    }

    /// The raw value; hand it to the driver, never to a formatter
    pub fn expose(&self) -> &T {
        &self.0
    }

    pub fn into_inner(self) -> T {
        self.0
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Sensitive<U> {
        Sensitive(f(self.0))
    }
}

impl<T> fmt::Debug for Sensitive<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(MASK)
    }
}

impl<T> fmt::Display for Sensitive<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(MASK)
    }
}

impl<T> From<T> for Sensitive<T> {
    fn from(value: T) -> Self {
        Self(value)
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Sensitive<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        T::deserialize(deserializer).map(Sensitive)
    }
}

// Serialises as the mask, never the value.
impl<T> Serialize for Sensitive<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(MASK)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    struct Connection {
        user: String,
        password: Option<Sensitive<String>>,
    }

    #[test]
    fn test_formatting_masks_value() {
        let secret = Sensitive::new("test_password");
        assert_eq!(format!("{:?}", secret), MASK);
        assert_eq!(secret.to_string(), MASK);
    }

    #[test]
    fn test_deserializes_from_plain_value() {
        let conn: Connection =
            serde_json::from_str(r#"{"user":"test_user","password":"test_password"}"#).unwrap();
        assert_eq!(
            conn.password.as_ref().map(|p| p.expose().as_str()),
            Some("test_password")
        );

        let shown = format!("{:?}", conn);
        assert!(shown.contains("test_user"));
        assert!(!shown.contains("test_password"));
    }

    #[test]
    fn test_serializes_as_mask() {
        let conn = Connection {
            user: "test_user".to_string(),
            password: Some(Sensitive::new("test_password".to_string())),
        };
        let json = serde_json::to_string(&conn).unwrap();
        assert_eq!(json, r#"{"user":"test_user","password":"***"}"#);
    }

    #[test]
    fn test_map_keeps_wrapper() {
        let trimmed = Sensitive::new(" pw ".to_string()).map(|s| s.trim().to_string());
        assert_eq!(trimmed.into_inner(), "pw");
    }
}
