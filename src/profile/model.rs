//! User profile data model.

use serde::{Deserialize, Serialize};

/// Persisted age value meaning "the user chose not to share".
pub const AGE_WITHHELD: i64 = -1;

/// Typed view over the persisted age.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Age {
    /// The user declined to give an age.
    Withheld,
    Years(i64),
}

impl Age {
    pub fn from_stored(value: i64) -> Self {
        if value == AGE_WITHHELD {
            Self::Withheld
        } else {
            Self::Years(value)
        }
    }

    pub fn to_stored(self) -> i64 {
        match self {
            Self::Withheld => AGE_WITHHELD,
            Self::Years(n) => n,
        }
    }
}

/// Profile collected by the details dialog.
///
/// Stored under the `user` scope, keyed by user id. A missing field means the
/// question has not been answered yet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<i64>,
}

impl UserProfile {
    /// The answered age, if any.
    pub fn age(&self) -> Option<Age> {
        self.age.map(Age::from_stored)
    }

    pub fn set_age(&mut self, age: Age) {
        self.age = Some(age.to_stored());
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.age.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_profile_is_empty() {
        let p = UserProfile::default();
        assert!(p.is_empty());
        assert!(p.age().is_none());
    }

    #[test]
    fn sentinel_maps_to_withheld() {
        let mut p = UserProfile::default();
        p.set_age(Age::Withheld);
        assert_eq!(p.age, Some(-1));
        assert_eq!(p.age(), Some(Age::Withheld));

        p.set_age(Age::Years(30));
        assert_eq!(p.age(), Some(Age::Years(30)));
    }

    #[test]
    fn absent_fields_are_not_serialized() {
        let p = UserProfile {
            name: Some("Ken".to_string()),
            age: None,
        };
        let json = serde_json::to_value(&p).unwrap();
        assert_eq!(json, serde_json::json!({"name": "Ken"}));

        let parsed: UserProfile = serde_json::from_value(serde_json::json!({})).unwrap();
        assert!(parsed.is_empty());
    }
}
