//! Request DTOs for the feed API
//!
//! Defines the query parameters accepted by the feed endpoints.

use serde::Deserialize;

/// Longest username upstream allows.
pub const MAX_USERNAME_LENGTH: usize = 30;

/// Query string of the feed endpoints
///
/// # Fields
/// - `user` / `username`: Profile to read (`user` wins when both are given)
/// - `limit`: Optional number of posts (uses the configured default if not specified)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FeedQuery {
    /// Profile name, short form
    #[serde(default)]
    pub user: Option<String>,
    /// Profile name, long form
    #[serde(default)]
    pub username: Option<String>,
    /// Optional number of posts
    #[serde(default)]
    pub limit: Option<usize>,
}

/// A validated feed request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedRequest {
    pub username: String,
    pub limit: usize,
}

impl FeedQuery {
    /// Validates the query, with `path_username` taking precedence over the query string.
    ///
    /// Returns an error message if validation fails.
    pub fn validate(
        &self,
        path_username: Option<&str>,
        default_limit: usize,
        max_limit: usize,
    ) -> Result<FeedRequest, String> {
        let username = path_username
            .or(self.user.as_deref())
            .or(self.username.as_deref())
            .map(str::trim)
            .unwrap_or_default();

        if username.is_empty() {
            return Err(
                "query \"user\" is required, e.g. /api/instagram?user=genshinimpact".to_string(),
            );
        }
        if username.len() > MAX_USERNAME_LENGTH {
            return Err(format!(
                "username exceeds maximum length of {} characters",
                MAX_USERNAME_LENGTH
            ));
        }
        if !username
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '_')
        {
            return Err("username may only contain letters, digits, '.' and '_'".to_string());
        }

        let limit = self.limit.unwrap_or(default_limit);
        if limit == 0 || limit > max_limit {
            return Err(format!("limit must be between 1 and {}", max_limit));
        }

        Ok(FeedRequest {
            username: username.to_string(),
            limit,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feed_query_deserialize() {
        let query: FeedQuery = serde_json::from_str(r#"{"user": "someone", "limit": 5}"#).unwrap();
        assert_eq!(query.user.as_deref(), Some("someone"));
        assert!(query.username.is_none());
        assert_eq!(query.limit, Some(5));
    }

    #[test]
    fn test_validate_uses_defaults() {
        let query = FeedQuery {
            username: Some("someone".to_string()),
            ..FeedQuery::default()
        };
        let request = query.validate(None, 10, 50).unwrap();
        assert_eq!(request.username, "someone");
        assert_eq!(request.limit, 10);
    }

    #[test]
    fn test_validate_prefers_path_then_user() {
        let query = FeedQuery {
            user: Some("from_user".to_string()),
            username: Some("from_username".to_string()),
            limit: None,
        };
        assert_eq!(query.validate(None, 10, 50).unwrap().username, "from_user");
        assert_eq!(
            query.validate(Some("from_path"), 10, 50).unwrap().username,
            "from_path"
        );
    }

    #[test]
    fn test_validate_missing_username() {
        assert!(FeedQuery::default().validate(None, 10, 50).is_err());

        let blank = FeedQuery {
            user: Some("   ".to_string()),
            ..FeedQuery::default()
        };
        assert!(blank.validate(None, 10, 50).is_err());
    }

    #[test]
    fn test_validate_rejects_bad_characters() {
        let query = FeedQuery {
            user: Some("../etc".to_string()),
            ..FeedQuery::default()
        };
        assert!(query.validate(None, 10, 50).is_err());
    }

    #[test]
    fn test_validate_limit_bounds() {
        let zero = FeedQuery {
            user: Some("someone".to_string()),
            limit: Some(0),
            ..FeedQuery::default()
        };
        assert!(zero.validate(None, 10, 50).is_err());

        let too_many = FeedQuery {
            user: Some("someone".to_string()),
            limit: Some(51),
            ..FeedQuery::default()
        };
        assert!(too_many.validate(None, 10, 50).is_err());

        let max = FeedQuery {
            user: Some("someone".to_string()),
            limit: Some(50),
            ..FeedQuery::default()
        };
        assert_eq!(max.validate(None, 10, 50).unwrap().limit, 50);
    }
}
