use serde_json::{Map, Value};

/// A `/helix/users` entry, passed through untouched.
pub type UserInfo = Map<String, Value>;

pub fn user_id(user: &UserInfo) -> Option<&str> {
    user.get("id").and_then(|v| v.as_str())
}
