//! Profile payloads and records

use profile_card::{RawUser, UserRecord};
use serde_json::{Value, json};

/// Full payload for "octocat", with a null bio
pub fn octocat_json() -> Value {
    json!({
        "login": "octocat",
        "id": 583231,
        "avatar_url": "https://avatars.githubusercontent.com/u/583231?v=4",
        "html_url": "https://github.com/octocat",
        "type": "User",
        "name": "The Octocat",
        "company": "@github",
        "blog": "https://github.blog",
        "location": "San Francisco",
        "email": null,
        "bio": null,
        "public_repos": 8,
        "followers": 9000,
        "following": 9,
        "created_at": "2011-01-25T18:44:36Z",
        "updated_at": "2024-01-22T12:13:06Z"
    })
}

/// Minimal payload: only the required fields
pub fn minimal_json(login: &str) -> Value {
    json!({
        "login": login,
        "id": 1,
        "avatar_url": format!("https://avatars.example.com/{login}"),
        "html_url": format!("https://example.com/{login}"),
        "created_at": "2020-05-01T00:00:00Z"
    })
}

/// A normalized record for `handle`, named after it in upper case
pub fn record_for(handle: &str) -> UserRecord {
    let mut payload = minimal_json(handle);
    payload["name"] = json!(handle.to_uppercase());
    payload["followers"] = json!(42);
    let raw: RawUser = serde_json::from_value(payload).expect("fixture payload decodes");
    UserRecord::from_raw(raw).expect("fixture payload normalizes")
}
