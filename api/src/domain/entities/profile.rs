//! Profile domain entity

use serde::{Deserialize, Serialize};

/// Snapshot of an account's public profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(rename = "screen_name")]
    pub handle: String,
    #[serde(rename = "name")]
    pub display_name: String,
    #[serde(rename = "profile_image_url")]
    pub avatar_url: String,
}

impl Profile {
    /// Avatar URL upgraded from the `normal` thumbnail to the 400x400 rendition
    pub fn large_avatar_url(&self) -> String {
        self.avatar_url.replace("normal", "400x400")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn large_avatar_replaces_normal() {
        let profile = Profile {
            handle: "sama".into(),
            display_name: "Sam".into(),
            avatar_url: "https://pbs.twimg.com/profile_images/1/abc_normal.jpg".into(),
        };
        assert_eq!(
            profile.large_avatar_url(),
            "https://pbs.twimg.com/profile_images/1/abc_400x400.jpg"
        );
    }

    #[test]
    fn serializes_with_upstream_field_names() {
        let profile = Profile {
            handle: "sama".into(),
            display_name: "Sam".into(),
            avatar_url: "u".into(),
        };
        let json = serde_json::to_value(&profile).unwrap();
        assert_eq!(json["screen_name"], "sama");
        assert_eq!(json["name"], "Sam");
        assert_eq!(json["profile_image_url"], "u");
    }
}
