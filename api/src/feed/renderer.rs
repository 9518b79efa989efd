//! Feed renderer
//!
//! Renders a feed to an RSS 2.0 document with the Media RSS extension.

use chrono::{DateTime, Utc};
use quick_xml::escape::escape;

use crate::app::Feed;
use crate::domain::entities::{Handle, Post, Profile};

const CHANNEL_TITLE: &str = r#"The "Totally Not Twitter" Feed"#;
const CHANNEL_DESCRIPTION: &str = "Your favorite bird site content, now in RSS form!";
const CHANNEL_LINK: &str = "https://github.com/thytu/XRSS";
const MEDIA_NAMESPACE: &str = "http://search.yahoo.com/mrss/";

/// Render a feed to an RSS document
pub fn render_rss(feed: &Feed, built_at: DateTime<Utc>) -> String {
    let mut buf = String::new();

    buf.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    buf.push_str(&format!(
        "<rss version=\"2.0\" xmlns:media=\"{}\">\n",
        MEDIA_NAMESPACE
    ));
    buf.push_str("<channel>\n");

    buf.push_str(&element("title", CHANNEL_TITLE));
    buf.push_str(&element("link", CHANNEL_LINK));
    buf.push_str(&element("description", CHANNEL_DESCRIPTION));
    buf.push_str(&element("language", "en"));
    buf.push_str(&element("lastBuildDate", &built_at.to_rfc2822()));

    for (handle, posts) in feed.timelines.iter() {
        let profile = feed.profiles.get(handle);
        for post in posts {
            buf.push_str(&render_item(handle, post, profile));
        }
    }

    buf.push_str("</channel>\n");
    buf.push_str("</rss>\n");

    buf
}

fn render_item(handle: &Handle, post: &Post, profile: Option<&Profile>) -> String {
    let link = status_url(handle, &post.id);
    let mut item = String::from("<item>\n");

    item.push_str(&element("title", &format!("{} by {}", post.post_type, handle)));
    item.push_str(&element("link", &link));
    item.push_str(&element("description", &post.text));
    item.push_str(&format!(
        "  <guid isPermaLink=\"true\">{}</guid>\n",
        escape(link.as_str())
    ));
    item.push_str(&element("author", handle.as_str()));
    item.push_str(&element("pubDate", &post.created_at.to_rfc2822()));

    // Avatar only when the profile is cached
    if let Some(profile) = profile.filter(|p| !p.avatar_url.is_empty()) {
        item.push_str(&format!(
            "  <media:content url=\"{}\" medium=\"image\" type=\"image/jpeg\"/>\n",
            escape(profile.large_avatar_url().as_str())
        ));
    }

    item.push_str("</item>\n");
    item
}

fn element(name: &str, text: &str) -> String {
    format!("  <{name}>{}</{name}>\n", escape(text))
}

fn status_url(handle: &Handle, id: &str) -> String {
    format!("https://twitter.com/{}/status/{}", handle, id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::Timelines;
    use crate::domain::entities::PostType;
    use crate::test_utils::{handle, post, test_profile};
    use chrono::TimeZone;
    use std::collections::HashMap;

    fn built_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    fn alice_feed(with_profile: bool) -> Feed {
        let mut profiles = HashMap::new();
        if with_profile {
            profiles.insert(handle("alice"), test_profile("alice"));
        }
        Feed {
            timelines: Timelines(vec![(
                handle("alice"),
                vec![post("3", 30, PostType::Reply), post("1", 10, PostType::Post)],
            )]),
            profiles,
        }
    }

    #[test]
    fn render_rss_empty() {
        let result = render_rss(&Feed::default(), built_at());

        assert!(result.starts_with("<?xml"));
        assert!(result.contains("<title>The &quot;Totally Not Twitter&quot; Feed</title>"));
        assert!(result.contains("<language>en</language>"));
        assert!(result.contains("<lastBuildDate>Mon, 1 Jan 2024 00:00:00 +0000</lastBuildDate>"));
        assert!(!result.contains("<item>"));
        assert!(result.trim_end().ends_with("</rss>"));
    }

    #[test]
    fn render_rss_items_follow_timeline_order() {
        let result = render_rss(&alice_feed(true), built_at());

        assert_eq!(result.matches("<item>").count(), 2);
        let reply = result.find("<title>Reply by alice</title>").unwrap();
        let post = result.find("<title>Post by alice</title>").unwrap();
        assert!(reply < post);
    }

    #[test]
    fn render_rss_item_fields() {
        let result = render_rss(&alice_feed(true), built_at());

        assert!(result.contains("<link>https://twitter.com/alice/status/3</link>"));
        assert!(result.contains(
            "<guid isPermaLink=\"true\">https://twitter.com/alice/status/3</guid>"
        ));
        assert!(result.contains("<author>alice</author>"));
        assert!(result.contains("<pubDate>Thu, 1 Jan 1970 00:00:30 +0000</pubDate>"));
        assert!(result.contains("_400x400.jpg\" medium=\"image\" type=\"image/jpeg\"/>"));
    }

    #[test]
    fn render_rss_without_profile_has_no_media() {
        let result = render_rss(&alice_feed(false), built_at());

        assert!(result.contains("xmlns:media="));
        assert!(!result.contains("<media:content"));
    }

    #[test]
    fn render_rss_escapes_text() {
        let mut feed = alice_feed(false);
        feed.timelines.0[0].1[0].text = "a < b & \"c\"".into();

        let result = render_rss(&feed, built_at());

        assert!(result.contains("<description>a &lt; b &amp; &quot;c&quot;</description>"));
    }
}
