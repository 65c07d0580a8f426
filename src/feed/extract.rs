//! Payload Extraction
//!
//! Pure functions turning upstream payloads into ordered posts:
//! HTML → embedded JSON tree → edge list → posts → ordered, truncated posts.
//! Everything past the embedded-JSON lookup is a query over
//! [`serde_json::Value`], never a text pattern.

use std::str::FromStr;

use serde_json::Value;

use crate::error::FetchError;
use crate::feed::Post;

/// Call that wraps profile data in newer page builds.
const ADDITIONAL_DATA_MARKER: &str = "__additionalDataLoaded(";
/// Global assignment used by older page builds.
const SHARED_DATA_MARKER: &str = "window._sharedData";

/// Locations of the timeline edge list, in lookup order.
const EDGE_POINTERS: [&str; 3] = [
    "/entry_data/ProfilePage/0/graphql/user/edge_owner_to_timeline_media/edges",
    "/data/user/edge_owner_to_timeline_media/edges",
    "/graphql/user/edge_owner_to_timeline_media/edges",
];

// == Undated Policy ==
/// What to do with posts that carry no timestamp.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UndatedPolicy {
    /// Remove them from the result
    #[default]
    Drop,
    /// Keep them after every dated post, in upstream order
    Append,
}

impl FromStr for UndatedPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "drop" => Ok(UndatedPolicy::Drop),
            "append" | "keep" => Ok(UndatedPolicy::Append),
            other => Err(format!("unknown undated post policy: {}", other)),
        }
    }
}

// == Embedded JSON ==
/// Finds the profile JSON embedded in a profile page.
///
/// Exactly one JSON value is parsed at the marker offset, so trailing script
/// text does not matter.
pub fn extract_embedded_json(html: &str) -> Option<Value> {
    additional_data(html).or_else(|| shared_data(html))
}

fn additional_data(html: &str) -> Option<Value> {
    html.match_indices(ADDITIONAL_DATA_MARKER)
        .find_map(|(idx, marker)| {
            let args = &html[idx + marker.len()..];
            let comma = args.find(',')?;
            first_json_object(&args[comma + 1..])
        })
}

fn shared_data(html: &str) -> Option<Value> {
    html.match_indices(SHARED_DATA_MARKER)
        .find_map(|(idx, marker)| {
            let rest = html[idx + marker.len()..].trim_start();
            first_json_object(rest.strip_prefix('=')?)
        })
}

fn first_json_object(text: &str) -> Option<Value> {
    let text = text.trim_start();
    if !text.starts_with('{') {
        return None;
    }

    match serde_json::Deserializer::from_str(text)
        .into_iter::<Value>()
        .next()
    {
        Some(Ok(value)) if value.is_object() => Some(value),
        _ => None,
    }
}

// == Edges ==
/// Locates the timeline edge list in a profile JSON tree.
pub fn find_edges(root: &Value) -> Option<&Vec<Value>> {
    EDGE_POINTERS
        .iter()
        .find_map(|pointer| root.pointer(pointer).and_then(Value::as_array))
}

/// Converts timeline edges to posts. Nodes without a shortcode are skipped.
pub fn posts_from_edges(edges: &[Value]) -> Vec<Post> {
    edges.iter().filter_map(post_from_edge).collect()
}

fn post_from_edge(edge: &Value) -> Option<Post> {
    let node = edge.get("node").unwrap_or(edge);

    let shortcode = node.get("shortcode")?.as_str()?;
    let caption = node
        .pointer("/edge_media_to_caption/edges/0/node/text")
        .and_then(Value::as_str)
        .unwrap_or_default();
    let image_url = ["display_url", "thumbnail_src", "thumbnail_url"]
        .iter()
        .filter_map(|key| node.get(*key).and_then(Value::as_str))
        .find(|url| !url.is_empty())
        .unwrap_or_default();
    let timestamp = node
        .get("taken_at_timestamp")
        .and_then(Value::as_i64)
        .filter(|ts| *ts != 0);

    Some(Post::new(shortcode, caption, image_url, timestamp))
}

// == Ordering ==
/// Sorts newest first, applies the undated policy, then truncates to `limit`.
///
/// The sort is stable, so posts sharing a timestamp keep upstream order.
pub fn order_posts(posts: Vec<Post>, policy: UndatedPolicy, limit: usize) -> Vec<Post> {
    let (mut dated, undated): (Vec<Post>, Vec<Post>) =
        posts.into_iter().partition(|post| post.timestamp.is_some());

    dated.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

    if policy == UndatedPolicy::Append {
        dated.extend(undated);
    }

    dated.truncate(limit);
    dated
}

// == Full Normalization ==
/// Runs a profile JSON tree through the whole pipeline.
///
/// # Errors
/// - `NoStructure` when no edge list can be located
/// - `NoPosts` when nothing survives normalization
pub fn posts_from_profile_json(
    root: &Value,
    policy: UndatedPolicy,
    limit: usize,
) -> Result<Vec<Post>, FetchError> {
    let edges = find_edges(root).ok_or(FetchError::NoStructure)?;

    let posts = posts_from_edges(edges);
    if posts.is_empty() {
        return Err(FetchError::NoPosts);
    }

    let ordered = order_posts(posts, policy, limit);
    if ordered.is_empty() {
        return Err(FetchError::NoPosts);
    }

    Ok(ordered)
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn node(shortcode: &str, ts: Option<i64>) -> Value {
        let mut node = json!({
            "shortcode": shortcode,
            "display_url": format!("https://cdn.example/{}.jpg", shortcode),
            "edge_media_to_caption": { "edges": [ { "node": { "text": format!("caption {}", shortcode) } } ] },
        });
        if let Some(ts) = ts {
            node["taken_at_timestamp"] = json!(ts);
        }
        json!({ "node": node })
    }

    fn graphql_profile(edges: Vec<Value>) -> Value {
        json!({
            "graphql": { "user": { "edge_owner_to_timeline_media": { "edges": edges } } }
        })
    }

    fn ids(posts: &[Post]) -> Vec<&str> {
        posts.iter().map(|p| p.id.as_str()).collect()
    }

    #[test]
    fn test_extract_shared_data() {
        let html = r#"<html><script type="text/javascript">window._sharedData = {"entry_data":{"ProfilePage":[{"graphql":{"user":{"edge_owner_to_timeline_media":{"edges":[]}}}}]}};</script></html>"#;
        let value = extract_embedded_json(html).unwrap();
        assert!(find_edges(&value).is_some());
    }

    #[test]
    fn test_extract_additional_data_loaded() {
        let html = r#"<script>window.__additionalDataLoaded('/someone/', {"graphql":{"user":{"edge_owner_to_timeline_media":{"edges":[{"node":{"shortcode":"a1"}}]}}}});</script>"#;
        let value = extract_embedded_json(html).unwrap();
        assert_eq!(find_edges(&value).unwrap().len(), 1);
    }

    #[test]
    fn test_additional_data_preferred_over_shared_data() {
        let html = concat!(
            r#"<script>window._sharedData = {"source":"shared"};</script>"#,
            r#"<script>__additionalDataLoaded("x",{"source":"additional"});</script>"#,
        );
        let value = extract_embedded_json(html).unwrap();
        assert_eq!(value["source"], "additional");
    }

    #[test]
    fn test_extract_handles_braces_inside_strings() {
        let html = r#"<script>window._sharedData = {"caption":"look }); at this","n":1};</script>"#;
        let value = extract_embedded_json(html).unwrap();
        assert_eq!(value["n"], 1);
        assert_eq!(value["caption"], "look }); at this");
    }

    #[test]
    fn test_extract_missing_or_broken() {
        assert!(extract_embedded_json("<html><body>Login</body></html>").is_none());
        assert!(extract_embedded_json("window._sharedData = {broken").is_none());
        assert!(extract_embedded_json("window._sharedData = null;").is_none());
    }

    #[test]
    fn test_find_edges_data_user_shape() {
        let value = json!({ "data": { "user": { "edge_owner_to_timeline_media": { "edges": [ {"node": {"shortcode": "z"}} ] } } } });
        assert_eq!(find_edges(&value).unwrap().len(), 1);
    }

    #[test]
    fn test_find_edges_absent() {
        assert!(find_edges(&json!({ "data": { "user": null } })).is_none());
        assert!(find_edges(&json!({ "graphql": { "user": { "edge_owner_to_timeline_media": { "edges": "nope" } } } })).is_none());
    }

    #[test]
    fn test_post_field_extraction() {
        let edges = vec![json!({
            "node": {
                "shortcode": "abc",
                "thumbnail_src": "https://cdn.example/thumb.jpg",
                "taken_at_timestamp": 1_700_000_000i64,
            }
        })];
        let posts = posts_from_edges(&edges);
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].url, "https://www.instagram.com/p/abc/");
        assert_eq!(posts[0].caption, "");
        assert_eq!(posts[0].image_url, "https://cdn.example/thumb.jpg");
        assert_eq!(posts[0].timestamp, Some(1_700_000_000));
    }

    #[test]
    fn test_bare_node_and_missing_shortcode() {
        let edges = vec![
            json!({ "shortcode": "bare", "taken_at_timestamp": 5 }),
            json!({ "node": { "display_url": "https://cdn.example/x.jpg" } }),
        ];
        let posts = posts_from_edges(&edges);
        assert_eq!(ids(&posts), vec!["bare"]);
    }

    #[test]
    fn test_zero_timestamp_is_absent() {
        let posts = posts_from_edges(&[node("a", Some(0))]);
        assert_eq!(posts[0].timestamp, None);
    }

    #[test]
    fn test_order_newest_first_and_truncate() {
        let posts = posts_from_edges(&[node("old", Some(100)), node("new", Some(300)), node("mid", Some(200))]);
        let ordered = order_posts(posts, UndatedPolicy::Drop, 2);
        assert_eq!(ids(&ordered), vec!["new", "mid"]);
    }

    #[test]
    fn test_undated_dropped() {
        let posts = posts_from_edges(&[node("u1", None), node("d1", Some(100)), node("u2", None)]);
        let ordered = order_posts(posts, UndatedPolicy::Drop, 10);
        assert_eq!(ids(&ordered), vec!["d1"]);
    }

    #[test]
    fn test_undated_appended_in_upstream_order() {
        let posts = posts_from_edges(&[
            node("u1", None),
            node("d1", Some(100)),
            node("u2", None),
            node("d2", Some(200)),
        ]);
        let ordered = order_posts(posts, UndatedPolicy::Append, 10);
        assert_eq!(ids(&ordered), vec!["d2", "d1", "u1", "u2"]);
    }

    #[test]
    fn test_appended_undated_count_toward_limit() {
        let posts = posts_from_edges(&[node("u1", None), node("d1", Some(100)), node("u2", None)]);
        let ordered = order_posts(posts, UndatedPolicy::Append, 2);
        assert_eq!(ids(&ordered), vec!["d1", "u1"]);
    }

    #[test]
    fn test_profile_json_no_structure() {
        let result = posts_from_profile_json(&json!({ "foo": 1 }), UndatedPolicy::Drop, 10);
        assert_eq!(result, Err(FetchError::NoStructure));
    }

    #[test]
    fn test_profile_json_empty_edges() {
        let result = posts_from_profile_json(&graphql_profile(vec![]), UndatedPolicy::Drop, 10);
        assert_eq!(result, Err(FetchError::NoPosts));
    }

    #[test]
    fn test_profile_json_only_undated_depends_on_policy() {
        let profile = graphql_profile(vec![node("u1", None), node("u2", None)]);

        let dropped = posts_from_profile_json(&profile, UndatedPolicy::Drop, 10);
        assert_eq!(dropped, Err(FetchError::NoPosts));

        let kept = posts_from_profile_json(&profile, UndatedPolicy::Append, 10).unwrap();
        assert_eq!(ids(&kept), vec!["u1", "u2"]);
    }

    #[test]
    fn test_policy_from_str() {
        assert_eq!("drop".parse::<UndatedPolicy>(), Ok(UndatedPolicy::Drop));
        assert_eq!(" Append ".parse::<UndatedPolicy>(), Ok(UndatedPolicy::Append));
        assert!("sometimes".parse::<UndatedPolicy>().is_err());
    }
}
