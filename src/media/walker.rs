use serde_json::Value;
use tracing::debug;

use super::html_scan::scan_html;
use crate::constants::{TRACE_IMAGE_HOST_PREFIX, VIDEO_HOST_PREFIX};

/// A probe interprets the state in one known shape, returning every media
/// URL it finds (empty when the shape is absent).
type Probe = fn(&Value) -> Vec<String>;

/// Known state shapes in priority order.
const STATE_PROBES: &[(&str, Probe)] = &[
    ("note", probe_note),
    ("noteDetailMap", probe_note_detail_map),
    ("feed.items", probe_feed_items),
    ("root", probe_root),
];

/// Image-bearing keys of a post, in preference order.
const PREFERRED_IMAGE_KEYS: &[&str] = &["originUrl", "urlDefault", "url"];

/// Collect media URLs for one page.
///
/// The structured state is tried first; when it is absent or yields
/// nothing, the raw HTML is scanned instead.
#[must_use]
pub fn collect_media_urls(state: Option<&Value>, html: &str) -> Vec<String> {
    if let Some(state) = state {
        let urls = collect_state_urls(state);
        if !urls.is_empty() {
            return urls;
        }
    }
    let urls = scan_html(html);
    debug!(count = urls.len(), "Collected media URLs from raw HTML");
    urls
}

/// Collect media URLs from the structured state, stopping at the first
/// shape that yields anything.
#[must_use]
pub fn collect_state_urls(state: &Value) -> Vec<String> {
    for (shape, probe) in STATE_PROBES {
        let urls = probe(state);
        if !urls.is_empty() {
            debug!(shape = %shape, count = urls.len(), "Collected media URLs from state");
            return urls;
        }
    }
    Vec::new()
}

fn probe_note(state: &Value) -> Vec<String> {
    state.get("note").map(walk_post_container).unwrap_or_default()
}

fn probe_note_detail_map(state: &Value) -> Vec<String> {
    state
        .get("noteDetailMap")
        .map(walk_note_detail_map)
        .unwrap_or_default()
}

fn probe_feed_items(state: &Value) -> Vec<String> {
    let Some(items) = state.pointer("/feed/items").and_then(Value::as_array) else {
        return Vec::new();
    };

    let mut urls = Vec::new();
    for item in items {
        let post = ["note", "noteCard"]
            .iter()
            .find_map(|key| item.get(*key).filter(|v| v.is_object()))
            .unwrap_or(item);
        walk_post(post, &mut urls);
    }
    urls
}

fn probe_root(state: &Value) -> Vec<String> {
    walk_post_container(state)
}

/// Walk a value as a post; if it holds nothing directly but carries a
/// `noteDetailMap`, walk that map instead.
fn walk_post_container(value: &Value) -> Vec<String> {
    let mut urls = Vec::new();
    walk_post(value, &mut urls);
    if urls.is_empty() {
        if let Some(map) = value.get("noteDetailMap") {
            urls = walk_note_detail_map(map);
        }
    }
    urls
}

fn walk_note_detail_map(map: &Value) -> Vec<String> {
    let Some(entries) = map.as_object() else {
        return Vec::new();
    };

    let mut urls = Vec::new();
    for entry in entries.values() {
        let post = entry.get("note").filter(|v| v.is_object()).unwrap_or(entry);
        walk_post(post, &mut urls);
    }
    urls
}

/// Collect videos, then images (with their live-photo streams), then the
/// cover of a single post object.
fn walk_post(post: &Value, out: &mut Vec<String>) {
    if !post.is_object() {
        return;
    }

    if let Some(video) = post.get("video") {
        if let Some(key) = non_empty_str(video.pointer("/consumer/originVideoKey")) {
            out.push(format!("{VIDEO_HOST_PREFIX}{key}"));
        }
        push_streams(video.pointer("/media/stream/h264"), out);
        if let Some(url) = non_empty_str(video.get("url")) {
            push_url(url, out);
        }
    }

    for image in image_entries(post) {
        if let Some(url) = preferred_image_url(image) {
            push_url(&url, out);
        }
        push_streams(image.pointer("/stream/h264"), out);
    }

    match post.get("cover") {
        Some(Value::String(url)) => push_url(url, out),
        Some(cover @ Value::Object(_)) => {
            if let Some(url) = preferred_image_url(cover) {
                push_url(&url, out);
            }
        }
        _ => {}
    }
}

/// Images of a post: `imageList`, else `images`, else a single `image`.
fn image_entries(post: &Value) -> Vec<&Value> {
    for key in ["imageList", "images"] {
        if let Some(list) = post.get(key).and_then(Value::as_array) {
            if !list.is_empty() {
                return list.iter().collect();
            }
        }
    }
    match post.get("image") {
        Some(image @ (Value::Object(_) | Value::String(_))) => vec![image],
        _ => Vec::new(),
    }
}

fn preferred_image_url(image: &Value) -> Option<String> {
    if let Some(url) = image.as_str().filter(|s| !s.trim().is_empty()) {
        return Some(url.to_string());
    }

    for key in PREFERRED_IMAGE_KEYS {
        if let Some(url) = non_empty_str(image.get(*key)) {
            return Some(url.to_string());
        }
    }

    if let Some(trace_id) = non_empty_str(image.get("traceId")) {
        return Some(format!("{TRACE_IMAGE_HOST_PREFIX}{trace_id}"));
    }

    image
        .get("infoList")
        .and_then(Value::as_array)?
        .iter()
        .find_map(|info| non_empty_str(info.get("url")))
        .map(str::to_string)
}

/// Stream entries are either bare URL strings or objects exposing
/// `masterUrl` or `url`.
fn push_streams(streams: Option<&Value>, out: &mut Vec<String>) {
    let Some(streams) = streams.and_then(Value::as_array) else {
        return;
    };
    for entry in streams {
        let url = match entry {
            Value::String(s) => Some(s.as_str()),
            Value::Object(_) => non_empty_str(entry.get("masterUrl"))
                .or_else(|| non_empty_str(entry.get("url"))),
            _ => None,
        };
        if let Some(url) = url {
            push_url(url, out);
        }
    }
}

fn push_url(url: &str, out: &mut Vec<String>) {
    let url = url.trim();
    if url.is_empty() {
        return;
    }
    if url.starts_with("//") {
        out.push(format!("https:{url}"));
    } else {
        out.push(url.to_string());
    }
}

fn non_empty_str(value: Option<&Value>) -> Option<&str> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_origin_video_key_only() {
        let state = json!({"note": {"video": {"consumer": {"originVideoKey": "v123"}}}});
        assert_eq!(
            collect_state_urls(&state),
            vec!["https://sns-video-bd.xhscdn.com/v123"]
        );
    }

    #[test]
    fn test_post_emission_order() {
        let state = json!({"note": {
            "video": {
                "consumer": {"originVideoKey": "key"},
                "media": {"stream": {"h264": [
                    "https://sns-video-hw.xhscdn.com/stream/a.mp4",
                    {"masterUrl": "https://sns-video-hw.xhscdn.com/stream/b.mp4"},
                    {"url": "https://sns-video-hw.xhscdn.com/stream/c.mp4"},
                    {"other": 1}
                ]}},
                "url": "https://sns-video-hw.xhscdn.com/d.mp4"
            },
            "imageList": [
                {"originUrl": "https://sns-img.xhscdn.com/o1", "urlDefault": "https://ignored"},
                {"urlDefault": "https://sns-img.xhscdn.com/d2",
                 "stream": {"h264": [{"masterUrl": "https://sns-video.xhscdn.com/live2.mp4"}]}},
                {"traceId": "trace3"},
                {"infoList": [{"imageScene": "x"}, {"url": "https://sns-img.xhscdn.com/i4"}]}
            ],
            "cover": {"url": "https://sns-img.xhscdn.com/cover"}
        }});

        assert_eq!(
            collect_state_urls(&state),
            vec![
                "https://sns-video-bd.xhscdn.com/key",
                "https://sns-video-hw.xhscdn.com/stream/a.mp4",
                "https://sns-video-hw.xhscdn.com/stream/b.mp4",
                "https://sns-video-hw.xhscdn.com/stream/c.mp4",
                "https://sns-video-hw.xhscdn.com/d.mp4",
                "https://sns-img.xhscdn.com/o1",
                "https://sns-img.xhscdn.com/d2",
                "https://sns-video.xhscdn.com/live2.mp4",
                "https://sns-img-qc.xhscdn.com/trace3",
                "https://sns-img.xhscdn.com/i4",
                "https://sns-img.xhscdn.com/cover",
            ]
        );
    }

    #[test]
    fn test_images_fallbacks() {
        let images = json!({"images": [{"url": "https://a.xhscdn.com/1"}]});
        assert_eq!(collect_state_urls(&images), vec!["https://a.xhscdn.com/1"]);

        let single = json!({"image": {"urlDefault": "https://a.xhscdn.com/single"}});
        assert_eq!(collect_state_urls(&single), vec!["https://a.xhscdn.com/single"]);

        // An empty imageList does not shadow `images`.
        let empty_list = json!({"imageList": [], "images": ["//a.xhscdn.com/2"]});
        assert_eq!(collect_state_urls(&empty_list), vec!["https://a.xhscdn.com/2"]);
    }

    #[test]
    fn test_note_detail_map_shape() {
        let state = json!({
            "note": {"currentNoteId": "n1"},
            "noteDetailMap": {
                "n1": {"note": {"imageList": [{"originUrl": "https://xx.xhscdn.com/1"}]}},
                "n2": {"imageList": [{"originUrl": "https://xx.xhscdn.com/2"}]}
            }
        });
        assert_eq!(
            collect_state_urls(&state),
            vec!["https://xx.xhscdn.com/1", "https://xx.xhscdn.com/2"]
        );
    }

    #[test]
    fn test_nested_note_detail_map() {
        let state = json!({"note": {"noteDetailMap": {
            "abc": {"note": {"video": {"consumer": {"originVideoKey": "pre/key"}}}}
        }}});
        assert_eq!(
            collect_state_urls(&state),
            vec!["https://sns-video-bd.xhscdn.com/pre/key"]
        );
    }

    #[test]
    fn test_feed_items_shape() {
        let state = json!({"feed": {"items": [
            {"note": {"cover": "https://xx.xhscdn.com/c1"}},
            {"noteCard": {"cover": {"urlDefault": "https://xx.xhscdn.com/c2"}}},
            {"imageList": [{"url": "https://xx.xhscdn.com/c3"}]}
        ]}});
        assert_eq!(
            collect_state_urls(&state),
            vec![
                "https://xx.xhscdn.com/c1",
                "https://xx.xhscdn.com/c2",
                "https://xx.xhscdn.com/c3",
            ]
        );
    }

    #[test]
    fn test_first_non_empty_shape_wins() {
        let state = json!({
            "note": {"imageList": [{"url": "https://xx.xhscdn.com/from-note"}]},
            "noteDetailMap": {"x": {"imageList": [{"url": "https://xx.xhscdn.com/from-map"}]}}
        });
        assert_eq!(
            collect_state_urls(&state),
            vec!["https://xx.xhscdn.com/from-note"]
        );
    }

    #[test]
    fn test_unrecognized_shape_is_empty() {
        assert!(collect_state_urls(&json!({"user": {"name": "x"}})).is_empty());
        assert!(collect_state_urls(&json!([1, 2, 3])).is_empty());
        assert!(collect_state_urls(&Value::Null).is_empty());
    }

    #[test]
    fn test_walk_is_deterministic() {
        let state = json!({"noteDetailMap": {
            "b": {"note": {"imageList": [{"url": "https://xx.xhscdn.com/b"}]}},
            "a": {"note": {"imageList": [{"url": "https://xx.xhscdn.com/a"}]}}
        }});
        let first = collect_state_urls(&state);
        let second = collect_state_urls(&state);
        assert_eq!(first, second);
        assert_eq!(first, vec!["https://xx.xhscdn.com/b", "https://xx.xhscdn.com/a"]);
    }

    #[test]
    fn test_falls_back_to_html() {
        let html = r#"<html><body><img src="https://sns-img.xhscdn.com/abc.jpg"></body></html>"#;
        let state = json!({"user": {}});
        assert_eq!(
            collect_media_urls(Some(&state), html),
            vec!["https://sns-img.xhscdn.com/abc.jpg"]
        );
        assert_eq!(
            collect_media_urls(None, html),
            vec!["https://sns-img.xhscdn.com/abc.jpg"]
        );
    }
}
