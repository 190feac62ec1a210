use std::collections::HashSet;

use regex::Regex;
use scraper::{Html, Selector};

use crate::constants::{is_media_extension, IMAGE_CDN_MARKER};

static BARE_URL: std::sync::LazyLock<Regex> = std::sync::LazyLock::new(|| {
    Regex::new(r#"(?i)(?:https?:)?//[^\s"'<>()\\]+"#).unwrap()
});

static IMG_SELECTOR: std::sync::LazyLock<Selector> =
    std::sync::LazyLock::new(|| Selector::parse("img[src]").unwrap());

/// Scan raw HTML for media URLs.
///
/// Collects `<img src>` values followed by bare URLs whose path ends in a
/// media extension. An `<img>` source is also kept when it is hosted on the
/// platform CDN. Duplicates are dropped, first occurrence wins.
#[must_use]
pub fn scan_html(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    let img_sources = document
        .select(&IMG_SELECTOR)
        .filter_map(|img| img.value().attr("src"))
        .map(str::to_string)
        .collect::<Vec<_>>();

    let img_urls = img_sources
        .iter()
        .map(|src| absolutize(src))
        .filter(|url| {
            is_http(url) && (url.contains(IMAGE_CDN_MARKER) || has_media_extension(url))
        });

    let bare_urls = BARE_URL
        .find_iter(html)
        .map(|m| absolutize(m.as_str().trim_end_matches([',', ';', '.'])))
        .filter(|url| is_http(url) && has_media_extension(url));

    let mut seen = HashSet::new();
    img_urls
        .chain(bare_urls)
        .filter(|candidate| seen.insert(candidate.clone()))
        .collect()
}

fn absolutize(candidate: &str) -> String {
    let candidate = candidate.trim();
    if candidate.starts_with("//") {
        format!("https:{candidate}")
    } else {
        candidate.to_string()
    }
}

fn is_http(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

/// Returns true if the URL path (ignoring query and fragment) ends in a
/// known media extension.
fn has_media_extension(url: &str) -> bool {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    path.rsplit_once('.')
        .is_some_and(|(_, ext)| !ext.contains('/') && is_media_extension(ext))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recovers_cdn_img_tags_only() {
        let html = r#"
            <html><body>
                <img src="https://sns-img-qc.xhscdn.com/202401/a/img.jpg">
                <img src="https://sns-img-hw.xhscdn.com/202401/b/img.jpg" alt="second">
                <p>Some text https://example.com/about and more</p>
                <img src="/static/logo.svg">
                <img src="data:image/gif;base64,R0lGODlhAQABAAAAACw=">
                <img src="https://sns-img-bd.xhscdn.com/202401/c/img.jpg">
            </body></html>
        "#;

        assert_eq!(
            scan_html(html),
            vec![
                "https://sns-img-qc.xhscdn.com/202401/a/img.jpg",
                "https://sns-img-hw.xhscdn.com/202401/b/img.jpg",
                "https://sns-img-bd.xhscdn.com/202401/c/img.jpg",
            ]
        );
    }

    #[test]
    fn test_bare_media_urls() {
        let html = r#"<script>var poster = "https://cdn.example.com/p/poster.webp"; var v = '//sns-video-bd.xhscdn.com/clip.mp4';</script>"#;
        assert_eq!(
            scan_html(html),
            vec![
                "https://cdn.example.com/p/poster.webp",
                "https://sns-video-bd.xhscdn.com/clip.mp4",
            ]
        );
    }

    #[test]
    fn test_cdn_img_without_extension() {
        let html = r#"<img src="https://sns-webpic-qc.xhscdn.com/202401/abc/token!nd_dft_wlteh_webp_3">"#;
        assert_eq!(
            scan_html(html),
            vec!["https://sns-webpic-qc.xhscdn.com/202401/abc/token!nd_dft_wlteh_webp_3"]
        );
    }

    #[test]
    fn test_media_extension_check() {
        assert!(has_media_extension("https://a.com/x.JPG"));
        assert!(has_media_extension("https://a.com/x.mp4?sign=1"));
        assert!(!has_media_extension("https://a.com/x.svg"));
        assert!(!has_media_extension("https://a.com.cn/path"));
    }

    #[test]
    fn test_urls_with_query_or_trailing_path_are_not_truncated() {
        let html = r#"
            <img src="https://sns-img-qc.xhscdn.com/p/1/img.jpg?imageView2/2/w/1080">
            <img src="https://cdn.example.com/a/photo.png/thumb">
            <script>var next = "https://cdn.example.com/b/clip.mp4?sign=abc&t=1";</script>
            <p>see https://cdn.example.com/c/pic.gif, or https://cdn.example.com/c/page</p>
        "#;
        assert_eq!(
            scan_html(html),
            vec![
                "https://sns-img-qc.xhscdn.com/p/1/img.jpg?imageView2/2/w/1080",
                "https://cdn.example.com/b/clip.mp4?sign=abc&t=1",
                "https://cdn.example.com/c/pic.gif",
            ]
        );
    }

    #[test]
    fn test_empty_page() {
        assert!(scan_html("").is_empty());
    }
}
