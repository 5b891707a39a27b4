//! Content extraction: fetch a URL and reduce it to a bounded plain-text
//! excerpt.
//!
//! The `ContentExtractor` trait is infallible by contract: every fetch,
//! decode, or parse failure becomes an `ExtractedContent` with a non-Ok
//! status and a diagnostic message body, so one bad URL can never abort
//! the batch it belongs to.

use crate::config::FetchConfig;
use crate::error::ConfigError;
use crate::types::ExtractedContent;
use async_trait::async_trait;
use encoding_rs::Encoding;
use std::time::Duration;

/// Trait for per-URL content extraction.
#[async_trait]
pub trait ContentExtractor: Send + Sync {
    /// Fetch one URL and extract its paragraph text. Always completes.
    async fn extract(&self, url: &str) -> ExtractedContent;
}

/// HTTP content extractor backed by a shared `reqwest` client.
///
/// The client (and its connection pool) is reused across all fetches of
/// a run.
pub struct HttpContentExtractor {
    client: reqwest::Client,
    timeout_secs: u64,
}

impl HttpContentExtractor {
    pub fn new(config: &FetchConfig) -> Result<Self, ConfigError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .build()
            .map_err(|e| ConfigError::Invalid {
                message: format!("failed to build fetch client: {e}"),
            })?;

        Ok(Self {
            client,
            timeout_secs: config.timeout_secs,
        })
    }
}

#[async_trait]
impl ContentExtractor for HttpContentExtractor {
    async fn extract(&self, url: &str) -> ExtractedContent {
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return ExtractedContent::failed(url, "unsupported URL scheme");
        }

        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(e) if e.is_timeout() => {
                tracing::debug!(url = url, "fetch timed out");
                return ExtractedContent::failed(
                    url,
                    format!("request timed out after {}s", self.timeout_secs),
                );
            }
            Err(e) => {
                tracing::debug!(url = url, error = %e, "fetch failed");
                return ExtractedContent::failed(url, format!("request failed: {e}"));
            }
        };

        let status = response.status();
        if !status.is_success() {
            return ExtractedContent::failed(
                url,
                format!("unable to fetch content: HTTP {status}"),
            );
        }

        let charset = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .and_then(charset_from_content_type);

        let bytes = match response.bytes().await {
            Ok(bytes) => bytes,
            Err(e) => {
                return ExtractedContent::failed(url, format!("failed to read body: {e}"));
            }
        };

        let html = decode_bytes(&bytes, charset.as_deref());
        let text = extract_paragraph_text(&html);

        if text.is_empty() {
            ExtractedContent::empty(url)
        } else {
            ExtractedContent::ok(url, text)
        }
    }
}

/// Pull the charset parameter out of a Content-Type header value.
fn charset_from_content_type(value: &str) -> Option<String> {
    value.split(';').find_map(|part| {
        part.trim()
            .to_ascii_lowercase()
            .strip_prefix("charset=")
            .map(|cs| cs.trim_matches('"').to_string())
    })
}

/// Decode raw bytes to text: declared charset, then BOM sniffing, then
/// UTF-8. Decoding is lossy; malformed bytes become replacement
/// characters, never errors.
fn decode_bytes(bytes: &[u8], declared: Option<&str>) -> String {
    let encoding = declared
        .and_then(|label| Encoding::for_label(label.as_bytes()))
        .or_else(|| Encoding::for_bom(bytes).map(|(encoding, _)| encoding))
        .unwrap_or(encoding_rs::UTF_8);

    let (text, _, _) = encoding.decode(bytes);
    text.into_owned()
}

/// Extract the visible text of `<p>` elements from an HTML document.
///
/// Script and style content is skipped even inside a paragraph, entities
/// are decoded, whitespace is collapsed, and the paragraph fragments are
/// joined with single spaces. Everything outside paragraphs (headings,
/// navigation, lists) is ignored.
fn extract_paragraph_text(html: &str) -> String {
    let mut paragraphs: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut in_paragraph = false;
    let mut in_script = false;
    let mut in_style = false;
    let mut in_tag = false;
    let mut tag = String::new();

    for ch in html.chars() {
        if ch == '<' {
            in_tag = true;
            tag.clear();
            continue;
        }
        if ch == '>' && in_tag {
            in_tag = false;
            let (closing, name) = parse_tag(&tag);
            match name.as_str() {
                "script" => in_script = !closing,
                "style" => in_style = !closing,
                // An opening <p> while a paragraph is unclosed implicitly
                // terminates the previous one.
                "p" => {
                    flush_paragraph(&mut current, &mut paragraphs);
                    in_paragraph = !closing;
                }
                _ => {}
            }
            continue;
        }
        if in_tag {
            tag.push(ch);
            continue;
        }
        if in_script || in_style || !in_paragraph {
            continue;
        }
        current.push(ch);
    }
    flush_paragraph(&mut current, &mut paragraphs);

    paragraphs.join(" ")
}

/// Split a raw tag body into (is_closing, lowercase element name).
///
/// `"/P"` -> `(true, "p")`, `"p class=\"intro\""` -> `(false, "p")`.
/// Exact name matching avoids confusing `<p>` with `<pre>` or `<param>`.
fn parse_tag(raw: &str) -> (bool, String) {
    let trimmed = raw.trim();
    let (closing, rest) = match trimmed.strip_prefix('/') {
        Some(rest) => (true, rest),
        None => (false, trimmed),
    };
    let name: String = rest
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_ascii_lowercase();
    (closing, name)
}

fn flush_paragraph(current: &mut String, paragraphs: &mut Vec<String>) {
    let decoded = decode_entities(current);
    let collapsed = decoded.split_whitespace().collect::<Vec<_>>().join(" ");
    if !collapsed.is_empty() {
        paragraphs.push(collapsed);
    }
    current.clear();
}

/// Decode the handful of HTML entities that matter for prose.
fn decode_entities(text: &str) -> String {
    text.replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&nbsp;", " ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{FetchStatus, MAX_EXTRACT_CHARS};

    #[test]
    fn test_extract_paragraphs_only() {
        let html = r#"
        <html><body>
            <h1>Big Headline</h1>
            <nav>Home | About</nav>
            <p>First paragraph.</p>
            <div>Div content is skipped.</div>
            <p>Second <b>paragraph</b> here.</p>
            <ul><li>List item</li></ul>
        </body></html>"#;

        let text = extract_paragraph_text(html);
        assert_eq!(text, "First paragraph. Second paragraph here.");
    }

    #[test]
    fn test_extract_skips_script_and_style() {
        let html = r#"
            <p>Before.</p>
            <script>var p = "<p>not text</p>";</script>
            <style>p { color: red; }</style>
            <p>After.</p>"#;

        let text = extract_paragraph_text(html);
        assert!(text.contains("Before."));
        assert!(text.contains("After."));
        assert!(!text.contains("color"));
        assert!(!text.contains("var"));
    }

    #[test]
    fn test_extract_does_not_confuse_pre_with_p() {
        let html = "<pre>raw code block</pre><p>prose</p>";
        assert_eq!(extract_paragraph_text(html), "prose");
    }

    #[test]
    fn test_extract_handles_unclosed_paragraphs() {
        let html = "<p>one<p>two</p>";
        assert_eq!(extract_paragraph_text(html), "one two");
    }

    #[test]
    fn test_extract_decodes_entities() {
        let html = "<p>A &amp; B &lt;tag&gt; &quot;quoted&quot; it&#39;s&nbsp;here</p>";
        assert_eq!(
            extract_paragraph_text(html),
            "A & B <tag> \"quoted\" it's here"
        );
    }

    #[test]
    fn test_extract_collapses_whitespace() {
        let html = "<p>  spaced\n\n   out\ttext  </p>";
        assert_eq!(extract_paragraph_text(html), "spaced out text");
    }

    #[test]
    fn test_extract_uppercase_tags() {
        let html = "<P>Shouted paragraph.</P>";
        assert_eq!(extract_paragraph_text(html), "Shouted paragraph.");
    }

    #[test]
    fn test_extract_empty_document() {
        assert_eq!(extract_paragraph_text("<html><body></body></html>"), "");
    }

    #[test]
    fn test_charset_from_content_type() {
        assert_eq!(
            charset_from_content_type("text/html; charset=ISO-8859-1"),
            Some("iso-8859-1".to_string())
        );
        assert_eq!(
            charset_from_content_type("text/html; charset=\"utf-8\""),
            Some("utf-8".to_string())
        );
        assert_eq!(charset_from_content_type("text/html"), None);
    }

    #[test]
    fn test_decode_bytes_declared_latin1() {
        // "café" in ISO-8859-1
        let bytes = [0x63, 0x61, 0x66, 0xe9];
        assert_eq!(decode_bytes(&bytes, Some("iso-8859-1")), "café");
    }

    #[test]
    fn test_decode_bytes_bom_sniffing() {
        // UTF-8 BOM followed by "hi"
        let bytes = [0xef, 0xbb, 0xbf, b'h', b'i'];
        assert_eq!(decode_bytes(&bytes, None), "hi");
    }

    #[test]
    fn test_decode_bytes_invalid_utf8_is_lossy() {
        let bytes = [b'o', b'k', 0xff, 0xfe, b'!'];
        let text = decode_bytes(&bytes, Some("utf-8"));
        assert!(text.starts_with("ok"));
        assert!(text.ends_with('!'));
    }

    #[test]
    fn test_extraction_respects_char_cap() {
        let body = "word ".repeat(2000);
        let html = format!("<p>{body}</p>");
        let content = ExtractedContent::ok("https://example.com", extract_paragraph_text(&html));
        assert!(content.text.chars().count() <= MAX_EXTRACT_CHARS);
    }

    #[tokio::test]
    async fn test_extract_rejects_non_http_scheme() {
        let extractor = HttpContentExtractor::new(&FetchConfig::default()).unwrap();
        let content = extractor.extract("ftp://example.com/file").await;
        assert_eq!(content.status, FetchStatus::Failed);
        assert!(content.text.contains("scheme"));
    }
}
