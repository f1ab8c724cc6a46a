use error_stack::Report;

use crate::error::AdapterError;

/// Characters `encodeURIComponent` leaves untouched besides ASCII alphanumerics.
const COMPONENT_UNESCAPED: &str = "-_.!~*'()";

/// Characters `encodeURI` additionally leaves untouched (reserved URI syntax).
const URI_RESERVED: &str = ";,/?:@&=+$#";

/// Percent-encode every character of `value` for which `keep` is false.
fn encode_with(value: &str, keep: impl Fn(char) -> bool) -> String {
    let mut out = String::with_capacity(value.len());
    let mut buf = [0u8; 4];
    for c in value.chars() {
        if keep(c) {
            out.push(c);
        } else {
            out.push_str(&urlencoding::encode(c.encode_utf8(&mut buf)));
        }
    }
    out
}

/// Encode a query-string value the way `encodeURIComponent` does.
#[must_use]
pub fn encode_uri_component(value: &str) -> String {
    encode_with(value, |c| {
        c.is_ascii_alphanumeric() || COMPONENT_UNESCAPED.contains(c)
    })
}

/// Encode a whole URL the way `encodeURI` does, keeping its reserved syntax.
#[must_use]
pub fn encode_uri(value: &str) -> String {
    encode_with(value, |c| {
        c.is_ascii_alphanumeric() || COMPONENT_UNESCAPED.contains(c) || URI_RESERVED.contains(c)
    })
}

/// Append `key=value&` to `query` when `value` is non-empty.
///
/// The value is percent-encoded; the key is used verbatim. Empty values are
/// skipped so optional parameters never show up as `key=`.
#[must_use]
pub fn try_append_query_string(mut query: String, key: &str, value: &str) -> String {
    if value.is_empty() {
        return query;
    }
    query.push_str(key);
    query.push('=');
    query.push_str(&encode_uri_component(value));
    query.push('&');
    query
}

/// Join an endpoint and an accumulated query string into a request URL.
///
/// A trailing `&` left by [`try_append_query_string`] is dropped.
#[must_use]
pub fn join_query(endpoint: &str, query: &str) -> String {
    let query = query.trim_end_matches('&');
    if query.is_empty() {
        return endpoint.to_string();
    }
    let separator = if endpoint.contains('?') { '&' } else { '?' };
    format!("{endpoint}{separator}{query}")
}

/// Build hidden 1x1 tracking pixel markup for `url`.
///
/// Any non-empty URL is accepted, relative ones included; it is escaped with
/// [`encode_uri`] so it cannot break out of the attribute.
///
/// # Errors
///
/// Returns [`AdapterError::TrackingPixel`] when `url` is empty.
pub fn create_track_pixel_html(url: &str) -> Result<String, Report<AdapterError>> {
    if url.trim().is_empty() {
        return Err(Report::new(AdapterError::TrackingPixel {
            message: "empty url".to_string(),
        }));
    }
    let src = encode_uri(url);
    Ok(format!(
        "<div style=\"position:absolute;left:0px;top:0px;visibility:hidden;\"><img src=\"{src}\"></div>"
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_try_append_query_string_encodes_values() {
        let query = try_append_query_string(String::new(), "asi", "a b&c");
        assert_eq!(query, "asi=a%20b%26c&");

        let query = try_append_query_string(query, "skt", "5");
        assert_eq!(query, "asi=a%20b%26c&skt=5&");
    }

    #[test]
    fn test_try_append_query_string_skips_empty() {
        let query = try_append_query_string("asi=1&".to_string(), "prebid_id", "");
        assert_eq!(query, "asi=1&");
    }

    #[test]
    fn test_encode_uri_component_keeps_unreserved_marks() {
        assert_eq!(encode_uri_component("a!b'c(d)e*f~g"), "a!b'c(d)e*f~g");
        assert_eq!(encode_uri_component("a/b?c=d"), "a%2Fb%3Fc%3Dd");
        assert_eq!(encode_uri_component("広告"), "%E5%BA%83%E5%91%8A");
    }

    #[test]
    fn test_encode_uri_keeps_reserved_syntax() {
        assert_eq!(
            encode_uri("https://t.example/p?a=1&b=(x)#f"),
            "https://t.example/p?a=1&b=(x)#f"
        );
        assert_eq!(encode_uri("/imp?q=a b"), "/imp?q=a%20b");
        assert_eq!(encode_uri("x\"y<z>"), "x%22y%3Cz%3E");
    }

    #[test]
    fn test_join_query() {
        assert_eq!(
            join_query("https://x.example/bid", "a=1&b=2&"),
            "https://x.example/bid?a=1&b=2"
        );
        assert_eq!(
            join_query("https://x.example/bid?v=1", "a=1&"),
            "https://x.example/bid?v=1&a=1"
        );
        assert_eq!(
            join_query("https://x.example/bid", ""),
            "https://x.example/bid"
        );
    }

    #[test]
    fn test_create_track_pixel_html() {
        let html = create_track_pixel_html("http://t.example/px").expect("valid url");
        assert_eq!(
            html,
            "<div style=\"position:absolute;left:0px;top:0px;visibility:hidden;\"><img src=\"http://t.example/px\"></div>"
        );
    }

    #[test]
    fn test_create_track_pixel_html_accepts_relative_urls() {
        let html = create_track_pixel_html("//t.example/px?id=1").expect("protocol-relative");
        assert!(html.contains("src=\"//t.example/px?id=1\""));

        let html = create_track_pixel_html("/imp?x=1").expect("path-relative");
        assert!(html.contains("src=\"/imp?x=1\""));
    }

    #[test]
    fn test_create_track_pixel_html_escapes_quotes() {
        let html = create_track_pixel_html("https://t.example/p\"x").expect("valid url");
        assert!(html.contains("src=\"https://t.example/p%22x\""));
    }

    #[test]
    fn test_create_track_pixel_html_rejects_empty() {
        assert!(create_track_pixel_html("").is_err());
        assert!(create_track_pixel_html("   ").is_err());
    }
}
