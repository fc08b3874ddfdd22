//! Shopify cursor-based pagination via the `Link` response header.
//!
//! Each orders response may carry a `Link` header with URLs for adjacent
//! pages; the cursor is the `page_info` query parameter of the `rel="next"`
//! URL.
//!
//! ## Header format
//!
//! ```text
//! <https://shop.myshopify.com/admin/api/2024-04/orders.json?limit=250&page_info=PREV>; rel="previous",
//! <https://shop.myshopify.com/admin/api/2024-04/orders.json?limit=250&page_info=NEXT>; rel="next"
//! ```

/// Where pagination goes after the current page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageCursor {
    /// No `rel="next"` link was advertised.
    NoMore,
    /// Opaque `page_info` token for the next page.
    Next(String),
}

impl PageCursor {
    /// Derives the cursor from a raw `Link` header value.
    #[must_use]
    pub fn from_link_header(link_header: Option<&str>) -> Self {
        extract_next_cursor(link_header).map_or(PageCursor::NoMore, PageCursor::Next)
    }
}

/// Parses a Shopify `Link` header value and extracts the `page_info` cursor
/// for the next page.
///
/// Returns `None` if there is no header, no `rel="next"` segment, or the
/// next URL has no `page_info` parameter.
#[must_use]
pub fn extract_next_cursor(link_header: Option<&str>) -> Option<String> {
    let header = link_header?;

    for segment in header.split(',') {
        let segment = segment.trim();

        if !segment.contains(r#"rel="next""#) {
            continue;
        }

        let url = extract_angle_bracket_url(segment)?;
        return extract_query_param(url, "page_info");
    }

    None
}

/// Extracts the URL between `<` and `>` in a link directive segment.
fn extract_angle_bracket_url(segment: &str) -> Option<&str> {
    let start = segment.find('<')? + 1;
    let end = segment.find('>')?;
    if start >= end {
        return None;
    }
    Some(&segment[start..end])
}

/// Extracts the value of a named query parameter from a URL string.
///
/// No percent-decoding: `page_info` tokens are base64url.
fn extract_query_param(url: &str, param: &str) -> Option<String> {
    let query_start = url.find('?')? + 1;
    let query = &url[query_start..];

    let needle = format!("{param}=");
    for pair in query.split('&') {
        if let Some(value) = pair.strip_prefix(needle.as_str()) {
            let value = value.split('#').next().unwrap_or(value);
            if !value.is_empty() {
                return Some(value.to_owned());
            }
        }
    }
    None
}
