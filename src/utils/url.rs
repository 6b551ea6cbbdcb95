//! URL helpers shared by the HTTP client and the transcript renderer.

/// Remove trailing slashes so endpoint joins never produce `//`.
///
/// ```
/// use financi::utils::url::normalize_base_url;
///
/// assert_eq!(normalize_base_url("http://localhost:8080/"), "http://localhost:8080");
/// ```
pub fn normalize_base_url(base_url: &str) -> String {
    base_url.trim().trim_end_matches('/').to_string()
}

/// Join a service root and a relative path with exactly one slash.
///
/// Used both for API endpoints (`api/query`) and for service-relative static
/// resources such as `/visualizations/visualization_1.png`.
///
/// ```
/// use financi::utils::url::construct_api_url;
///
/// assert_eq!(
///     construct_api_url("http://localhost:8080/", "/api/query"),
///     "http://localhost:8080/api/query"
/// );
/// ```
pub fn construct_api_url(base_url: &str, endpoint: &str) -> String {
    let normalized_base = normalize_base_url(base_url);
    let endpoint = endpoint.trim().trim_start_matches('/');
    format!("{}/{}", normalized_base, endpoint)
}

/// Drop an `http://` or `https://` scheme, case-insensitively.
pub fn strip_scheme(url: &str) -> &str {
    for scheme in ["https://", "http://"] {
        if url.len() >= scheme.len()
            && url.is_char_boundary(scheme.len())
            && url[..scheme.len()].eq_ignore_ascii_case(scheme)
        {
            return &url[scheme.len()..];
        }
    }
    url
}

/// True for values that look like an absolute web link.
pub fn has_http_scheme(url: &str) -> bool {
    url.trim_start()
        .get(..4)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("http"))
}
