use axum::http::{header, HeaderValue, Method};
use tower_http::cors::{AllowOrigin, CorsLayer};

pub const DEFAULT_ALLOWED_ORIGIN: &str = "http://localhost:3000";

/// Origins the CORS policy admits, and whether they came from the fallback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedOrigins {
    pub origins: Vec<HeaderValue>,
    pub fell_back: bool,
}

/// Parse a comma-separated `ALLOWED_ORIGINS` value. Unset, blank or
/// entirely unusable input falls back to the local development origin.
pub fn resolve_origins(raw: Option<&str>) -> ResolvedOrigins {
    let origins: Vec<HeaderValue> = raw
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .filter(|&origin| {
            // A wildcard cannot be combined with credentialed requests.
            if origin == "*" {
                tracing::warn!("Ignoring wildcard CORS origin; list origins explicitly");
            }
            origin != "*"
        })
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    if origins.is_empty() {
        tracing::info!(
            default = DEFAULT_ALLOWED_ORIGIN,
            "ALLOWED_ORIGINS not set, using default"
        );
        return ResolvedOrigins {
            origins: vec![HeaderValue::from_static(DEFAULT_ALLOWED_ORIGIN)],
            fell_back: true,
        };
    }

    ResolvedOrigins {
        origins,
        fell_back: false,
    }
}

/// Credentialed CORS policy for the browser front-end.
pub fn cors_layer(resolved: ResolvedOrigins) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(resolved.origins))
        .allow_headers([
            header::ORIGIN,
            header::CONTENT_TYPE,
            header::ACCEPT,
            header::AUTHORIZATION,
        ])
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_credentials(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_override_falls_back_to_local_origin() {
        for raw in [None, Some(""), Some("  ,  ")] {
            let resolved = resolve_origins(raw);
            assert!(resolved.fell_back, "{raw:?}");
            assert_eq!(resolved.origins, vec![HeaderValue::from_static(DEFAULT_ALLOWED_ORIGIN)]);
        }
    }

    #[test]
    fn wildcard_origin_is_dropped_instead_of_breaking_the_layer() {
        let resolved = resolve_origins(Some("*"));
        assert!(resolved.fell_back);
        assert_eq!(resolved.origins, vec![HeaderValue::from_static(DEFAULT_ALLOWED_ORIGIN)]);
        let _layer = cors_layer(resolved);

        let resolved = resolve_origins(Some("https://app.zapmanejo.com, *"));
        assert!(!resolved.fell_back);
        assert_eq!(
            resolved.origins,
            vec![HeaderValue::from_static("https://app.zapmanejo.com")]
        );
        let _layer = cors_layer(resolved);
    }

    #[test]
    fn override_list_is_trimmed() {
        let resolved = resolve_origins(Some("https://app.zapmanejo.com, http://localhost:5173"));
        assert!(!resolved.fell_back);
        assert_eq!(
            resolved.origins,
            vec![
                HeaderValue::from_static("https://app.zapmanejo.com"),
                HeaderValue::from_static("http://localhost:5173"),
            ]
        );
    }
}
