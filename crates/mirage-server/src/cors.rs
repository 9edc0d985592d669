use http::{Method, header, header::HeaderName};
use mirage_config::{CorsConfig, Origins};
use tower_http::cors::{AllowOrigin, CorsLayer};

/// Build a Tower CORS layer from configuration
///
/// Browsers reject a literal `*` origin on credentialed requests, so "any
/// origin" with credentials mirrors the request origin instead.
pub fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let mut layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::RANGE]);

    layer = match (&config.origins, config.credentials) {
        (Origins::Any, false) => layer.allow_origin(AllowOrigin::any()),
        (Origins::Any, true) => layer.allow_origin(AllowOrigin::mirror_request()),
        (Origins::List(origins), _) => {
            let origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();
            layer.allow_origin(origins)
        }
    };

    if !config.expose_headers.is_empty() {
        let headers: Vec<HeaderName> = config.expose_headers.iter().filter_map(|h| h.parse().ok()).collect();
        layer = layer.expose_headers(headers);
    }

    if config.credentials {
        layer = layer.allow_credentials(true);
    }

    if let Some(duration) = config.max_age_duration() {
        layer = layer.max_age(duration);
    }

    layer
}
