//! API-spec resource detection
//!
//! Non-HTML responses get matched against known machine-readable spec
//! signatures. Detection is URL-pattern based and runs on the lowercased
//! URL path only, never the body.

use url::Url;

use crate::output::SpecKind;

/// Detects the spec type of a resource from its URL
///
/// Returns None for resources that look like plain assets rather than API
/// descriptions.
pub fn detect_spec_kind(url: &str) -> Option<SpecKind> {
    let path = match Url::parse(url) {
        Ok(parsed) => parsed.path().to_lowercase(),
        Err(_) => url.to_lowercase(),
    };

    // OpenAPI and its swagger-era spelling
    if path.contains("openapi") || path.contains("swagger") {
        return Some(SpecKind::Openapi);
    }

    // GraphQL schema files and schema endpoints
    if path.ends_with(".graphql")
        || path.ends_with(".graphqls")
        || path.ends_with(".gql")
        || path.ends_with("/graphql")
    {
        return Some(SpecKind::Graphql);
    }

    // JSON Schema documents
    if path.ends_with(".schema.json")
        || path.contains("json-schema")
        || path.contains("jsonschema")
    {
        return Some(SpecKind::JsonSchema);
    }

    None
}
