use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "presence API",
        version = "0.1.0",
        description = "Resolves company sites into app-store and LinkedIn presence records."
    ),
    paths(crate::routes::resolve, crate::routes::health),
    components(schemas(
        crate::dto::ResolveRequest,
        crate::dto::ResolveResponse,
        crate::dto::HealthResponse,
        crate::dto::ErrorResponse,
    )),
    tags(
        (name = "resolve", description = "Company presence lookups"),
        (name = "system", description = "Health and system status"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_both_paths() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/v1/resolve"));
        assert!(doc.paths.paths.contains_key("/health"));
    }
}
