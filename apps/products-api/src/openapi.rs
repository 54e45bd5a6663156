//! OpenAPI documentation configuration

use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Products API",
        version = "0.1.0",
        description = "Product catalog with CRUD operations and paginated keyword search",
        license(name = "MIT")
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development server")
    ),
    components(
        schemas(axum_helpers::ErrorResponse, axum_helpers::HealthResponse)
    )
)]
struct BaseApiDoc;

/// Combined OpenAPI documentation for Products API
///
/// Product paths are mounted at the root, so the domain document is merged
/// rather than nested.
pub struct ApiDoc;

impl OpenApi for ApiDoc {
    fn openapi() -> utoipa::openapi::OpenApi {
        let mut doc = BaseApiDoc::openapi();
        doc.merge(domain_products::ApiDoc::openapi());
        doc
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_lists_catalog_paths() {
        let doc = ApiDoc::openapi();

        for path in [
            "/addProduct",
            "/addProducts",
            "/products",
            "/products/search",
            "/productById/{id}",
            "/product/{name}",
            "/update",
            "/delete/{id}",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
        assert_eq!(doc.info.title, "Products API");
    }
}
