//! HTTP handlers for Products API

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{delete, get, post, put},
    Json, Router,
};
use axum_helpers::{
    errors::responses::{
        BadRequestIdResponse, BadRequestResponse, BadRequestValidationResponse,
        InternalServerErrorResponse, NotFoundResponse,
    },
    AppError, AuditEvent, AuditOutcome, IdPath, ValidatedJson,
};
use std::sync::Arc;
use utoipa::OpenApi;

use crate::error::ProductResult;
use crate::models::{
    CreateProduct, DeleteResponse, Product, SearchParams, SearchResult, SortField, UpdateProduct,
};
use crate::repository::ProductRepository;
use crate::service::ProductService;

/// OpenAPI documentation for Products API
#[derive(OpenApi)]
#[openapi(
    paths(
        add_product,
        add_products,
        list_products,
        get_product,
        get_product_by_name,
        update_product,
        delete_product,
        search_products,
    ),
    components(
        schemas(Product, CreateProduct, UpdateProduct, SearchResult, DeleteResponse, SortField),
        responses(
            NotFoundResponse,
            BadRequestResponse,
            BadRequestValidationResponse,
            BadRequestIdResponse,
            InternalServerErrorResponse
        )
    ),
    tags(
        (name = "Products", description = "Product catalog endpoints")
    )
)]
pub struct ApiDoc;

/// Create the products router with all HTTP endpoints
pub fn router<R: ProductRepository + 'static>(service: ProductService<R>) -> Router {
    let shared_service = Arc::new(service);

    Router::new()
        .route("/addProduct", post(add_product))
        .route("/addProducts", post(add_products))
        .route("/products", get(list_products))
        .route("/products/search", get(search_products))
        .route("/productById/{id}", get(get_product))
        .route("/product/{name}", get(get_product_by_name))
        .route("/update", put(update_product))
        .route("/delete/{id}", delete(delete_product))
        .with_state(shared_service)
}

fn audit_event<T>(
    action: &str,
    result: &ProductResult<T>,
    resource: Option<String>,
    headers: &HeaderMap,
) -> AuditEvent {
    let outcome = if result.is_ok() {
        AuditOutcome::Success
    } else {
        AuditOutcome::Failure
    };
    AuditEvent::new(action, resource, outcome).with_request_headers(headers)
}

/// Create a product; the store assigns its id
#[utoipa::path(
    post,
    path = "/addProduct",
    tag = "Products",
    request_body = CreateProduct,
    responses(
        (status = 201, description = "Product created successfully", body = Product),
        (status = 400, response = BadRequestValidationResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn add_product<R: ProductRepository>(
    State(service): State<Arc<ProductService<R>>>,
    headers: HeaderMap,
    ValidatedJson(input): ValidatedJson<CreateProduct>,
) -> Result<impl IntoResponse, AppError> {
    let result = service.add_product(input).await;
    let resource = result.as_ref().ok().map(|p| format!("product:{}", p.id));
    audit_event("product.create", &result, resource, &headers).log();

    Ok((StatusCode::CREATED, Json(result?)))
}

/// Create several products at once; nothing is stored if any entry is invalid
#[utoipa::path(
    post,
    path = "/addProducts",
    tag = "Products",
    request_body = Vec<CreateProduct>,
    responses(
        (status = 201, description = "Products created successfully", body = Vec<Product>),
        (status = 400, response = BadRequestResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn add_products<R: ProductRepository>(
    State(service): State<Arc<ProductService<R>>>,
    headers: HeaderMap,
    payload: Result<Json<Vec<CreateProduct>>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(inputs) = payload?;
    let count = inputs.len();

    let result = service.add_products(inputs).await;
    audit_event("product.create_many", &result, None, &headers)
        .with_details(serde_json::json!({ "count": count }))
        .log();

    Ok((StatusCode::CREATED, Json(result?)))
}

/// List every product, ascending by id
#[utoipa::path(
    get,
    path = "/products",
    tag = "Products",
    responses(
        (status = 200, description = "All products", body = Vec<Product>),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn list_products<R: ProductRepository>(
    State(service): State<Arc<ProductService<R>>>,
) -> Result<Json<Vec<Product>>, AppError> {
    let products = service.list_products().await?;
    Ok(Json(products))
}

/// Get a product by ID
#[utoipa::path(
    get,
    path = "/productById/{id}",
    tag = "Products",
    params(
        ("id" = i32, Path, description = "Product ID")
    ),
    responses(
        (status = 200, description = "Product found", body = Product),
        (status = 400, response = BadRequestIdResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn get_product<R: ProductRepository>(
    State(service): State<Arc<ProductService<R>>>,
    IdPath(id): IdPath,
) -> Result<Json<Product>, AppError> {
    let product = service.get_product(id).await?;
    Ok(Json(product))
}

/// Get a product by exact name
#[utoipa::path(
    get,
    path = "/product/{name}",
    tag = "Products",
    params(
        ("name" = String, Path, description = "Exact, case-sensitive product name")
    ),
    responses(
        (status = 200, description = "Product found", body = Product),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn get_product_by_name<R: ProductRepository>(
    State(service): State<Arc<ProductService<R>>>,
    Path(name): Path<String>,
) -> Result<Json<Product>, AppError> {
    let product = service.get_product_by_name(&name).await?;
    Ok(Json(product))
}

/// Update the product identified by the `id` in the body
#[utoipa::path(
    put,
    path = "/update",
    tag = "Products",
    request_body = UpdateProduct,
    responses(
        (status = 200, description = "Product updated successfully", body = Product),
        (status = 400, response = BadRequestValidationResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn update_product<R: ProductRepository>(
    State(service): State<Arc<ProductService<R>>>,
    headers: HeaderMap,
    ValidatedJson(input): ValidatedJson<UpdateProduct>,
) -> Result<Json<Product>, AppError> {
    let resource = Some(format!("product:{}", input.id));
    let result = service.update_product(input).await;
    audit_event("product.update", &result, resource, &headers).log();

    Ok(Json(result?))
}

/// Delete a product by ID
#[utoipa::path(
    delete,
    path = "/delete/{id}",
    tag = "Products",
    params(
        ("id" = i32, Path, description = "Product ID")
    ),
    responses(
        (status = 200, description = "Product deleted", body = DeleteResponse),
        (status = 400, response = BadRequestIdResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn delete_product<R: ProductRepository>(
    State(service): State<Arc<ProductService<R>>>,
    headers: HeaderMap,
    IdPath(id): IdPath,
) -> Result<Json<DeleteResponse>, AppError> {
    let result = service.delete_product(id).await;
    audit_event("product.delete", &result, Some(format!("product:{id}")), &headers).log();

    result?;
    Ok(Json(DeleteResponse::new(id)))
}

/// Paginated keyword search over product names
#[utoipa::path(
    get,
    path = "/products/search",
    tag = "Products",
    params(SearchParams),
    responses(
        (status = 200, description = "One page of matching products", body = SearchResult),
        (status = 400, response = BadRequestResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn search_products<R: ProductRepository>(
    State(service): State<Arc<ProductService<R>>>,
    params: Result<Query<SearchParams>, QueryRejection>,
) -> Result<Json<SearchResult>, AppError> {
    let Query(params) = params?;

    let result = service
        .search(params)
        .await
        .map_err(|e| e.into_search_failure())?;
    Ok(Json(result))
}
