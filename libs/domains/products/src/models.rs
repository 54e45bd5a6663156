use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

/// Page size used when a search request omits `size`
pub const DEFAULT_PAGE_SIZE: u64 = 10;

/// Larger requested page sizes are clamped to this value
pub const MAX_PAGE_SIZE: u64 = 100;

/// Product entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Product {
    /// Store-assigned identifier, immutable after creation
    pub id: i32,
    pub name: String,
    pub quantity: i32,
    pub price: f64,
}

/// DTO for creating a new product.
///
/// Any `id` in the request body is ignored; the store assigns ids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateProduct {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[validate(range(min = 0))]
    #[serde(default)]
    pub quantity: i32,
    #[validate(range(min = 0.0))]
    #[serde(default)]
    pub price: f64,
}

/// DTO for replacing the mutable fields of an existing product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateProduct {
    /// Product to update
    pub id: i32,
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[validate(range(min = 0))]
    #[serde(default)]
    pub quantity: i32,
    #[validate(range(min = 0.0))]
    #[serde(default)]
    pub price: f64,
}

impl From<UpdateProduct> for Product {
    fn from(input: UpdateProduct) -> Self {
        Self {
            id: input.id,
            name: input.name,
            quantity: input.quantity,
            price: input.price,
        }
    }
}

/// Product fields a search can be ordered by
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    Default,
    ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum SortField {
    Id,
    #[default]
    Name,
    Quantity,
    Price,
}

/// Raw search request as received over HTTP
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SearchParams {
    /// Case-insensitive substring of the product name (required, non-blank)
    pub keyword: Option<String>,
    /// Zero-based page index (default 0)
    pub page: Option<i64>,
    /// Page size (default 10, capped at 100)
    pub size: Option<i64>,
    /// One of `id`, `name`, `quantity`, `price` (default `name`)
    #[serde(rename = "sortBy")]
    pub sort_by: Option<String>,
}

/// Validated, normalized search handed to the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageQuery {
    /// Trimmed, non-empty keyword
    pub keyword: String,
    pub page: u64,
    /// Always in `1..=MAX_PAGE_SIZE`
    pub size: u64,
    pub sort: SortField,
}

impl PageQuery {
    /// Number of matches preceding the requested page
    pub fn offset(&self) -> u64 {
        self.page.saturating_mul(self.size)
    }
}

/// One window of a paginated search
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductPage {
    pub items: Vec<Product>,
    /// Matches before slicing into the window
    pub total_matches: u64,
}

/// Search response envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub products: Vec<Product>,
    /// Matches across all pages
    pub total_results: u64,
    pub page: u64,
    /// Effective page size after defaulting and capping
    pub size: u64,
}

/// Body returned after a successful delete
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct DeleteResponse {
    pub id: i32,
    pub message: String,
}

impl DeleteResponse {
    pub fn new(id: i32) -> Self {
        Self {
            id,
            message: format!("product removed !! {id}"),
        }
    }
}
