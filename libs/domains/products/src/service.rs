//! Product Service - Business logic layer

use std::sync::Arc;
use tracing::instrument;
use validator::Validate;

use crate::error::{ProductError, ProductResult};
use crate::models::{
    CreateProduct, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE, PageQuery, Product, SearchParams,
    SearchResult, SortField, UpdateProduct,
};
use crate::repository::ProductRepository;

const KEYWORD_REQUIRED: &str = "Search keyword is required";

/// Product service providing business logic operations
///
/// Validates requests before they reach the repository and turns absent
/// records into `NotFound` errors.
pub struct ProductService<R: ProductRepository> {
    repository: Arc<R>,
}

impl<R: ProductRepository> ProductService<R> {
    /// Create a new ProductService with the given repository
    pub fn new(repository: R) -> Self {
        Self {
            repository: Arc::new(repository),
        }
    }

    /// Paginated, sorted keyword search over product names
    #[instrument(skip(self))]
    pub async fn search(&self, params: SearchParams) -> ProductResult<SearchResult> {
        let query = normalize_search(params)?;
        let (page, size) = (query.page, query.size);

        let result = self.repository.search_contains_paged(query).await?;

        tracing::debug!(total = result.total_matches, page, size, "Search completed");
        Ok(SearchResult {
            products: result.items,
            total_results: result.total_matches,
            page,
            size,
        })
    }

    #[instrument(skip(self, input), fields(product_name = %input.name))]
    pub async fn add_product(&self, input: CreateProduct) -> ProductResult<Product> {
        input.validate()?;
        self.repository.insert(input).await
    }

    /// Stores every product or none; the first invalid entry rejects the batch
    #[instrument(skip(self, inputs), fields(count = inputs.len()))]
    pub async fn add_products(&self, inputs: Vec<CreateProduct>) -> ProductResult<Vec<Product>> {
        for (index, input) in inputs.iter().enumerate() {
            input
                .validate()
                .map_err(|e| ProductError::InvalidArgument(format!("products[{index}]: {e}")))?;
        }

        self.repository.insert_many(inputs).await
    }

    #[instrument(skip(self))]
    pub async fn list_products(&self) -> ProductResult<Vec<Product>> {
        self.repository.get_all().await
    }

    #[instrument(skip(self))]
    pub async fn get_product(&self, id: i32) -> ProductResult<Product> {
        self.repository
            .get_by_id(id)
            .await?
            .ok_or(ProductError::NotFound(id))
    }

    /// Exact, case-sensitive name lookup
    #[instrument(skip(self))]
    pub async fn get_product_by_name(&self, name: &str) -> ProductResult<Product> {
        self.repository
            .get_by_name(name)
            .await?
            .ok_or_else(|| ProductError::NameNotFound(name.to_string()))
    }

    #[instrument(skip(self, input), fields(product_id = input.id))]
    pub async fn update_product(&self, input: UpdateProduct) -> ProductResult<Product> {
        input.validate()?;
        self.repository.update(input.into()).await
    }

    #[instrument(skip(self))]
    pub async fn delete_product(&self, id: i32) -> ProductResult<()> {
        if self.repository.delete_by_id(id).await? {
            Ok(())
        } else {
            Err(ProductError::NotFound(id))
        }
    }
}

fn required_keyword(keyword: Option<&str>) -> ProductResult<&str> {
    keyword
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .ok_or_else(|| ProductError::InvalidArgument(KEYWORD_REQUIRED.to_string()))
}

/// Applies defaults and bounds to a raw search request
fn normalize_search(params: SearchParams) -> ProductResult<PageQuery> {
    let keyword = required_keyword(params.keyword.as_deref())?.to_string();

    let page = match params.page {
        None => 0,
        Some(page) => u64::try_from(page).map_err(|_| {
            ProductError::InvalidArgument(format!("page must not be negative, got {page}"))
        })?,
    };

    let size = match params.size {
        None => DEFAULT_PAGE_SIZE,
        Some(size) if size < 1 => {
            return Err(ProductError::InvalidArgument(format!(
                "size must be at least 1, got {size}"
            )));
        }
        Some(size) => u64::try_from(size).map_or(MAX_PAGE_SIZE, |s| s.min(MAX_PAGE_SIZE)),
    };

    let sort = match params.sort_by.as_deref().map(str::trim) {
        None | Some("") => SortField::default(),
        Some(field) => field.parse().map_err(|_| {
            ProductError::InvalidArgument(format!(
                "sortBy must be one of id, name, quantity, price, got '{field}'"
            ))
        })?,
    };

    Ok(PageQuery {
        keyword,
        page,
        size,
        sort,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ProductPage;
    use crate::repository::MockProductRepository;
    use mockall::predicate::eq;

    fn params(keyword: Option<&str>) -> SearchParams {
        SearchParams {
            keyword: keyword.map(String::from),
            ..Default::default()
        }
    }

    fn product(id: i32, name: &str) -> Product {
        Product {
            id,
            name: name.to_string(),
            quantity: 1,
            price: 1.0,
        }
    }

    #[tokio::test]
    async fn test_blank_keyword_never_reaches_repository() {
        for keyword in [None, Some(""), Some("   ")] {
            let mut mock_repo = MockProductRepository::new();
            mock_repo.expect_search_contains_paged().never();

            let service = ProductService::new(mock_repo);
            let result = service.search(params(keyword)).await;

            assert!(
                matches!(result, Err(ProductError::InvalidArgument(ref m)) if m == KEYWORD_REQUIRED),
                "keyword {keyword:?} should be rejected"
            );
        }
    }

    #[tokio::test]
    async fn test_search_applies_defaults_and_trims_keyword() {
        let mut mock_repo = MockProductRepository::new();
        mock_repo
            .expect_search_contains_paged()
            .with(eq(PageQuery {
                keyword: "an".to_string(),
                page: 0,
                size: DEFAULT_PAGE_SIZE,
                sort: SortField::Name,
            }))
            .times(1)
            .returning(|_| {
                Ok(ProductPage {
                    items: vec![product(2, "Banana")],
                    total_matches: 1,
                })
            });

        let service = ProductService::new(mock_repo);
        let result = service.search(params(Some("  an "))).await.unwrap();

        assert_eq!(result.total_results, 1);
        assert_eq!(result.page, 0);
        assert_eq!(result.size, 10);
        assert_eq!(result.products[0].name, "Banana");
    }

    #[tokio::test]
    async fn test_search_caps_size_and_parses_sort() {
        let mut mock_repo = MockProductRepository::new();
        mock_repo
            .expect_search_contains_paged()
            .withf(|q| q.size == MAX_PAGE_SIZE && q.sort == SortField::Price && q.page == 2)
            .returning(|_| Ok(ProductPage::default()));

        let service = ProductService::new(mock_repo);
        let result = service
            .search(SearchParams {
                keyword: Some("a".into()),
                page: Some(2),
                size: Some(5000),
                sort_by: Some("PRICE".into()),
            })
            .await
            .unwrap();

        assert_eq!(result.size, MAX_PAGE_SIZE);
        assert!(result.products.is_empty());
    }

    #[tokio::test]
    async fn test_search_rejects_bad_window_and_sort() {
        let bad = [
            SearchParams {
                page: Some(-1),
                ..params(Some("a"))
            },
            SearchParams {
                size: Some(0),
                ..params(Some("a"))
            },
            SearchParams {
                sort_by: Some("colour".into()),
                ..params(Some("a"))
            },
        ];

        for request in bad {
            let mut mock_repo = MockProductRepository::new();
            mock_repo.expect_search_contains_paged().never();

            let service = ProductService::new(mock_repo);
            let result = service.search(request).await;
            assert!(matches!(result, Err(ProductError::InvalidArgument(_))));
        }
    }

    #[tokio::test]
    async fn test_add_products_rejects_batch_on_invalid_entry() {
        let mut mock_repo = MockProductRepository::new();
        mock_repo.expect_insert_many().never();

        let service = ProductService::new(mock_repo);
        let result = service
            .add_products(vec![
                CreateProduct {
                    name: "Apple".into(),
                    quantity: 1,
                    price: 1.0,
                },
                CreateProduct {
                    name: String::new(),
                    quantity: 1,
                    price: 1.0,
                },
            ])
            .await;

        assert!(matches!(result, Err(ProductError::InvalidArgument(ref m)) if m.starts_with("products[1]")));
    }

    #[tokio::test]
    async fn test_get_product_missing_is_not_found() {
        let mut mock_repo = MockProductRepository::new();
        mock_repo
            .expect_get_by_id()
            .with(eq(999))
            .returning(|_| Ok(None));

        let service = ProductService::new(mock_repo);
        let result = service.get_product(999).await;
        assert!(matches!(result, Err(ProductError::NotFound(999))));
    }

    #[tokio::test]
    async fn test_get_product_by_name_missing_is_not_found() {
        let mut mock_repo = MockProductRepository::new();
        mock_repo.expect_get_by_name().returning(|_| Ok(None));

        let service = ProductService::new(mock_repo);
        let result = service.get_product_by_name("Kiwi").await;
        assert!(matches!(result, Err(ProductError::NameNotFound(ref n)) if n == "Kiwi"));
    }

    #[tokio::test]
    async fn test_delete_missing_product_is_not_found() {
        let mut mock_repo = MockProductRepository::new();
        mock_repo
            .expect_delete_by_id()
            .with(eq(999))
            .returning(|_| Ok(false));

        let service = ProductService::new(mock_repo);
        let result = service.delete_product(999).await;
        assert!(matches!(result, Err(ProductError::NotFound(999))));
    }

    #[tokio::test]
    async fn test_update_validates_before_store() {
        let mut mock_repo = MockProductRepository::new();
        mock_repo.expect_update().never();

        let service = ProductService::new(mock_repo);
        let result = service
            .update_product(UpdateProduct {
                id: 1,
                name: "Apple".into(),
                quantity: -3,
                price: 1.0,
            })
            .await;
        assert!(matches!(result, Err(ProductError::InvalidArgument(_))));
    }

    #[tokio::test]
    async fn test_store_failure_propagates() {
        let mut mock_repo = MockProductRepository::new();
        mock_repo
            .expect_search_contains_paged()
            .returning(|_| Err(ProductError::Database("connection reset".into())));

        let service = ProductService::new(mock_repo);
        let result = service.search(params(Some("an"))).await;
        assert!(matches!(result, Err(ProductError::Database(_))));
    }
}
