use async_trait::async_trait;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::error::{ProductError, ProductResult};
use crate::models::{CreateProduct, PageQuery, Product, ProductPage, SortField};

/// Repository trait for Product persistence
///
/// Implementations assign ids on insert and match names case-insensitively
/// when searching. Result order is stable: the requested sort field first,
/// then ascending id.
///
/// Name ordering follows the backing store. The in-memory store compares
/// UTF-8 bytes; PostgreSQL applies the column collation, so mixed-case or
/// accented names may order differently between the two.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// Store a new product and return it with its assigned id
    async fn insert(&self, input: CreateProduct) -> ProductResult<Product>;

    /// Store several products; either all are stored or none are
    async fn insert_many(&self, inputs: Vec<CreateProduct>) -> ProductResult<Vec<Product>>;

    /// All products, ascending by id
    async fn get_all(&self) -> ProductResult<Vec<Product>>;

    async fn get_by_id(&self, id: i32) -> ProductResult<Option<Product>>;

    /// Exact name match; the lowest id wins when several share a name
    async fn get_by_name(&self, name: &str) -> ProductResult<Option<Product>>;

    /// Every product whose name contains `keyword`, ignoring case, ascending by id
    async fn search_contains(&self, keyword: &str) -> ProductResult<Vec<Product>>;

    /// One page of matches plus the total match count
    async fn search_contains_paged(&self, query: PageQuery) -> ProductResult<ProductPage>;

    /// Replace name, quantity and price of an existing product
    async fn update(&self, product: Product) -> ProductResult<Product>;

    /// Returns whether a product was removed
    async fn delete_by_id(&self, id: i32) -> ProductResult<bool>;
}

/// Case-insensitive containment used by every store
pub(crate) fn name_matches(name: &str, keyword: &str) -> bool {
    name.to_lowercase().contains(&keyword.to_lowercase())
}

fn compare_by(field: SortField, a: &Product, b: &Product) -> Ordering {
    let primary = match field {
        SortField::Id => Ordering::Equal,
        SortField::Name => a.name.cmp(&b.name),
        SortField::Quantity => a.quantity.cmp(&b.quantity),
        SortField::Price => a.price.total_cmp(&b.price),
    };
    primary.then(a.id.cmp(&b.id))
}

#[derive(Debug)]
struct Catalog {
    products: BTreeMap<i32, Product>,
    next_id: i32,
}

impl Default for Catalog {
    fn default() -> Self {
        Self {
            products: BTreeMap::new(),
            next_id: 1,
        }
    }
}

impl Catalog {
    fn allocate_id(&mut self) -> ProductResult<i32> {
        let id = self.next_id;
        self.next_id = id
            .checked_add(1)
            .ok_or_else(|| ProductError::Internal("product id space exhausted".to_string()))?;
        Ok(id)
    }

    fn store(&mut self, id: i32, input: CreateProduct) -> Product {
        let product = Product {
            id,
            name: input.name,
            quantity: input.quantity,
            price: input.price,
        };
        self.products.insert(id, product.clone());
        product
    }
}

/// In-memory implementation of ProductRepository (for development/testing)
#[derive(Debug, Default, Clone)]
pub struct InMemoryProductRepository {
    catalog: Arc<RwLock<Catalog>>,
}

impl InMemoryProductRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProductRepository for InMemoryProductRepository {
    async fn insert(&self, input: CreateProduct) -> ProductResult<Product> {
        let mut catalog = self.catalog.write().await;
        let id = catalog.allocate_id()?;
        let product = catalog.store(id, input);

        tracing::info!(product_id = product.id, "Created product");
        Ok(product)
    }

    async fn insert_many(&self, inputs: Vec<CreateProduct>) -> ProductResult<Vec<Product>> {
        let mut catalog = self.catalog.write().await;

        // Reserve the whole id range up front so a failure leaves nothing behind
        let first = catalog.next_id;
        let count = i32::try_from(inputs.len())
            .map_err(|_| ProductError::InvalidArgument("too many products".to_string()))?;
        let next = first
            .checked_add(count)
            .ok_or_else(|| ProductError::Internal("product id space exhausted".to_string()))?;
        catalog.next_id = next;

        let created: Vec<Product> = (first..next)
            .zip(inputs)
            .map(|(id, input)| catalog.store(id, input))
            .collect();

        tracing::info!(count = created.len(), "Created products");
        Ok(created)
    }

    async fn get_all(&self) -> ProductResult<Vec<Product>> {
        let catalog = self.catalog.read().await;
        Ok(catalog.products.values().cloned().collect())
    }

    async fn get_by_id(&self, id: i32) -> ProductResult<Option<Product>> {
        let catalog = self.catalog.read().await;
        Ok(catalog.products.get(&id).cloned())
    }

    async fn get_by_name(&self, name: &str) -> ProductResult<Option<Product>> {
        let catalog = self.catalog.read().await;
        Ok(catalog.products.values().find(|p| p.name == name).cloned())
    }

    async fn search_contains(&self, keyword: &str) -> ProductResult<Vec<Product>> {
        let catalog = self.catalog.read().await;
        Ok(catalog
            .products
            .values()
            .filter(|p| name_matches(&p.name, keyword))
            .cloned()
            .collect())
    }

    async fn search_contains_paged(&self, query: PageQuery) -> ProductResult<ProductPage> {
        let catalog = self.catalog.read().await;

        let mut matches: Vec<&Product> = catalog
            .products
            .values()
            .filter(|p| name_matches(&p.name, &query.keyword))
            .collect();
        matches.sort_by(|a, b| compare_by(query.sort, a, b));

        let total_matches = matches.len() as u64;
        let offset = usize::try_from(query.offset()).unwrap_or(usize::MAX);
        let size = usize::try_from(query.size).unwrap_or(usize::MAX);

        let items = matches
            .into_iter()
            .skip(offset)
            .take(size)
            .cloned()
            .collect();

        Ok(ProductPage {
            items,
            total_matches,
        })
    }

    async fn update(&self, product: Product) -> ProductResult<Product> {
        let mut catalog = self.catalog.write().await;

        let existing = catalog
            .products
            .get_mut(&product.id)
            .ok_or(ProductError::NotFound(product.id))?;
        existing.name = product.name;
        existing.quantity = product.quantity;
        existing.price = product.price;
        let updated = existing.clone();

        tracing::info!(product_id = updated.id, "Updated product");
        Ok(updated)
    }

    async fn delete_by_id(&self, id: i32) -> ProductResult<bool> {
        let mut catalog = self.catalog.write().await;

        if catalog.products.remove(&id).is_some() {
            tracing::info!(product_id = id, "Deleted product");
            Ok(true)
        } else {
            Ok(false)
        }
    }
}
