use async_trait::async_trait;
use sea_orm::sea_query::{Expr, SimpleExpr};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, IsolationLevel,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, TransactionTrait,
};

use crate::{
    entity,
    error::{ProductError, ProductResult},
    models::{CreateProduct, PageQuery, Product, ProductPage, SortField},
    repository::ProductRepository,
};

/// Escapes LIKE metacharacters so the keyword is matched literally
fn escape_like(keyword: &str) -> String {
    let mut escaped = String::with_capacity(keyword.len() + 2);
    for c in keyword.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn name_contains(keyword: &str) -> SimpleExpr {
    let pattern = format!("%{}%", escape_like(keyword));
    Expr::cust_with_values("\"name\" ILIKE $1 ESCAPE '\\'", [pattern])
}

pub struct PgProductRepository {
    db: DatabaseConnection,
}

impl PgProductRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ProductRepository for PgProductRepository {
    async fn insert(&self, input: CreateProduct) -> ProductResult<Product> {
        let active_model: entity::ActiveModel = input.into();
        let model = active_model.insert(&self.db).await?;

        tracing::info!(product_id = model.id, "Created product");
        Ok(model.into())
    }

    async fn insert_many(&self, inputs: Vec<CreateProduct>) -> ProductResult<Vec<Product>> {
        if inputs.is_empty() {
            return Ok(Vec::new());
        }

        let txn = self.db.begin().await?;
        let mut created = Vec::with_capacity(inputs.len());
        for input in inputs {
            let active_model: entity::ActiveModel = input.into();
            // Dropping the transaction on error rolls it back
            let model = active_model.insert(&txn).await?;
            created.push(Product::from(model));
        }
        txn.commit().await?;

        tracing::info!(count = created.len(), "Created products");
        Ok(created)
    }

    async fn get_all(&self) -> ProductResult<Vec<Product>> {
        let models = entity::Entity::find()
            .order_by_asc(entity::Column::Id)
            .all(&self.db)
            .await?;

        Ok(models.into_iter().map(Into::into).collect())
    }

    async fn get_by_id(&self, id: i32) -> ProductResult<Option<Product>> {
        let model = entity::Entity::find_by_id(id).one(&self.db).await?;
        Ok(model.map(Into::into))
    }

    async fn get_by_name(&self, name: &str) -> ProductResult<Option<Product>> {
        let model = entity::Entity::find()
            .filter(entity::Column::Name.eq(name))
            .order_by_asc(entity::Column::Id)
            .one(&self.db)
            .await?;

        Ok(model.map(Into::into))
    }

    async fn search_contains(&self, keyword: &str) -> ProductResult<Vec<Product>> {
        let models = entity::Entity::find()
            .filter(name_contains(keyword))
            .order_by_asc(entity::Column::Id)
            .all(&self.db)
            .await?;

        Ok(models.into_iter().map(Into::into).collect())
    }

    async fn search_contains_paged(&self, query: PageQuery) -> ProductResult<ProductPage> {
        // Count and window share one snapshot so the total matches the items
        let txn = self
            .db
            .begin_with_config(Some(IsolationLevel::RepeatableRead), None)
            .await?;

        let total_matches = entity::Entity::find()
            .filter(name_contains(&query.keyword))
            .count(&txn)
            .await?;

        let offset = query.offset();
        let items = if offset >= total_matches {
            Vec::new()
        } else {
            let mut select = entity::Entity::find()
                .filter(name_contains(&query.keyword))
                .order_by_asc(entity::Column::from(query.sort));
            if query.sort != SortField::Id {
                select = select.order_by_asc(entity::Column::Id);
            }

            select
                .offset(offset)
                .limit(query.size)
                .all(&txn)
                .await?
                .into_iter()
                .map(Into::into)
                .collect()
        };
        txn.commit().await?;

        Ok(ProductPage {
            items,
            total_matches,
        })
    }

    async fn update(&self, product: Product) -> ProductResult<Product> {
        let id = product.id;
        let active_model: entity::ActiveModel = product.into();
        let model = active_model.update(&self.db).await.map_err(|e| match e {
            DbErr::RecordNotUpdated => ProductError::NotFound(id),
            other => other.into(),
        })?;

        tracing::info!(product_id = id, "Updated product");
        Ok(model.into())
    }

    async fn delete_by_id(&self, id: i32) -> ProductResult<bool> {
        let result = entity::Entity::delete_by_id(id).exec(&self.db).await?;

        if result.rows_affected > 0 {
            tracing::info!(product_id = id, "Deleted product");
            Ok(true)
        } else {
            Ok(false)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult, Value};
    use std::collections::BTreeMap;

    fn model(id: i32, name: &str, quantity: i32, price: f64) -> entity::Model {
        entity::Model {
            id,
            name: name.to_string(),
            quantity,
            price,
        }
    }

    fn count_row(n: i64) -> BTreeMap<&'static str, Value> {
        BTreeMap::from([("num_items", Value::from(n))])
    }

    #[test]
    fn test_escape_like_metacharacters() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
        assert_eq!(escape_like("plain"), "plain");
    }

    #[tokio::test]
    async fn test_insert_returns_assigned_id() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![model(7, "Apple", 5, 1.2)]])
            .into_connection();
        let repo = PgProductRepository::new(db);

        let product = repo
            .insert(CreateProduct {
                name: "Apple".to_string(),
                quantity: 5,
                price: 1.2,
            })
            .await
            .unwrap();

        assert_eq!(product.id, 7);
        assert_eq!(product.name, "Apple");
    }

    #[tokio::test]
    async fn test_get_by_id_missing_is_none() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<entity::Model>::new()])
            .into_connection();
        let repo = PgProductRepository::new(db);

        assert!(repo.get_by_id(1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_reports_rows_affected() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([
                MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                },
                MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                },
            ])
            .into_connection();
        let repo = PgProductRepository::new(db);

        assert!(repo.delete_by_id(3).await.unwrap());
        assert!(!repo.delete_by_id(3).await.unwrap());
    }

    #[tokio::test]
    async fn test_search_binds_escaped_pattern() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![model(1, "Banana", 10, 0.5)]])
            .into_connection();
        let repo = PgProductRepository::new(db.clone());

        let found = repo.search_contains("an_").await.unwrap();
        assert_eq!(found.len(), 1);

        let log = format!("{:?}", db.into_transaction_log());
        assert!(log.contains("ILIKE $1"), "{log}");
        assert!(!log.contains("ILIKE ?"), "{log}");
        assert!(log.contains("%an\\\\_%"), "pattern must be bound: {log}");
    }

    #[tokio::test]
    async fn test_paged_search_runs_in_one_transaction() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![count_row(3)]])
            .append_query_results([vec![model(2, "Bandana", 3, 7.0)]])
            .into_connection();
        let repo = PgProductRepository::new(db.clone());

        repo.search_contains_paged(PageQuery {
            keyword: "ban".to_string(),
            page: 0,
            size: 2,
            sort: SortField::Name,
        })
        .await
        .unwrap();

        let log = db.into_transaction_log();
        assert_eq!(log.len(), 1, "count and window must share a transaction: {log:?}");
        let log = format!("{log:?}");
        assert!(log.contains("COUNT"));
        assert!(log.contains("%ban%"));
    }

    #[tokio::test]
    async fn test_get_by_name_orders_by_id() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![model(3, "Apple", 5, 1.2)]])
            .into_connection();
        let repo = PgProductRepository::new(db.clone());

        let found = repo.get_by_name("Apple").await.unwrap().unwrap();
        assert_eq!(found.id, 3);

        let log = format!("{:?}", db.into_transaction_log());
        assert!(log.contains("ORDER BY"), "{log}");
        assert!(log.contains("ASC LIMIT"), "{log}");
        assert!(log.contains("Apple"));
    }

    #[tokio::test]
    async fn test_update_returns_stored_row() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![model(4, "Pear", 9, 2.5)]])
            .into_connection();
        let repo = PgProductRepository::new(db);

        let updated = repo
            .update(Product {
                id: 4,
                name: "Pear".to_string(),
                quantity: 9,
                price: 2.5,
            })
            .await
            .unwrap();

        assert_eq!(updated.id, 4);
        assert_eq!(updated.quantity, 9);
    }

    #[tokio::test]
    async fn test_update_missing_row_is_not_found() {
        // UPDATE ... RETURNING yields no row for an absent id
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<entity::Model>::new()])
            .into_connection();
        let repo = PgProductRepository::new(db);

        let result = repo
            .update(Product {
                id: 41,
                name: "Ghost".to_string(),
                quantity: 0,
                price: 0.0,
            })
            .await;

        assert!(matches!(result, Err(ProductError::NotFound(41))));
    }

    #[tokio::test]
    async fn test_insert_many_fails_whole_batch_on_error() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![model(1, "Apple", 5, 1.2)]])
            .append_query_errors([DbErr::Custom("value too long".to_string())])
            .into_connection();
        let repo = PgProductRepository::new(db.clone());

        let result = repo
            .insert_many(vec![
                CreateProduct {
                    name: "Apple".to_string(),
                    quantity: 5,
                    price: 1.2,
                },
                CreateProduct {
                    name: "Pear".to_string(),
                    quantity: 2,
                    price: 0.8,
                },
            ])
            .await;

        assert!(matches!(result, Err(ProductError::Database(_))));

        let log = format!("{:?}", db.into_transaction_log());
        assert!(log.contains("ROLLBACK"), "{log}");
        assert!(!log.contains("COMMIT"), "{log}");
    }

    #[tokio::test]
    async fn test_paged_search_past_end_skips_item_query() {
        // Only the count query has a prepared result
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![count_row(2)]])
            .into_connection();
        let repo = PgProductRepository::new(db);

        let page = repo
            .search_contains_paged(PageQuery {
                keyword: "an".to_string(),
                page: 3,
                size: 10,
                sort: SortField::Name,
            })
            .await
            .unwrap();

        assert!(page.items.is_empty());
        assert_eq!(page.total_matches, 2);
    }

    #[tokio::test]
    async fn test_paged_search_returns_window() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![count_row(3)]])
            .append_query_results([vec![model(2, "Bandana", 3, 7.0)]])
            .into_connection();
        let repo = PgProductRepository::new(db);

        let page = repo
            .search_contains_paged(PageQuery {
                keyword: "ban".to_string(),
                page: 1,
                size: 2,
                sort: SortField::Price,
            })
            .await
            .unwrap();

        assert_eq!(page.total_matches, 3);
        assert_eq!(page.items[0].name, "Bandana");
    }
}
