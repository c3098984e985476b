//! # Product Repository
//!
//! Persistence port for the product catalog.
//!
//! The machine keeps its own in-memory catalog; the repository is where
//! stock survives a restart. `VendingService` reads it once at bootstrap and
//! writes back every product a completed order touched.
//!
//! ## Usage
//! ```rust,ignore
//! let repo: Arc<dyn ProductRepository> = Arc::new(InMemoryProductRepository::new());
//!
//! repo.save_product(&water).await?;
//! let all = repo.find_all().await?;
//! ```

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;
use vend_core::{Product, ProductId};

use crate::error::RepositoryError;

/// Result type alias for repository operations.
pub type RepositoryResult<T> = Result<T, RepositoryError>;

#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// Every stored product, ordered by name.
    async fn find_all(&self) -> RepositoryResult<Vec<Product>>;

    async fn find_by_id(&self, id: ProductId) -> RepositoryResult<Option<Product>>;

    /// Inserts a new product. Fails with `AlreadyExists` on a known id.
    async fn save_product(&self, product: &Product) -> RepositoryResult<()>;

    /// Replaces a stored product. Fails with `NotFound` on an unknown id.
    async fn update_product(&self, product: &Product) -> RepositoryResult<()>;

    async fn exists_by_id(&self, id: ProductId) -> RepositoryResult<bool>;

    /// Returns whether anything was deleted.
    async fn delete_by_id(&self, id: ProductId) -> RepositoryResult<bool>;
}

// =============================================================================
// In-Memory Adapter
// =============================================================================

/// `HashMap`-backed repository for tests and the demo binary.
#[derive(Debug, Default)]
pub struct InMemoryProductRepository {
    products: RwLock<HashMap<ProductId, Product>>,
}

impl InMemoryProductRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_products<I>(products: I) -> Self
    where
        I: IntoIterator<Item = Product>,
    {
        let products = products.into_iter().map(|p| (p.id(), p)).collect();
        InMemoryProductRepository {
            products: RwLock::new(products),
        }
    }
}

#[async_trait]
impl ProductRepository for InMemoryProductRepository {
    async fn find_all(&self) -> RepositoryResult<Vec<Product>> {
        let products = self.products.read().await;
        let mut all: Vec<Product> = products.values().cloned().collect();
        all.sort_by(|a, b| a.name().cmp(b.name()).then(a.id().cmp(&b.id())));
        Ok(all)
    }

    async fn find_by_id(&self, id: ProductId) -> RepositoryResult<Option<Product>> {
        Ok(self.products.read().await.get(&id).cloned())
    }

    async fn save_product(&self, product: &Product) -> RepositoryResult<()> {
        let mut products = self.products.write().await;
        if products.contains_key(&product.id()) {
            return Err(RepositoryError::AlreadyExists(product.id()));
        }
        debug!(product_id = %product.id(), name = product.name(), "Product saved");
        products.insert(product.id(), product.clone());
        Ok(())
    }

    async fn update_product(&self, product: &Product) -> RepositoryResult<()> {
        let mut products = self.products.write().await;
        match products.get_mut(&product.id()) {
            Some(stored) => {
                *stored = product.clone();
                debug!(
                    product_id = %product.id(),
                    quantity = product.quantity(),
                    "Product updated"
                );
                Ok(())
            }
            None => Err(RepositoryError::NotFound(product.id())),
        }
    }

    async fn exists_by_id(&self, id: ProductId) -> RepositoryResult<bool> {
        Ok(self.products.read().await.contains_key(&id))
    }

    async fn delete_by_id(&self, id: ProductId) -> RepositoryResult<bool> {
        Ok(self.products.write().await.remove(&id).is_some())
    }
}
