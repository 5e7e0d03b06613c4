use async_trait::async_trait;
use equity_core::{Company, InsightError, SymbolStore};
use std::collections::HashSet;
use std::sync::RwLock;

/// In-memory symbol store.
///
/// `populate` only inserts companies whose symbol is not present yet, so
/// loading the same reference list twice leaves the catalog unchanged.
/// Listing returns companies in first-insert order.
#[derive(Default)]
pub struct SymbolCatalog {
    inner: RwLock<CatalogInner>,
}

#[derive(Default)]
struct CatalogInner {
    companies: Vec<Company>,
    symbols: HashSet<String>,
}

impl SymbolCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_companies(companies: Vec<Company>) -> Self {
        let catalog = Self::new();
        catalog.populate(companies);
        catalog
    }

    /// Insert companies not already known. Returns how many were added.
    pub fn populate(&self, companies: impl IntoIterator<Item = Company>) -> usize {
        let mut inner = self.inner.write().unwrap_or_else(|e| e.into_inner());
        let mut added = 0;
        for company in companies {
            if inner.symbols.insert(company.symbol.clone()) {
                inner.companies.push(company);
                added += 1;
            }
        }
        tracing::debug!("Symbol catalog: {} added, {} total", added, inner.companies.len());
        added
    }

    pub fn len(&self) -> usize {
        self.inner.read().unwrap_or_else(|e| e.into_inner()).companies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        let mut inner = self.inner.write().unwrap_or_else(|e| e.into_inner());
        inner.companies.clear();
        inner.symbols.clear();
    }
}

#[async_trait]
impl SymbolStore for SymbolCatalog {
    async fn list_companies(&self) -> Result<Vec<Company>, InsightError> {
        Ok(self
            .inner
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .companies
            .clone())
    }
}
