use super::domain::{Domain, DomainId, Policy};

/// Storage abstraction over domain records so the service module can be
/// exercised in isolation. Uniqueness of `name` is enforced at insert;
/// callers recover from `Conflict` by re-reading.
pub trait DomainStore: Send + Sync {
    fn find_by_name(&self, name: &str) -> Result<Option<Domain>, StoreError>;
    fn insert(&self, domain: Domain) -> Result<Domain, StoreError>;
    fn update(&self, domain: Domain) -> Result<(), StoreError>;
}

/// Storage abstraction over policy records. `page_url` is the global dedup
/// key and is enforced unique at insert.
pub trait PolicyStore: Send + Sync {
    fn find_by_url(&self, url: &str) -> Result<Option<Policy>, StoreError>;
    fn insert(&self, policy: Policy) -> Result<Policy, StoreError>;
    fn update(&self, policy: Policy) -> Result<(), StoreError>;
    /// Policies owned by the given domain, ordered by id. Empty when the
    /// domain is unknown or has no policies.
    fn list_by_domain(&self, domain_id: &DomainId) -> Result<Vec<Policy>, StoreError>;
}

/// Error enumeration for store failures.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("store unavailable: {0}")]
    Unavailable(String),
}
