use metrics_exporter_prometheus::PrometheusHandle;
use policyscope::policies::{
    Domain, DomainId, DomainStore, Policy, PolicyId, PolicyStore, StoreError,
};
use std::collections::BTreeMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Mutex-guarded map keyed by id; `name` uniqueness is enforced at insert so
/// racing creates surface as `Conflict` and the service re-reads the winner.
#[derive(Default, Clone)]
pub(crate) struct InMemoryDomainStore {
    records: Arc<Mutex<BTreeMap<DomainId, Domain>>>,
}

impl DomainStore for InMemoryDomainStore {
    fn find_by_name(&self, name: &str) -> Result<Option<Domain>, StoreError> {
        let guard = self.records.lock().expect("domain mutex poisoned");
        Ok(guard.values().find(|domain| domain.name == name).cloned())
    }

    fn insert(&self, domain: Domain) -> Result<Domain, StoreError> {
        let mut guard = self.records.lock().expect("domain mutex poisoned");
        if guard.values().any(|existing| existing.name == domain.name) {
            return Err(StoreError::Conflict);
        }
        guard.insert(domain.id.clone(), domain.clone());
        Ok(domain)
    }

    fn update(&self, domain: Domain) -> Result<(), StoreError> {
        let mut guard = self.records.lock().expect("domain mutex poisoned");
        if guard.contains_key(&domain.id) {
            guard.insert(domain.id.clone(), domain);
            Ok(())
        } else {
            Err(StoreError::NotFound)
        }
    }
}

/// `page_url` is the global dedup key; ids sort in insertion order so
/// `list_by_domain` comes back ordered.
#[derive(Default, Clone)]
pub(crate) struct InMemoryPolicyStore {
    records: Arc<Mutex<BTreeMap<PolicyId, Policy>>>,
}

impl PolicyStore for InMemoryPolicyStore {
    fn find_by_url(&self, url: &str) -> Result<Option<Policy>, StoreError> {
        let guard = self.records.lock().expect("policy mutex poisoned");
        Ok(guard.values().find(|policy| policy.page_url == url).cloned())
    }

    fn insert(&self, policy: Policy) -> Result<Policy, StoreError> {
        let mut guard = self.records.lock().expect("policy mutex poisoned");
        if guard
            .values()
            .any(|existing| existing.page_url == policy.page_url)
        {
            return Err(StoreError::Conflict);
        }
        guard.insert(policy.id.clone(), policy.clone());
        Ok(policy)
    }

    fn update(&self, policy: Policy) -> Result<(), StoreError> {
        let mut guard = self.records.lock().expect("policy mutex poisoned");
        if guard.contains_key(&policy.id) {
            guard.insert(policy.id.clone(), policy);
            Ok(())
        } else {
            Err(StoreError::NotFound)
        }
    }

    fn list_by_domain(&self, domain_id: &DomainId) -> Result<Vec<Policy>, StoreError> {
        let guard = self.records.lock().expect("policy mutex poisoned");
        Ok(guard
            .values()
            .filter(|policy| policy.domain_id == *domain_id)
            .cloned()
            .collect())
    }
}
