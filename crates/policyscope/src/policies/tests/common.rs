use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::response::Response;
use serde_json::Value;

use crate::policies::analyzer::{
    AnalysisError, CannedAnalyzer, GenerateError, PolicyAnalyzer, TextGenerator,
};
use crate::policies::domain::{
    AnalysisReport, Domain, DomainId, Policy, PolicyDescriptor, PolicyId,
};
use crate::policies::fetch::{ContentFetcher, FetchError};
use crate::policies::service::{PolicyService, SavePoliciesCommand};
use crate::policies::store::{DomainStore, PolicyStore, StoreError};

#[derive(Default, Clone)]
pub(super) struct MemoryDomainStore {
    records: Arc<Mutex<BTreeMap<DomainId, Domain>>>,
}

impl DomainStore for MemoryDomainStore {
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

#[derive(Default, Clone)]
pub(super) struct MemoryPolicyStore {
    records: Arc<Mutex<BTreeMap<PolicyId, Policy>>>,
}

impl PolicyStore for MemoryPolicyStore {
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

/// Domain store simulating a lost create race: the first lookup misses,
/// the insert conflicts, and the re-read sees the racing winner.
pub(super) struct RacedDomainStore {
    pub(super) inner: MemoryDomainStore,
    first_lookup_done: AtomicBool,
}

impl RacedDomainStore {
    pub(super) fn new(inner: MemoryDomainStore) -> Self {
        Self {
            inner,
            first_lookup_done: AtomicBool::new(false),
        }
    }
}

impl DomainStore for RacedDomainStore {
    fn find_by_name(&self, name: &str) -> Result<Option<Domain>, StoreError> {
        if !self.first_lookup_done.swap(true, Ordering::SeqCst) {
            return Ok(None);
        }
        self.inner.find_by_name(name)
    }

    fn insert(&self, _domain: Domain) -> Result<Domain, StoreError> {
        Err(StoreError::Conflict)
    }

    fn update(&self, domain: Domain) -> Result<(), StoreError> {
        self.inner.update(domain)
    }
}

pub(super) struct UnavailableDomainStore;

impl DomainStore for UnavailableDomainStore {
    fn find_by_name(&self, _name: &str) -> Result<Option<Domain>, StoreError> {
        Err(StoreError::Unavailable("store offline".to_string()))
    }

    fn insert(&self, _domain: Domain) -> Result<Domain, StoreError> {
        Err(StoreError::Unavailable("store offline".to_string()))
    }

    fn update(&self, _domain: Domain) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("store offline".to_string()))
    }
}

/// Fetcher returning fixed content for every URL.
pub(super) struct StaticFetcher(pub(super) String);

#[async_trait]
impl ContentFetcher for StaticFetcher {
    async fn fetch(&self, _url: &str) -> Result<String, FetchError> {
        Ok(self.0.clone())
    }
}

/// Fetcher failing deterministically with an upstream status.
pub(super) struct FailingFetcher;

#[async_trait]
impl ContentFetcher for FailingFetcher {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        Err(FetchError::Status {
            url: url.to_string(),
            status: 503,
        })
    }
}

/// Canned analyzer that counts invocations so tests can assert it was
/// never reached.
#[derive(Default)]
pub(super) struct CountingAnalyzer {
    pub(super) calls: AtomicU64,
}

#[async_trait]
impl PolicyAnalyzer for CountingAnalyzer {
    async fn analyze(&self, _content: &str) -> Result<AnalysisReport, AnalysisError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(CannedAnalyzer::report())
    }

    fn descriptor(&self) -> String {
        "counting-canned".to_string()
    }

    fn prompt(&self) -> String {
        "none".to_string()
    }
}

/// Generator that always fails, for failed-analysis paths.
pub(super) struct FailingGenerator;

#[async_trait]
impl TextGenerator for FailingGenerator {
    async fn generate(&self, _prompt: &str) -> Result<String, GenerateError> {
        Err(GenerateError("model unavailable".to_string()))
    }
}

/// Generator replaying a scripted reply.
pub(super) struct ScriptedGenerator(pub(super) String);

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, _prompt: &str) -> Result<String, GenerateError> {
        Ok(self.0.clone())
    }
}

pub(super) type MemoryService<F, A> =
    PolicyService<MemoryDomainStore, MemoryPolicyStore, F, A>;

pub(super) fn memory_service<F, A>(
    domains: Arc<MemoryDomainStore>,
    policies: Arc<MemoryPolicyStore>,
    fetcher: Arc<F>,
    analyzer: Arc<A>,
) -> MemoryService<F, A>
where
    F: ContentFetcher + 'static,
    A: PolicyAnalyzer + 'static,
{
    PolicyService::new(domains, policies, fetcher, analyzer)
}

pub(super) fn save_command(domain: &str, base_url: Option<&str>) -> SavePoliciesCommand {
    SavePoliciesCommand {
        domain: domain.to_string(),
        base_url: base_url.map(str::to_string),
        legal_entity_name: None,
        policies: vec![PolicyDescriptor {
            url: Some(format!("https://{domain}/privacy")),
            policy_type: Some("privacy_policy".to_string()),
            title: Some("Privacy".to_string()),
        }],
    }
}

pub(super) async fn response_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("response body");
    serde_json::from_slice(&bytes).expect("response is JSON")
}
