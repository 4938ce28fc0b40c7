use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use tracing::{error, info, warn};
use url::Url;

use super::analyzer::{AnalysisError, PolicyAnalyzer};
use super::domain::{
    Domain, DomainId, DomainStatus, Policy, PolicyDescriptor, PolicyId, PolicyStatus,
};
use super::fetch::{ContentFetcher, FetchError};
use super::store::{DomainStore, PolicyStore, StoreError};

/// Service composing the stores, the content fetcher, and the analyzer.
pub struct PolicyService<D, P, F, A> {
    domains: Arc<D>,
    policies: Arc<P>,
    fetcher: Arc<F>,
    analyzer: Arc<A>,
}

static DOMAIN_SEQUENCE: AtomicU64 = AtomicU64::new(1);
static POLICY_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_domain_id() -> DomainId {
    let id = DOMAIN_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    DomainId(format!("dom-{id:06}"))
}

fn next_policy_id() -> PolicyId {
    let id = POLICY_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    PolicyId(format!("pol-{id:06}"))
}

/// Validated save-policies request after the router has checked field
/// presence.
#[derive(Debug, Clone)]
pub struct SavePoliciesCommand {
    pub domain: String,
    pub base_url: Option<String>,
    pub legal_entity_name: Option<String>,
    pub policies: Vec<PolicyDescriptor>,
}

#[derive(Debug, Clone)]
pub struct SavePoliciesOutcome {
    pub domain_id: DomainId,
    pub total_policies: u64,
    pub new_policies: u64,
}

#[derive(Debug, Clone)]
pub struct AnalyzeOutcome {
    pub policy_id: PolicyId,
}

impl<D, P, F, A> PolicyService<D, P, F, A>
where
    D: DomainStore + 'static,
    P: PolicyStore + 'static,
    F: ContentFetcher + 'static,
    A: PolicyAnalyzer + 'static,
{
    pub fn new(domains: Arc<D>, policies: Arc<P>, fetcher: Arc<F>, analyzer: Arc<A>) -> Self {
        Self {
            domains,
            policies,
            fetcher,
            analyzer,
        }
    }

    /// Return the domain registered under `name`, creating it when absent.
    /// Creation requires `base_url`. An insert conflict means another
    /// request created the row first; the winner is re-read and returned.
    pub fn ensure_domain(
        &self,
        name: &str,
        base_url: Option<&str>,
        legal_entity_name: Option<&str>,
    ) -> Result<Domain, PolicyServiceError> {
        if let Some(existing) = self.domains.find_by_name(name)? {
            return Ok(existing);
        }

        let base_url = base_url.ok_or_else(|| {
            PolicyServiceError::Validation(
                "base_url is required when creating a new domain".to_string(),
            )
        })?;

        let domain = Domain {
            id: next_domain_id(),
            name: name.to_string(),
            base_url: base_url.to_string(),
            legal_entity_name: legal_entity_name
                .filter(|value| !value.is_empty())
                .map(str::to_string),
            policy_count: 0,
            processing_status: DomainStatus::Pending,
            updated_at: Utc::now(),
        };

        match self.domains.insert(domain) {
            Ok(created) => {
                info!(name, id = %created.id.0, "created domain");
                Ok(created)
            }
            Err(StoreError::Conflict) => self
                .domains
                .find_by_name(name)?
                .ok_or(PolicyServiceError::Store(StoreError::NotFound)),
            Err(err) => Err(err.into()),
        }
    }

    /// Return the policy registered under `url`, creating it when absent.
    /// The URL is the global dedup key: an existing row is returned
    /// unchanged even when the caller's domain differs (first writer wins).
    pub fn ensure_policy(
        &self,
        domain_id: &DomainId,
        url: &str,
        policy_type: Option<&str>,
        title: Option<&str>,
        entry_status: PolicyStatus,
    ) -> Result<(Policy, bool), PolicyServiceError> {
        if let Some(existing) = self.policies.find_by_url(url)? {
            if existing.domain_id != *domain_id {
                warn!(
                    url,
                    stored = %existing.domain_id.0,
                    requested = %domain_id.0,
                    "policy already registered under another domain, keeping stored owner"
                );
            }
            return Ok((existing, false));
        }

        let policy = Policy {
            id: next_policy_id(),
            domain_id: domain_id.clone(),
            policy_type: policy_type.unwrap_or("unknown").to_string(),
            page_name: title.unwrap_or("Untitled").to_string(),
            page_url: url.to_string(),
            processing_status: entry_status,
            checksum: None,
            llm_details: None,
            llm_prompt: None,
            processing_output: None,
            last_updated_at: Utc::now(),
        };

        match self.policies.insert(policy) {
            Ok(created) => {
                info!(url, id = %created.id.0, "created policy");
                Ok((created, true))
            }
            Err(StoreError::Conflict) => self
                .policies
                .find_by_url(url)?
                .map(|existing| (existing, false))
                .ok_or(PolicyServiceError::Store(StoreError::NotFound)),
            Err(err) => Err(err.into()),
        }
    }

    /// Register a batch of policy pages for a domain without reprocessing
    /// existing ones, then refresh the domain's aggregate count and status.
    pub fn save_policies(
        &self,
        command: SavePoliciesCommand,
    ) -> Result<SavePoliciesOutcome, PolicyServiceError> {
        let domain = self.ensure_domain(
            &command.domain,
            command.base_url.as_deref(),
            command.legal_entity_name.as_deref(),
        )?;

        let mut new_policies = 0u64;
        for descriptor in &command.policies {
            let url = descriptor.url.as_deref().unwrap_or_default().trim();
            if url.is_empty() {
                warn!(domain = %domain.id.0, "skipping policy with missing URL");
                continue;
            }
            let (_, created) = self.ensure_policy(
                &domain.id,
                url,
                descriptor.policy_type.as_deref(),
                descriptor.title.as_deref(),
                PolicyStatus::NotProcessed,
            )?;
            if created {
                new_policies += 1;
            }
        }

        // Live count rather than old_count + new, to stay correct under
        // partial prior state.
        let total_policies = self.policies.list_by_domain(&domain.id)?.len() as u64;

        let mut updated = domain.clone();
        updated.policy_count = total_policies;
        updated.updated_at = Utc::now();
        if new_policies > 0 {
            updated.processing_status = DomainStatus::PendingAnalysis;
        }
        self.domains.update(updated)?;

        info!(
            domain = %command.domain,
            total_policies,
            new_policies,
            "saved policy batch"
        );

        Ok(SavePoliciesOutcome {
            domain_id: domain.id,
            total_policies,
            new_policies,
        })
    }

    /// Analyze one URL end to end, creating domain/policy rows as needed.
    pub async fn analyze_policy(
        &self,
        url: &str,
        title: &str,
    ) -> Result<AnalyzeOutcome, PolicyServiceError> {
        let parsed = Url::parse(url).map_err(|_| PolicyServiceError::InvalidUrl)?;
        let host = parsed
            .host_str()
            .ok_or(PolicyServiceError::InvalidUrl)?
            .to_string();
        let synthesized_base = format!("{}://{}", parsed.scheme(), host);

        let domain = self.ensure_domain(&host, Some(&synthesized_base), None)?;
        let (policy, _) = self.ensure_policy(
            &domain.id,
            url,
            Some("privacy_policy"),
            Some(title),
            PolicyStatus::NotProcessed,
        )?;

        let content = match self.fetcher.fetch(url).await {
            Ok(content) => content,
            Err(err) => {
                error!(url, %err, "failed to fetch policy content");
                self.record_failure(&policy, PolicyStatus::FailedFetch);
                return Err(err.into());
            }
        };

        let mut policy = policy;
        self.transition(&mut policy, PolicyStatus::Processing)?;

        let report = match self.analyzer.analyze(&content).await {
            Ok(report) => report,
            Err(err) => {
                error!(url, %err, "policy analysis failed");
                self.record_failure(&policy, PolicyStatus::FailedAnalysis);
                return Err(err.into());
            }
        };

        policy.processing_status = PolicyStatus::Processed;
        policy.last_updated_at = Utc::now();
        policy.llm_details = Some(self.analyzer.descriptor());
        policy.llm_prompt = Some(self.analyzer.prompt());
        policy.processing_output = Some(serde_json::to_string(&report)?);
        self.policies.update(policy.clone())?;

        info!(url, policy_id = %policy.id.0, "policy analyzed and saved");
        Ok(AnalyzeOutcome {
            policy_id: policy.id,
        })
    }

    /// Fetch a domain's aggregate state; absence is a normal outcome.
    pub fn get_domain(&self, name: &str) -> Result<Option<Domain>, PolicyServiceError> {
        self.domains.find_by_name(name).map_err(Into::into)
    }

    /// Ordered policies for a domain; empty for unknown domains.
    pub fn get_policies(&self, domain_id: &DomainId) -> Result<Vec<Policy>, PolicyServiceError> {
        self.policies.list_by_domain(domain_id).map_err(Into::into)
    }

    /// Checked status transition, persisted immediately.
    fn transition(
        &self,
        policy: &mut Policy,
        next: PolicyStatus,
    ) -> Result<(), PolicyServiceError> {
        if !policy.processing_status.can_transition(next) {
            warn!(
                policy_id = %policy.id.0,
                from = policy.processing_status.label(),
                to = next.label(),
                "rejected invalid status transition"
            );
            return Err(PolicyServiceError::InvalidTransition {
                from: policy.processing_status.label(),
                to: next.label(),
            });
        }
        policy.processing_status = next;
        policy.last_updated_at = Utc::now();
        self.policies.update(policy.clone())?;
        Ok(())
    }

    /// Best-effort failure transition: a secondary store failure here is
    /// logged, not raised, so the caller still reports the original error.
    fn record_failure(&self, policy: &Policy, status: PolicyStatus) {
        if !policy.processing_status.can_transition(status) {
            warn!(
                policy_id = %policy.id.0,
                from = policy.processing_status.label(),
                to = status.label(),
                "skipping failure status outside the transition table"
            );
            return;
        }
        let mut failed = policy.clone();
        failed.processing_status = status;
        failed.last_updated_at = Utc::now();
        if let Err(err) = self.policies.update(failed) {
            error!(
                policy_id = %policy.id.0,
                status = status.label(),
                %err,
                "failed to record failure status"
            );
        }
    }
}

/// Error raised by the policy service.
#[derive(Debug, thiserror::Error)]
pub enum PolicyServiceError {
    #[error("invalid request: {0}")]
    Validation(String),
    #[error("invalid URL provided")]
    InvalidUrl,
    #[error("failed to fetch policy content: {0}")]
    Fetch(#[from] FetchError),
    #[error("policy analysis failed: {0}")]
    Analysis(#[from] AnalysisError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("failed to serialize analysis output: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("invalid status transition from {from} to {to}")]
    InvalidTransition {
        from: &'static str,
        to: &'static str,
    },
}
