//! Policy tracking and analysis: domain/policy records, store contracts,
//! content fetching, the analyzer strategies, and the HTTP surface that
//! orchestrates them.

pub mod analyzer;
pub mod domain;
pub mod fetch;
pub mod router;
pub mod service;
pub mod store;

#[cfg(test)]
mod tests;

pub use analyzer::{
    AnalysisError, CannedAnalyzer, GenerateError, GenerativeAnalyzer, PolicyAnalyzer,
    TextGenerator,
};
pub use domain::{
    AnalysisReport, Domain, DomainId, DomainStatus, DomainSummaryView, Policy, PolicyDescriptor,
    PolicyId, PolicyStatus, PolicyView,
};
pub use fetch::{ContentFetcher, FetchError, HttpContentFetcher};
pub use router::{policy_router, AnalyzePolicyRequest, SavePoliciesRequest};
pub use service::{
    AnalyzeOutcome, PolicyService, PolicyServiceError, SavePoliciesCommand, SavePoliciesOutcome,
};
pub use store::{DomainStore, PolicyStore, StoreError};
