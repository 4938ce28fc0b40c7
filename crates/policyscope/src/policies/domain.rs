use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier wrapper for tracked domains.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DomainId(pub String);

/// Identifier wrapper for tracked policy pages.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PolicyId(pub String);

/// Aggregate processing state tracked per domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DomainStatus {
    Pending,
    PendingAnalysis,
    Processed,
    Failed,
}

impl DomainStatus {
    pub const fn label(self) -> &'static str {
        match self {
            DomainStatus::Pending => "pending",
            DomainStatus::PendingAnalysis => "pending_analysis",
            DomainStatus::Processed => "processed",
            DomainStatus::Failed => "failed",
        }
    }
}

/// Per-policy processing state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyStatus {
    NotProcessed,
    PendingAnalysis,
    Processing,
    Processed,
    FailedFetch,
    FailedAnalysis,
}

impl PolicyStatus {
    pub const fn label(self) -> &'static str {
        match self {
            PolicyStatus::NotProcessed => "not_processed",
            PolicyStatus::PendingAnalysis => "pending_analysis",
            PolicyStatus::Processing => "processing",
            PolicyStatus::Processed => "processed",
            PolicyStatus::FailedFetch => "failed_fetch",
            PolicyStatus::FailedAnalysis => "failed_analysis",
        }
    }

    /// Closed transition table. Terminal-looking states still admit
    /// `Processing`/`FailedFetch` so a repeat analyze request can reprocess
    /// the same URL instead of dead-ending.
    pub const fn can_transition(self, next: PolicyStatus) -> bool {
        use PolicyStatus::*;
        matches!(
            (self, next),
            (NotProcessed, Processing)
                | (NotProcessed, FailedFetch)
                | (NotProcessed, PendingAnalysis)
                | (PendingAnalysis, Processing)
                | (PendingAnalysis, FailedFetch)
                | (Processing, Processed)
                | (Processing, FailedAnalysis)
                | (Processed, Processing)
                | (Processed, FailedFetch)
                | (FailedFetch, Processing)
                | (FailedFetch, FailedFetch)
                | (FailedAnalysis, Processing)
                | (FailedAnalysis, FailedFetch)
        )
    }
}

/// A website identified by hostname, owning zero or more policies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Domain {
    pub id: DomainId,
    pub name: String,
    pub base_url: String,
    pub legal_entity_name: Option<String>,
    pub policy_count: u64,
    pub processing_status: DomainStatus,
    pub updated_at: DateTime<Utc>,
}

impl Domain {
    pub fn summary_view(&self) -> DomainSummaryView {
        DomainSummaryView {
            exists: true,
            policy_count: self.policy_count,
            processing_status: self.processing_status.label(),
            updated_at: self.updated_at,
        }
    }
}

/// A single tracked legal/privacy document page, identified by URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Policy {
    pub id: PolicyId,
    pub domain_id: DomainId,
    pub policy_type: String,
    pub page_name: String,
    pub page_url: String,
    pub processing_status: PolicyStatus,
    /// Reserved for content-change detection; never populated or compared.
    pub checksum: Option<String>,
    pub llm_details: Option<String>,
    pub llm_prompt: Option<String>,
    pub processing_output: Option<String>,
    pub last_updated_at: DateTime<Utc>,
}

impl Policy {
    pub fn view(&self) -> PolicyView {
        PolicyView {
            id: self.id.clone(),
            domain_id: self.domain_id.clone(),
            policy_type: self.policy_type.clone(),
            page_name: self.page_name.clone(),
            page_url: self.page_url.clone(),
            processing_status: self.processing_status.label(),
            checksum: self.checksum.clone(),
            llm_details: self.llm_details.clone(),
            llm_prompt: self.llm_prompt.clone(),
            processing_output: self.processing_output.clone(),
            last_updated_at: self.last_updated_at,
        }
    }
}

/// Structured analysis of a policy page. Serialized into
/// `Policy::processing_output` with the camelCase key the extension client
/// expects, and round-trips exactly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub summary: String,
    #[serde(rename = "keyPoints")]
    pub key_points: Vec<String>,
    pub concerns: Vec<String>,
}

/// One policy page as supplied by the extension in a save-policies batch.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PolicyDescriptor {
    pub url: Option<String>,
    pub policy_type: Option<String>,
    pub title: Option<String>,
}

/// Sanitized representation of a domain's exposed aggregate state.
#[derive(Debug, Clone, Serialize)]
pub struct DomainSummaryView {
    pub exists: bool,
    pub policy_count: u64,
    pub processing_status: &'static str,
    pub updated_at: DateTime<Utc>,
}

/// Sanitized representation of a stored policy row.
#[derive(Debug, Clone, Serialize)]
pub struct PolicyView {
    pub id: PolicyId,
    pub domain_id: DomainId,
    pub policy_type: String,
    pub page_name: String,
    pub page_url: String,
    pub processing_status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checksum: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub llm_details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub llm_prompt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processing_output: Option<String>,
    pub last_updated_at: DateTime<Utc>,
}
