use super::domain::AnalysisReport;
use async_trait::async_trait;

/// Opaque text generation call backing the generative analyzer. HTTP-backed
/// providers live outside the core; tests plug in fakes.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, GenerateError>;
}

#[derive(Debug, thiserror::Error)]
#[error("text generation failed: {0}")]
pub struct GenerateError(pub String);

#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error("analysis generation failed: {0}")]
    Generation(String),
}

/// Turns raw policy text into a structured summary/key-points/concerns
/// triple. The service is the single place that maps an `Err` here to a
/// persisted `failed_analysis` status.
#[async_trait]
pub trait PolicyAnalyzer: Send + Sync {
    async fn analyze(&self, content: &str) -> Result<AnalysisReport, AnalysisError>;
    /// Provenance string stored as `llm_details` on processed policies.
    fn descriptor(&self) -> String;
    /// Prompt provenance stored as `llm_prompt` on processed policies.
    fn prompt(&self) -> String;
}

/// Deterministic placeholder used for testing and demo runs; no model call.
#[derive(Debug, Clone, Copy, Default)]
pub struct CannedAnalyzer;

impl CannedAnalyzer {
    pub fn report() -> AnalysisReport {
        AnalysisReport {
            summary: "This is a summary of the policy.".to_string(),
            key_points: vec![
                "Data is collected for improving services.".to_string(),
                "User consent is required for data sharing.".to_string(),
                "Users can request data deletion.".to_string(),
            ],
            concerns: vec![
                "Data retention periods are unclear.".to_string(),
                "Third-party data sharing is not well-defined.".to_string(),
            ],
        }
    }
}

#[async_trait]
impl PolicyAnalyzer for CannedAnalyzer {
    async fn analyze(&self, _content: &str) -> Result<AnalysisReport, AnalysisError> {
        Ok(Self::report())
    }

    fn descriptor(&self) -> String {
        "canned-placeholder".to_string()
    }

    fn prompt(&self) -> String {
        "none".to_string()
    }
}

/// Prompts a generative model and parses its free-text reply into the
/// structured report.
pub struct GenerativeAnalyzer<G> {
    generator: G,
    model_label: String,
    template: String,
}

impl<G> GenerativeAnalyzer<G> {
    pub fn new(generator: G, model_label: String, template: String) -> Self {
        Self {
            generator,
            model_label,
            template,
        }
    }
}

#[async_trait]
impl<G: TextGenerator> PolicyAnalyzer for GenerativeAnalyzer<G> {
    async fn analyze(&self, content: &str) -> Result<AnalysisReport, AnalysisError> {
        let prompt = format!("{}\n\n{}", self.template, content);
        let reply = self
            .generator
            .generate(&prompt)
            .await
            .map_err(|err| AnalysisError::Generation(err.to_string()))?;
        Ok(parse_reply(&reply))
    }

    fn descriptor(&self) -> String {
        self.model_label.clone()
    }

    fn prompt(&self) -> String {
        self.template.clone()
    }
}

/// Blank-line-separated sections: 0 = summary, 1 = key points (one per
/// line), 2 = concerns (one per line). Missing sections yield empty values,
/// never an error.
pub(crate) fn parse_reply(reply: &str) -> AnalysisReport {
    let normalized = reply.replace("\r\n", "\n");
    let mut sections = normalized
        .split("\n\n")
        .map(str::trim)
        .filter(|section| !section.is_empty());

    let summary = sections.next().unwrap_or_default().to_string();
    let key_points = sections.next().map(split_lines).unwrap_or_default();
    let concerns = sections.next().map(split_lines).unwrap_or_default();

    AnalysisReport {
        summary,
        key_points,
        concerns,
    }
}

fn split_lines(section: &str) -> Vec<String> {
    section
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}
