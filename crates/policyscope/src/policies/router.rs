use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::json;
use tracing::error;

use super::analyzer::PolicyAnalyzer;
use super::domain::{DomainId, PolicyDescriptor};
use super::fetch::ContentFetcher;
use super::service::{PolicyService, PolicyServiceError, SavePoliciesCommand};
use super::store::{DomainStore, PolicyStore};

/// Router builder exposing the policy tracking/analysis endpoints.
pub fn policy_router<D, P, F, A>(service: Arc<PolicyService<D, P, F, A>>) -> Router
where
    D: DomainStore + 'static,
    P: PolicyStore + 'static,
    F: ContentFetcher + 'static,
    A: PolicyAnalyzer + 'static,
{
    Router::new()
        .route("/get-domain/:domain_name", get(get_domain_handler::<D, P, F, A>))
        .route("/save-policies", post(save_policies_handler::<D, P, F, A>))
        .route(
            "/get-policies/:domain_id",
            get(get_policies_handler::<D, P, F, A>),
        )
        .route("/analyze-policy", post(analyze_policy_handler::<D, P, F, A>))
        .with_state(service)
}

/// Request body for `/save-policies`. Fields are optional so missing ones
/// surface as a 400 with an `{"error": …}` body instead of a rejection.
#[derive(Debug, Deserialize)]
pub struct SavePoliciesRequest {
    pub domain: Option<String>,
    pub base_url: Option<String>,
    pub legal_entity_name: Option<String>,
    pub policies: Option<Vec<PolicyDescriptor>>,
}

/// Request body for `/analyze-policy`.
#[derive(Debug, Deserialize)]
pub struct AnalyzePolicyRequest {
    pub url: Option<String>,
    pub title: Option<String>,
}

pub(crate) async fn get_domain_handler<D, P, F, A>(
    State(service): State<Arc<PolicyService<D, P, F, A>>>,
    Path(domain_name): Path<String>,
) -> Response
where
    D: DomainStore + 'static,
    P: PolicyStore + 'static,
    F: ContentFetcher + 'static,
    A: PolicyAnalyzer + 'static,
{
    match service.get_domain(&domain_name) {
        Ok(Some(domain)) => (StatusCode::OK, axum::Json(domain.summary_view())).into_response(),
        Ok(None) => {
            let payload = json!({ "exists": false });
            (StatusCode::NOT_FOUND, axum::Json(payload)).into_response()
        }
        Err(err) => error_response(err),
    }
}

pub(crate) async fn save_policies_handler<D, P, F, A>(
    State(service): State<Arc<PolicyService<D, P, F, A>>>,
    axum::Json(request): axum::Json<SavePoliciesRequest>,
) -> Response
where
    D: DomainStore + 'static,
    P: PolicyStore + 'static,
    F: ContentFetcher + 'static,
    A: PolicyAnalyzer + 'static,
{
    let (domain, policies) = match (request.domain, request.policies) {
        (Some(domain), Some(policies)) => (domain, policies),
        _ => {
            let payload = json!({ "error": "Invalid request: domain and policies are required" });
            return (StatusCode::BAD_REQUEST, axum::Json(payload)).into_response();
        }
    };

    let command = SavePoliciesCommand {
        domain,
        base_url: request.base_url,
        legal_entity_name: request.legal_entity_name,
        policies,
    };

    match service.save_policies(command) {
        Ok(_) => {
            let payload = json!({ "message": "Policies processed successfully" });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(err) => error_response(err),
    }
}

pub(crate) async fn get_policies_handler<D, P, F, A>(
    State(service): State<Arc<PolicyService<D, P, F, A>>>,
    Path(domain_id): Path<String>,
) -> Response
where
    D: DomainStore + 'static,
    P: PolicyStore + 'static,
    F: ContentFetcher + 'static,
    A: PolicyAnalyzer + 'static,
{
    match service.get_policies(&DomainId(domain_id)) {
        Ok(policies) => {
            let views: Vec<_> = policies.iter().map(|policy| policy.view()).collect();
            (StatusCode::OK, axum::Json(views)).into_response()
        }
        Err(err) => error_response(err),
    }
}

pub(crate) async fn analyze_policy_handler<D, P, F, A>(
    State(service): State<Arc<PolicyService<D, P, F, A>>>,
    axum::Json(request): axum::Json<AnalyzePolicyRequest>,
) -> Response
where
    D: DomainStore + 'static,
    P: PolicyStore + 'static,
    F: ContentFetcher + 'static,
    A: PolicyAnalyzer + 'static,
{
    let (url, title) = match (request.url, request.title) {
        (Some(url), Some(title)) => (url, title),
        _ => {
            let payload = json!({ "error": "Invalid request: \"url\" and \"title\" are required." });
            return (StatusCode::BAD_REQUEST, axum::Json(payload)).into_response();
        }
    };

    match service.analyze_policy(&url, &title).await {
        Ok(outcome) => {
            let payload = json!({
                "message": "Policy analyzed and saved successfully.",
                "policy_id": outcome.policy_id.0,
            });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(err) => error_response(err),
    }
}

/// Single mapping from service errors to HTTP responses. Store internals
/// are logged, never leaked to the client.
fn error_response(err: PolicyServiceError) -> Response {
    match err {
        PolicyServiceError::Validation(_) | PolicyServiceError::InvalidUrl => {
            let payload = json!({ "error": err.to_string() });
            (StatusCode::BAD_REQUEST, axum::Json(payload)).into_response()
        }
        PolicyServiceError::Fetch(_) | PolicyServiceError::Analysis(_) => {
            let payload = json!({ "error": err.to_string() });
            (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
        }
        other => {
            error!(%other, "internal error handling policy request");
            let payload = json!({ "error": "internal server error" });
            (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
        }
    }
}
