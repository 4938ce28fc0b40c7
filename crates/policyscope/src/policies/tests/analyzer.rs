use super::common::*;
use crate::policies::analyzer::{
    parse_reply, AnalysisError, CannedAnalyzer, GenerativeAnalyzer, PolicyAnalyzer,
};
use crate::policies::domain::AnalysisReport;

#[test]
fn parse_reply_splits_three_sections() {
    let reply = "The policy is broad.\n\nCollects location data\nShares with partners\n\nNo retention limit";
    let report = parse_reply(reply);
    assert_eq!(report.summary, "The policy is broad.");
    assert_eq!(
        report.key_points,
        vec!["Collects location data", "Shares with partners"]
    );
    assert_eq!(report.concerns, vec!["No retention limit"]);
}

#[test]
fn parse_reply_tolerates_missing_sections() {
    let report = parse_reply("Just a summary.");
    assert_eq!(report.summary, "Just a summary.");
    assert!(report.key_points.is_empty());
    assert!(report.concerns.is_empty());

    let report = parse_reply("");
    assert_eq!(report.summary, "");
    assert!(report.key_points.is_empty());
    assert!(report.concerns.is_empty());
}

#[test]
fn parse_reply_handles_crlf_and_padding() {
    let reply = "Summary line.\r\n\r\n  First point  \r\nSecond point\r\n\r\nOnly concern";
    let report = parse_reply(reply);
    assert_eq!(report.summary, "Summary line.");
    assert_eq!(report.key_points, vec!["First point", "Second point"]);
    assert_eq!(report.concerns, vec!["Only concern"]);
}

#[tokio::test]
async fn generative_analyzer_parses_scripted_reply() {
    let analyzer = GenerativeAnalyzer::new(
        ScriptedGenerator("A tight summary.\n\nPoint one\n\nConcern one".to_string()),
        "test-model".to_string(),
        "Analyze.".to_string(),
    );

    let report = analyzer.analyze("policy text").await.expect("parses");
    assert_eq!(report.summary, "A tight summary.");
    assert_eq!(report.key_points, vec!["Point one"]);
    assert_eq!(report.concerns, vec!["Concern one"]);
    assert_eq!(analyzer.descriptor(), "test-model");
    assert_eq!(analyzer.prompt(), "Analyze.");
}

#[tokio::test]
async fn generative_analyzer_surfaces_generation_failure() {
    let analyzer = GenerativeAnalyzer::new(
        FailingGenerator,
        "test-model".to_string(),
        "Analyze.".to_string(),
    );

    match analyzer.analyze("policy text").await {
        Err(AnalysisError::Generation(message)) => {
            assert!(message.contains("model unavailable"));
        }
        other => panic!("expected generation error, got {other:?}"),
    }
}

#[tokio::test]
async fn canned_analyzer_is_deterministic() {
    let first = CannedAnalyzer.analyze("anything").await.expect("canned");
    let second = CannedAnalyzer.analyze("else").await.expect("canned");
    assert_eq!(first, second);
    assert_eq!(first.key_points.len(), 3);
    assert_eq!(first.concerns.len(), 2);
}

#[test]
fn analysis_report_round_trips_with_camel_case_key() {
    let report = CannedAnalyzer::report();
    let serialized = serde_json::to_string(&report).expect("serializes");
    assert!(serialized.contains("\"keyPoints\""));

    let restored: AnalysisReport = serde_json::from_str(&serialized).expect("deserializes");
    assert_eq!(restored, report);
}
