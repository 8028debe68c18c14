//! Integration tests for PipelineEngine.
//!
//! These tests verify that the PipelineEngine:
//! - Executes steps strictly in order, one completion call per step
//! - Hands exactly the named context artifacts to each step
//! - Stops at the first failing step without a partial result
//! - Emits the documented event sequence

mod common;

use common::*;
use pl_core::engine::PipelineEngine;
use pl_core::providers::{MockProvider, ProviderError};
use pl_core::PipelineError;
use pl_protocol::config_models::LlmSettings;
use pl_protocol::ipc::Event;
use pl_protocol::pipeline_models::InputSpec;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

fn engine(provider: &MockProvider) -> PipelineEngine {
    PipelineEngine::new(Arc::new(provider.clone()), &LlmSettings::default())
}

#[tokio::test]
async fn test_joke_pipeline_end_to_end() {
    let (pipeline, roles) = create_joke_pipeline();
    let provider = MockProvider::scripted([
        "Why did the scarecrow win an award? He was outstanding in his field.",
        "7/10 - classic wordplay.",
    ]);
    let (events_tx, mut events_rx) = mpsc::channel(100);

    let outcome = engine(&provider)
        .run(&pipeline, &roles, &params(&[("joke_type", "dad")]), &events_tx)
        .await
        .expect("run should succeed");

    assert_eq!(outcome.final_text(), "7/10 - classic wordplay.");
    assert_eq!(outcome.intermediate().len(), 1);
    assert_eq!(outcome.intermediate()[0].step_id, "joke");

    let requests = provider.requests();
    assert_eq!(requests.len(), 2);
    assert!(requests[0].prompt.contains("Create a hilarious dad joke."));
    assert!(!requests[0].prompt.contains("Context from earlier steps"));
    assert!(requests[1]
        .prompt
        .contains("Why did the scarecrow win an award? He was outstanding in his field."));

    assert_eq!(
        event_names(&drain_events(&mut events_rx)),
        vec![
            "RunStarted",
            "StepStarted(joke)",
            "StepCompleted(joke)",
            "StepStarted(judge)",
            "StepCompleted(judge)",
            "RunCompleted",
        ]
    );
}

#[tokio::test]
async fn test_only_named_context_is_forwarded() {
    let roles = vec![create_test_role("writer")];
    let pipeline = create_test_pipeline(
        "three-steps",
        vec![],
        vec![
            create_test_step("a", "writer", "Step A", &[]),
            create_test_step("b", "writer", "Step B", &[]),
            create_test_step("c", "writer", "Step C", &["a"]),
        ],
    );
    let provider = MockProvider::scripted(["output of a", "output of b", "output of c"]);
    let (events_tx, _events_rx) = mpsc::channel(100);

    engine(&provider)
        .run(&pipeline, &roles, &params(&[]), &events_tx)
        .await
        .expect("run should succeed");

    let requests = provider.requests();
    assert!(!requests[1].prompt.contains("output of a"));
    assert!(requests[2].prompt.contains("output of a"));
    assert!(!requests[2].prompt.contains("output of b"));
}

#[tokio::test]
async fn test_context_is_presented_in_listed_order() {
    let roles = vec![create_test_role("writer")];
    let pipeline = create_test_pipeline(
        "ordered",
        vec![],
        vec![
            create_test_step("first", "writer", "One", &[]),
            create_test_step("second", "writer", "Two", &[]),
            create_test_step("third", "writer", "Three", &["second", "first"]),
        ],
    );
    let provider = MockProvider::scripted(["FIRST-TEXT", "SECOND-TEXT", "done"]);
    let (events_tx, _events_rx) = mpsc::channel(100);

    engine(&provider)
        .run(&pipeline, &roles, &params(&[]), &events_tx)
        .await
        .expect("run should succeed");

    let requests = provider.requests();
    let prompt = &requests[2].prompt;
    let second = prompt.find("SECOND-TEXT").expect("second artifact present");
    let first = prompt.find("FIRST-TEXT").expect("first artifact present");
    assert!(second < first, "context should follow the listed order");
}

#[tokio::test]
async fn test_failure_stops_later_steps() {
    let roles = vec![create_test_role("writer")];
    let pipeline = create_test_pipeline(
        "fails-midway",
        vec![],
        vec![
            create_test_step("one", "writer", "One", &[]),
            create_test_step("two", "writer", "Two", &["one"]),
            create_test_step("three", "writer", "Three", &["two"]),
        ],
    );
    let provider = MockProvider::with_results([
        Ok("fine".to_string()),
        Err(ProviderError::Api {
            status: 429,
            message: "Rate limit reached".to_string(),
        }),
    ]);
    let (events_tx, mut events_rx) = mpsc::channel(100);

    let err = engine(&provider)
        .run(&pipeline, &roles, &params(&[]), &events_tx)
        .await
        .expect_err("run should fail");

    assert_eq!(
        err,
        PipelineError::ExternalService {
            step: "two".to_string(),
            message: "API returned error: 429 - Rate limit reached".to_string(),
        }
    );
    assert_eq!(provider.call_count(), 2);

    let events = drain_events(&mut events_rx);
    assert!(!events
        .iter()
        .any(|e| matches!(e, Event::RunCompleted { .. })));
    assert!(!event_names(&events).contains(&"StepStarted(three)".to_string()));
    assert_contains_ci(failure_message(&events).expect("RunFailed"), "rate limit");
}

#[tokio::test]
async fn test_missing_required_input_makes_no_calls() {
    let (pipeline, roles) = create_joke_pipeline();
    let provider = MockProvider::echo();
    let (events_tx, mut events_rx) = mpsc::channel(100);

    let err = engine(&provider)
        .run(&pipeline, &roles, &params(&[("joke_type", "")]), &events_tx)
        .await
        .expect_err("blank input is rejected");

    assert!(matches!(err, PipelineError::Validation(_)));
    assert_eq!(provider.call_count(), 0);

    let events = drain_events(&mut events_rx);
    assert_eq!(event_names(&events), vec!["RunFailed"]);
    assert!(matches!(events[0], Event::RunFailed { run_id: None, .. }));
}

#[tokio::test]
async fn test_pipeline_vars_fill_role_instructions() {
    let mut strategist = create_test_role("strategist");
    strategist.backstory = "OUR SERVICES:\n{services}".to_string();
    let mut pipeline = create_test_pipeline(
        "pitch",
        vec![InputSpec::required("url")],
        vec![create_test_step("pick", "strategist", "Pick a service for {url}", &[])],
    );
    pipeline
        .vars
        .insert("services".to_string(), "1. SEO\n2. AI Automation".to_string());
    let provider = MockProvider::scripted(["AI Automation"]);
    let (events_tx, _events_rx) = mpsc::channel(100);

    engine(&provider)
        .run(
            &pipeline,
            &[strategist],
            &params(&[("url", "https://acme.test")]),
            &events_tx,
        )
        .await
        .expect("run should succeed");

    let requests = provider.requests();
    assert!(requests[0].system.contains("2. AI Automation"));
    assert!(requests[0].prompt.contains("Pick a service for https://acme.test"));
}

#[tokio::test]
async fn test_fetch_page_roles_get_page_text() {
    let roles = vec![create_fetching_role("analyst"), create_test_role("writer")];
    let pipeline = create_test_pipeline(
        "site",
        vec![InputSpec::required("url")],
        vec![
            create_test_step("analyze", "analyst", "Analyze {url}", &[]),
            create_test_step("write", "writer", "Write about {url}", &["analyze"]),
        ],
    );
    let fetcher = Arc::new(
        StaticFetcher::default().with_page("https://acme.test", "Acme builds rockets"),
    );
    let provider = MockProvider::scripted(["analysis", "email"]);
    let (events_tx, _events_rx) = mpsc::channel(100);

    engine(&provider)
        .with_fetcher(fetcher.clone())
        .run(
            &pipeline,
            &roles,
            &params(&[("url", "https://acme.test")]),
            &events_tx,
        )
        .await
        .expect("run should succeed");

    assert_eq!(fetcher.fetched(), vec!["https://acme.test"]);
    let requests = provider.requests();
    assert!(requests[0].prompt.contains("Acme builds rockets"));
    assert!(!requests[1].prompt.contains("Acme builds rockets"));
}

#[tokio::test]
async fn test_unreachable_page_fails_the_step() {
    let roles = vec![create_fetching_role("analyst")];
    let pipeline = create_test_pipeline(
        "site",
        vec![InputSpec::required("url")],
        vec![create_test_step("analyze", "analyst", "Analyze {url}", &[])],
    );
    let provider = MockProvider::echo();
    let (events_tx, _events_rx) = mpsc::channel(100);

    let err = engine(&provider)
        .with_fetcher(Arc::new(StaticFetcher::default()))
        .run(
            &pipeline,
            &roles,
            &params(&[("url", "https://missing.test")]),
            &events_tx,
        )
        .await
        .expect_err("fetch failure is fatal");

    match err {
        PipelineError::ExternalService { step, message } => {
            assert_eq!(step, "analyze");
            assert!(message.contains("404"), "{message}");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(provider.call_count(), 0);
}

#[tokio::test]
async fn test_slow_step_times_out() {
    let (pipeline, roles) = create_joke_pipeline();
    let provider = Arc::new(SlowProvider::new(Duration::from_secs(5), "too late"));
    let (events_tx, _events_rx) = mpsc::channel(100);

    let err = PipelineEngine::new(provider, &LlmSettings::default())
        .with_step_timeout(Duration::from_millis(50))
        .run(&pipeline, &roles, &params(&[("joke_type", "pun")]), &events_tx)
        .await
        .expect_err("step should time out");

    match err {
        PipelineError::ExternalService { step, message } => {
            assert_eq!(step, "joke");
            assert!(message.contains("did not answer"), "{message}");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_closed_event_channel_does_not_stop_the_run() {
    let (pipeline, roles) = create_joke_pipeline();
    let provider = MockProvider::scripted(["joke", "rating"]);
    let (events_tx, events_rx) = mpsc::channel(100);
    drop(events_rx);

    let outcome = engine(&provider)
        .run(&pipeline, &roles, &params(&[("joke_type", "pun")]), &events_tx)
        .await
        .expect("run should succeed");

    assert_eq!(outcome.final_text(), "rating");
}

#[tokio::test]
async fn test_request_uses_settings() {
    let (pipeline, roles) = create_joke_pipeline();
    let provider = MockProvider::scripted(["joke", "rating"]);
    let settings = LlmSettings {
        temperature: 0.1,
        max_tokens: 64,
        ..LlmSettings::default()
    };
    let (events_tx, _events_rx) = mpsc::channel(100);

    PipelineEngine::new(Arc::new(provider.clone()), &settings)
        .run(&pipeline, &roles, &params(&[("joke_type", "pun")]), &events_tx)
        .await
        .expect("run should succeed");

    for request in provider.requests() {
        assert_eq!(request.model, "scripted");
        assert_eq!(request.max_tokens, 64);
        assert!((request.temperature - 0.1).abs() < f32::EPSILON);
    }
}
