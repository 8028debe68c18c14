//! Sequential prompt pipeline engine.
//!
//! The PipelineEngine validates a run, then executes its steps strictly in
//! list order. Each step calls the completion service exactly once with the
//! role's instructions, the rendered description and the artifacts of the
//! steps named in its `context`. The first failure ends the run; no partial
//! outcome is returned.

pub mod prepare;

use crate::error::PipelineError;
use crate::fetch::{find_urls, PageFetcher};
use crate::providers::{collect_text, CompletionProvider, CompletionRequest};
use pl_protocol::config_models::LlmSettings;
use pl_protocol::ipc::Event;
use pl_protocol::pipeline_models::PipelineSpec;
use pl_protocol::role_models::{Capability, RoleSpec};
use pl_protocol::run_models::{Artifact, Parameters, RunOutcome};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::Sender;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

pub use prepare::{prepare, PreparedRun, PreparedStep};

/// The main pipeline execution engine.
pub struct PipelineEngine {
    provider: Arc<dyn CompletionProvider>,
    fetcher: Option<Arc<dyn PageFetcher>>,
    temperature: f32,
    max_tokens: u32,
    step_timeout: Duration,
}

impl PipelineEngine {
    /// Create an engine calling `provider` with the generation parameters
    /// of `settings`. The provider must already match `settings.model`.
    pub fn new(provider: Arc<dyn CompletionProvider>, settings: &LlmSettings) -> Self {
        Self {
            provider,
            fetcher: None,
            temperature: settings.temperature,
            max_tokens: settings.max_tokens,
            step_timeout: Duration::from_secs(settings.step_timeout_secs.max(1)),
        }
    }

    /// Enable the `fetch-page` capability. Without a fetcher, roles that
    /// have it run on their description alone.
    pub fn with_fetcher(mut self, fetcher: Arc<dyn PageFetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    pub fn with_step_timeout(mut self, timeout: Duration) -> Self {
        self.step_timeout = timeout;
        self
    }

    /// Run `pipeline` with `inputs`.
    ///
    /// Progress is reported on `events_tx`: `RunStarted`, then `StepStarted`
    /// and `StepCompleted` per step, then `RunCompleted` or `RunFailed`. A
    /// closed channel does not stop the run.
    ///
    /// # Errors
    ///
    /// `InvalidPipeline` or `Validation` before any call is made (see
    /// [`prepare`]); `ExternalService` naming the step whose completion or
    /// page fetch failed, timed out, or returned no text.
    pub async fn run(
        &self,
        pipeline: &PipelineSpec,
        roles: &[RoleSpec],
        inputs: &Parameters,
        events_tx: &Sender<Event>,
    ) -> Result<RunOutcome, PipelineError> {
        let run_id = Uuid::new_v4();

        let prepared = match prepare(pipeline, roles, inputs) {
            Ok(prepared) => prepared,
            Err(e) => {
                warn!(pipeline = %pipeline.name, error = %e, "run rejected");
                let _ = events_tx
                    .send(Event::RunFailed {
                        run_id: None,
                        error: e.to_string(),
                    })
                    .await;
                return Err(e);
            }
        };

        info!(%run_id, pipeline = %pipeline.name, steps = prepared.steps.len(), "run started");
        let _ = events_tx
            .send(Event::RunStarted {
                run_id,
                pipeline: pipeline.name.clone(),
                total_steps: prepared.steps.len(),
            })
            .await;

        match self.execute(run_id, &prepared, events_tx).await {
            Ok(artifacts) => {
                let outcome = RunOutcome {
                    run_id,
                    pipeline: pipeline.name.clone(),
                    artifacts,
                };
                info!(%run_id, pipeline = %pipeline.name, "run completed");
                let _ = events_tx
                    .send(Event::RunCompleted {
                        outcome: outcome.clone(),
                    })
                    .await;
                Ok(outcome)
            }
            Err(e) => {
                error!(%run_id, pipeline = %pipeline.name, error = %e, "run failed");
                let _ = events_tx
                    .send(Event::RunFailed {
                        run_id: Some(run_id),
                        error: e.to_string(),
                    })
                    .await;
                Err(e)
            }
        }
    }

    async fn execute(
        &self,
        run_id: Uuid,
        run: &PreparedRun<'_>,
        events_tx: &Sender<Event>,
    ) -> Result<Vec<Artifact>, PipelineError> {
        let mut artifacts: Vec<Artifact> = Vec::with_capacity(run.steps.len());

        for (step_index, step) in run.steps.iter().enumerate() {
            let _ = events_tx
                .send(Event::StepStarted {
                    run_id,
                    step_index,
                    step_id: step.spec.id.clone(),
                    role: step.role.name.clone(),
                })
                .await;

            let pages = self.fetch_pages(step).await?;

            // Structure was checked in `prepare`: every context id is earlier.
            let context: Vec<&Artifact> = step
                .spec
                .context
                .iter()
                .filter_map(|id| artifacts.iter().find(|a| &a.step_id == id))
                .collect();

            let request = CompletionRequest {
                model: self.provider.model().to_string(),
                temperature: self.temperature,
                max_tokens: self.max_tokens,
                system: step.instructions.clone(),
                prompt: build_prompt(step, &context, &pages),
            };

            debug!(
                step = %step.spec.id,
                role = %step.role.name,
                system_chars = request.system.len(),
                prompt_chars = request.prompt.len(),
                context_steps = context.len(),
                "calling completion service"
            );

            let text = self.complete(&step.spec.id, &request).await?;

            let artifact = Artifact {
                step_id: step.spec.id.clone(),
                role: step.role.name.clone(),
                text,
            };
            let _ = events_tx
                .send(Event::StepCompleted {
                    run_id,
                    step_index,
                    artifact: artifact.clone(),
                })
                .await;
            artifacts.push(artifact);
        }

        Ok(artifacts)
    }

    async fn complete(&self, step: &str, request: &CompletionRequest) -> Result<String, PipelineError> {
        let call = async {
            let stream = self.provider.complete(request).await?;
            collect_text(stream).await
        };

        let text = match tokio::time::timeout(self.step_timeout, call).await {
            Ok(Ok(text)) => text,
            Ok(Err(e)) => return Err(PipelineError::external(step, e.to_string())),
            Err(_) => {
                return Err(PipelineError::external(
                    step,
                    format!(
                        "completion service did not answer within {}s",
                        self.step_timeout.as_secs()
                    ),
                ))
            }
        };

        if text.trim().is_empty() {
            return Err(PipelineError::external(
                step,
                "completion service returned an empty response",
            ));
        }
        Ok(text)
    }

    async fn fetch_pages(&self, step: &PreparedStep<'_>) -> Result<Vec<(String, String)>, PipelineError> {
        if !step.role.has_capability(Capability::FetchPage) {
            return Ok(Vec::new());
        }
        let Some(fetcher) = &self.fetcher else {
            debug!(step = %step.spec.id, "page fetch not configured, skipping");
            return Ok(Vec::new());
        };

        let urls = find_urls(&step.description);
        if urls.is_empty() {
            debug!(step = %step.spec.id, "no page address in description");
        }

        let mut pages = Vec::new();
        for url in urls {
            match fetcher.fetch_text(&url).await {
                Ok(text) => pages.push((url, text)),
                Err(e) => {
                    warn!(step = %step.spec.id, %url, error = %e, "page fetch failed");
                    return Err(PipelineError::external(
                        &step.spec.id,
                        format!("page fetch failed: {e}"),
                    ));
                }
            }
        }
        Ok(pages)
    }
}

/// The user message of a step: description, output hint, then the artifacts
/// of its context steps and any fetched pages, each under its own heading.
fn build_prompt(step: &PreparedStep<'_>, context: &[&Artifact], pages: &[(String, String)]) -> String {
    let mut prompt = step.description.trim().to_string();

    let expected = step.spec.expected_output.trim();
    if !expected.is_empty() {
        prompt.push_str("\n\nExpected output: ");
        prompt.push_str(expected);
    }

    if !context.is_empty() {
        prompt.push_str("\n\nContext from earlier steps:");
        for artifact in context {
            prompt.push_str(&format!(
                "\n\n### Output of step '{}' ({})\n{}",
                artifact.step_id, artifact.role, artifact.text
            ));
        }
    }

    for (url, text) in pages {
        prompt.push_str(&format!("\n\n### Content of {url}\n{text}"));
    }

    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::FetchError;
    use crate::providers::{MockProvider, ProviderError};
    use async_trait::async_trait;
    use pl_protocol::pipeline_models::{InputSpec, StepSpec};
    use tokio::sync::mpsc;

    fn role(name: &str, capabilities: Vec<Capability>) -> RoleSpec {
        RoleSpec {
            name: name.to_string(),
            title: String::new(),
            goal: format!("Act as {name}"),
            capabilities,
            color: String::new(),
            backstory: String::new(),
        }
    }

    fn step(id: &str, role: &str, description: &str, context: &[&str]) -> StepSpec {
        StepSpec {
            id: id.to_string(),
            role: role.to_string(),
            description: description.to_string(),
            expected_output: String::new(),
            context: context.iter().map(|c| c.to_string()).collect(),
        }
    }

    fn pipeline(steps: Vec<StepSpec>) -> PipelineSpec {
        PipelineSpec {
            name: "test".to_string(),
            title: String::new(),
            description: String::new(),
            inputs: vec![InputSpec::optional("url").url()],
            at_least_one_of: vec![],
            vars: Parameters::new(),
            model: None,
            temperature: None,
            max_tokens: None,
            mail: None,
            steps,
        }
    }

    fn engine(provider: &MockProvider) -> PipelineEngine {
        PipelineEngine::new(Arc::new(provider.clone()), &LlmSettings::default())
    }

    struct StaticFetcher(Result<String, FetchError>);

    #[async_trait]
    impl PageFetcher for StaticFetcher {
        async fn fetch_text(&self, _url: &str) -> Result<String, FetchError> {
            self.0.clone()
        }
    }

    #[test]
    fn test_build_prompt_layout() {
        let role = role("writer", vec![]);
        let mut spec = step("write", "writer", "", &["analyze"]);
        spec.expected_output = "A short email".to_string();
        let prepared = PreparedStep {
            spec: &spec,
            role: &role,
            instructions: String::new(),
            description: "Write the email.".to_string(),
        };
        let analysis = Artifact {
            step_id: "analyze".to_string(),
            role: "analyst".to_string(),
            text: "Acme sells widgets.".to_string(),
        };

        let prompt = build_prompt(&prepared, &[&analysis], &[]);
        assert_eq!(
            prompt,
            "Write the email.\n\nExpected output: A short email\n\nContext from earlier steps:\n\n### Output of step 'analyze' (analyst)\nAcme sells widgets."
        );
    }

    #[tokio::test]
    async fn test_run_emits_events_in_order() {
        let provider = MockProvider::scripted(["first", "second"]);
        let roles = vec![role("r", vec![])];
        let p = pipeline(vec![step("a", "r", "x", &[]), step("b", "r", "y", &["a"])]);
        let (tx, mut rx) = mpsc::channel(32);

        let outcome = engine(&provider)
            .run(&p, &roles, &Parameters::new(), &tx)
            .await
            .expect("run");
        drop(tx);

        assert_eq!(outcome.final_text(), "second");
        let mut kinds = Vec::new();
        while let Some(event) = rx.recv().await {
            kinds.push(match event {
                Event::RunStarted { total_steps, .. } => format!("started:{total_steps}"),
                Event::StepStarted { step_id, .. } => format!("step:{step_id}"),
                Event::StepCompleted { artifact, .. } => format!("done:{}", artifact.step_id),
                Event::RunCompleted { .. } => "completed".to_string(),
                other => format!("{other:?}"),
            });
        }
        assert_eq!(
            kinds,
            vec!["started:2", "step:a", "done:a", "step:b", "done:b", "completed"]
        );
    }

    #[tokio::test]
    async fn test_empty_response_is_external_service_error() {
        let provider = MockProvider::scripted(["  \n "]);
        let roles = vec![role("r", vec![])];
        let p = pipeline(vec![step("only", "r", "x", &[])]);
        let (tx, _rx) = mpsc::channel(32);

        let err = engine(&provider)
            .run(&p, &roles, &Parameters::new(), &tx)
            .await
            .expect_err("empty text");
        assert!(matches!(err, PipelineError::ExternalService { ref step, .. } if step == "only"));
    }

    #[tokio::test]
    async fn test_provider_error_names_step() {
        let provider = MockProvider::with_results([Err(ProviderError::Api {
            status: 401,
            message: "Invalid API Key".to_string(),
        })]);
        let roles = vec![role("r", vec![])];
        let p = pipeline(vec![step("first", "r", "x", &[])]);
        let (tx, _rx) = mpsc::channel(32);

        let err = engine(&provider)
            .run(&p, &roles, &Parameters::new(), &tx)
            .await
            .expect_err("api error");
        assert_eq!(
            err,
            PipelineError::ExternalService {
                step: "first".to_string(),
                message: "API returned error: 401 - Invalid API Key".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_validation_failure_makes_no_calls() {
        let provider = MockProvider::scripted(["never"]);
        let roles = vec![role("r", vec![])];
        let p = pipeline(vec![step("a", "r", "about {missing}", &[])]);
        let (tx, mut rx) = mpsc::channel(32);

        let err = engine(&provider)
            .run(&p, &roles, &Parameters::new(), &tx)
            .await
            .expect_err("validation");
        assert!(matches!(err, PipelineError::Validation(_)));
        assert_eq!(provider.call_count(), 0);
        assert!(matches!(
            rx.recv().await,
            Some(Event::RunFailed { run_id: None, .. })
        ));
    }

    #[tokio::test]
    async fn test_fetch_page_attaches_text_for_capable_roles() {
        let provider = MockProvider::scripted(["summary"]);
        let roles = vec![role("analyst", vec![Capability::FetchPage])];
        let p = pipeline(vec![step("analyze", "analyst", "Analyze {url}", &[])]);
        let (tx, _rx) = mpsc::channel(32);
        let mut inputs = Parameters::new();
        inputs.insert("url".to_string(), "https://acme.test".to_string());

        engine(&provider)
            .with_fetcher(Arc::new(StaticFetcher(Ok("Acme builds rockets".to_string()))))
            .run(&p, &roles, &inputs, &tx)
            .await
            .expect("run");

        let requests = provider.requests();
        assert!(requests[0].prompt.contains("### Content of https://acme.test\nAcme builds rockets"));
    }

    #[tokio::test]
    async fn test_bare_host_is_fetched_over_https() {
        let provider = MockProvider::scripted(["summary"]);
        let roles = vec![role("analyst", vec![Capability::FetchPage])];
        let p = pipeline(vec![step("analyze", "analyst", "Analyze {url}", &[])]);
        let (tx, _rx) = mpsc::channel(32);
        let mut inputs = Parameters::new();
        inputs.insert("url".to_string(), "acme.com".to_string());

        engine(&provider)
            .with_fetcher(Arc::new(StaticFetcher(Ok("Acme builds rockets".to_string()))))
            .run(&p, &roles, &inputs, &tx)
            .await
            .expect("run");

        let prompt = &provider.requests()[0].prompt;
        assert!(prompt.starts_with("Analyze https://acme.com"), "{prompt}");
        assert!(prompt.contains("### Content of https://acme.com\nAcme builds rockets"));
    }

    #[tokio::test]
    async fn test_fetch_failure_is_step_error() {
        let provider = MockProvider::scripted(["never"]);
        let roles = vec![role("analyst", vec![Capability::FetchPage])];
        let p = pipeline(vec![step("analyze", "analyst", "Analyze {url}", &[])]);
        let (tx, _rx) = mpsc::channel(32);
        let mut inputs = Parameters::new();
        inputs.insert("url".to_string(), "https://acme.test".to_string());

        let err = engine(&provider)
            .with_fetcher(Arc::new(StaticFetcher(Err(FetchError::Status {
                url: "https://acme.test".to_string(),
                status: 404,
            }))))
            .run(&p, &roles, &inputs, &tx)
            .await
            .expect_err("fetch failure");

        match err {
            PipelineError::ExternalService { step, message } => {
                assert_eq!(step, "analyze");
                assert!(message.starts_with("page fetch failed"), "{message}");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn test_roles_without_capability_never_fetch() {
        let provider = MockProvider::scripted(["ok"]);
        let roles = vec![role("writer", vec![])];
        let p = pipeline(vec![step("write", "writer", "Mention {url}", &[])]);
        let (tx, _rx) = mpsc::channel(32);
        let mut inputs = Parameters::new();
        inputs.insert("url".to_string(), "https://acme.test".to_string());

        engine(&provider)
            .with_fetcher(Arc::new(StaticFetcher(Err(FetchError::Empty(
                "unused".to_string(),
            )))))
            .run(&p, &roles, &inputs, &tx)
            .await
            .expect("run");
        assert!(!provider.requests()[0].prompt.contains("### Content of"));
    }
}
