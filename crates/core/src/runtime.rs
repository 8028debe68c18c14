//! Runtime worker between a UI and the engine.
//!
//! The worker owns the session and processes `Op`s one at a time. Runs are
//! spawned so mail and history requests are still answered while a pipeline
//! waits on the completion service. Only one run may be active at once.

use crate::config::AppConfig;
use crate::engine::PipelineEngine;
use crate::error::PipelineError;
use crate::fetch::{HttpPageFetcher, PageFetcher};
use crate::mail::{MailRequest, Mailer};
use crate::providers::{CompletionProvider, LlmOverrides, ProviderFactory};
use crate::session::Session;
use pl_protocol::ipc::{Event, Op};
use pl_protocol::pipeline_models::PipelineSpec;
use pl_protocol::run_models::{HistoryEntry, Parameters};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{self, Receiver, Sender};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Where a run's completion provider comes from.
#[derive(Clone)]
pub enum ProviderSource {
    /// Build a provider per run from the effective settings.
    Settings(LlmOverrides),

    /// Use the same provider for every run. Generation parameters are still
    /// resolved from the settings.
    Fixed(Arc<dyn CompletionProvider>),
}

pub struct Runtime {
    config: Arc<AppConfig>,
    providers: ProviderSource,
    fetcher: Option<Arc<dyn PageFetcher>>,
    mailer: Mailer,
    session: Arc<Mutex<Session>>,
    active_run: Option<JoinHandle<()>>,
    /// Set while a run is accepted and not yet reported finished.
    run_active: Arc<AtomicBool>,
}

impl Runtime {
    pub fn new(
        config: AppConfig,
        providers: ProviderSource,
        fetcher: Option<Arc<dyn PageFetcher>>,
        mailer: Mailer,
    ) -> Self {
        Self {
            config: Arc::new(config),
            providers,
            fetcher,
            mailer,
            session: Arc::new(Mutex::new(Session::new())),
            active_run: None,
            run_active: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Runtime with the HTTP page fetcher and SMTP mailer described by the
    /// loaded configuration.
    pub fn from_config(config: AppConfig, overrides: LlmOverrides) -> Self {
        let fetch = &config.global.fetch;
        let fetcher = match HttpPageFetcher::new(Duration::from_secs(fetch.timeout_secs), fetch.max_chars)
        {
            Ok(fetcher) => Some(Arc::new(fetcher) as Arc<dyn PageFetcher>),
            Err(e) => {
                warn!(error = %e, "page fetch disabled");
                None
            }
        };
        let mailer = Mailer::smtp(config.global.mail.clone());
        Self::new(config, ProviderSource::Settings(overrides), fetcher, mailer)
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Engine configured for `pipeline`: effective LLM settings, provider and
    /// page fetcher.
    ///
    /// # Errors
    ///
    /// `PipelineError::Configuration` when no provider can be built.
    pub fn engine_for(&self, pipeline: &PipelineSpec) -> Result<PipelineEngine, PipelineError> {
        let (settings, provider) = match &self.providers {
            ProviderSource::Settings(overrides) => {
                let settings = overrides.resolve(&self.config.global.llm, Some(pipeline));
                let provider = ProviderFactory::create(&settings, overrides.api_key.as_deref())?;
                (settings, provider)
            }
            ProviderSource::Fixed(provider) => {
                let settings =
                    LlmOverrides::default().resolve(&self.config.global.llm, Some(pipeline));
                (settings, Arc::clone(provider))
            }
        };

        let engine = PipelineEngine::new(provider, &settings);
        Ok(match &self.fetcher {
            Some(fetcher) => engine.with_fetcher(Arc::clone(fetcher)),
            None => engine,
        })
    }

    /// Process operations until `Shutdown` or until every sender is dropped.
    pub async fn serve(mut self, mut op_rx: Receiver<Op>, events_tx: Sender<Event>) {
        info!(
            pipelines = self.config.pipelines.len(),
            roles = self.config.roles.len(),
            "runtime started"
        );

        while let Some(op) = op_rx.recv().await {
            match op {
                Op::RunPipeline { name, inputs } => self.start_run(&name, inputs, &events_tx).await,
                Op::SendMail {
                    from,
                    password,
                    to,
                    text,
                    default_subject,
                } => {
                    let request = MailRequest {
                        from,
                        password,
                        to,
                        text,
                        default_subject,
                    };
                    let event = match self.mailer.send(&request).await {
                        Ok(receipt) => Event::MailSent {
                            to: receipt.to,
                            subject: receipt.subject,
                        },
                        Err(e) => Event::MailFailed {
                            error: e.to_string(),
                        },
                    };
                    let _ = events_tx.send(event).await;
                }
                Op::GetHistory => {
                    let entries = self.session.lock().await.history.entries().to_vec();
                    let _ = events_tx.send(Event::HistoryUpdated { entries }).await;
                }
                Op::ClearHistory => {
                    self.session.lock().await.history.clear();
                    debug!("history cleared");
                    let _ = events_tx
                        .send(Event::HistoryUpdated {
                            entries: Vec::new(),
                        })
                        .await;
                }
                Op::Shutdown => break,
            }
        }

        if let Some(handle) = self.active_run.take() {
            handle.abort();
        }
        info!("runtime stopped");
    }

    /// A finished task also counts as idle, so a panicked run cannot block
    /// the worker forever.
    fn is_running(&self) -> bool {
        self.run_active.load(Ordering::Acquire)
            && self
                .active_run
                .as_ref()
                .is_some_and(|handle| !handle.is_finished())
    }

    async fn start_run(&mut self, name: &str, inputs: Parameters, events_tx: &Sender<Event>) {
        match self.accept_run(name) {
            Ok((engine, pipeline)) => {
                self.spawn_run(engine, pipeline, inputs, events_tx.clone());
            }
            Err(e) => {
                warn!(pipeline = name, error = %e, "run not started");
                let _ = events_tx
                    .send(Event::RunFailed {
                        run_id: None,
                        error: e.to_string(),
                    })
                    .await;
            }
        }
    }

    fn accept_run(&self, name: &str) -> Result<(PipelineEngine, PipelineSpec), PipelineError> {
        if self.is_running() {
            return Err(PipelineError::Validation(
                "a run is already in progress".to_string(),
            ));
        }
        let pipeline = self
            .config
            .pipeline(name)
            .ok_or_else(|| PipelineError::Validation(format!("unknown pipeline '{name}'")))?;
        let engine = self.engine_for(pipeline)?;
        Ok((engine, pipeline.clone()))
    }

    /// Run in the background, relaying the engine's events.
    ///
    /// The relay records history and clears the active flag before it
    /// forwards `RunCompleted` or `RunFailed`, so a client that starts the
    /// next run on seeing either event is never rejected.
    fn spawn_run(
        &mut self,
        engine: PipelineEngine,
        pipeline: PipelineSpec,
        inputs: Parameters,
        events_tx: Sender<Event>,
    ) {
        let config = Arc::clone(&self.config);
        let session = Arc::clone(&self.session);
        let run_active = Arc::clone(&self.run_active);
        run_active.store(true, Ordering::Release);

        self.active_run = Some(tokio::spawn(async move {
            let (run_tx, mut run_rx) = mpsc::channel(32);
            let run_inputs = inputs.clone();

            let run = async move {
                // The outcome also arrives as `RunCompleted`.
                let _ = engine
                    .run(&pipeline, &config.roles, &run_inputs, &run_tx)
                    .await;
            };

            let relay = async {
                while let Some(event) = run_rx.recv().await {
                    match event {
                        Event::RunCompleted { outcome } => {
                            let entries = {
                                let mut session = session.lock().await;
                                session
                                    .history
                                    .push(HistoryEntry::from_outcome(&outcome, &inputs));
                                session.history.entries().to_vec()
                            };
                            run_active.store(false, Ordering::Release);
                            let _ = events_tx.send(Event::RunCompleted { outcome }).await;
                            let _ = events_tx.send(Event::HistoryUpdated { entries }).await;
                        }
                        Event::RunFailed { .. } => {
                            run_active.store(false, Ordering::Release);
                            let _ = events_tx.send(event).await;
                        }
                        other => {
                            let _ = events_tx.send(other).await;
                        }
                    }
                }
            };

            tokio::join!(run, relay);
        }));
    }
}
