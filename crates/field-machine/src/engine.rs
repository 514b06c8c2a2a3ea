//! The Machine: Learn session state machine plus apply / preview.
//!
//! ```text
//! Idle ──start──▶ Learning ──window elapsed / stop(finalize)──▶ Ready
//!                    │                                           │
//!                    └──stop(discard)──▶ Idle          start ◀───┘
//! ```
//!
//! Everything here runs on the tick thread. Finished proposals and the last
//! summary are published through `ArcSwap` so a UI thread can read them
//! without locking.

use crate::apply::{ApplyController, ApplyReport, SafetyRails};
use crate::builder::build_proposals;
use crate::clock::{Clock, SystemClock};
use crate::context::{Context, Targets};
use crate::proposal::Proposal;
use crate::{Error, Result};
use arc_swap::{ArcSwap, ArcSwapOption};
use field_analysis::{AnalysisSession, AnalysisSummary, Diagnostics};
use field_core::{MachineConfig, ParamStore, ParameterTree, MAX_LISTEN_SECONDS};
use std::sync::Arc;
use std::time::Duration;

#[cfg(feature = "live")]
use field_analysis::{analysis_tap, TapConsumer, TapProducer};

/// Fixed status lines, one per session phase. UI code may match on these.
pub const STATUS_INITIALIZING: &str = "Initializing…";
pub const STATUS_ANALYZING: &str = "Analyzing spectrum…";
pub const STATUS_READY: &str = "Ready — proposals generated";
pub const STATUS_STOPPED: &str = "Stopped";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MachineState {
    #[default]
    Idle,
    Learning,
    Ready,
}

/// Which side of the plugin's processing a session listens to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub enum ListenSource {
    #[default]
    Pre,
    Post,
}

impl ListenSource {
    pub fn name(self) -> &'static str {
        match self {
            ListenSource::Pre => "Pre",
            ListenSource::Post => "Post",
        }
    }
}

/// Builder for [`MachineEngine`].
///
/// # Example
///
/// ```
/// use field_machine::MachineEngine;
/// use field_core::MachineConfig;
///
/// let engine = MachineEngine::builder()
///     .config(MachineConfig::default().with_listen_seconds(5.0))
///     .build()
///     .unwrap();
/// assert_eq!(engine.diagnostics().fft_size, 4096);
/// ```
#[derive(Default)]
pub struct MachineEngineBuilder {
    config: MachineConfig,
    store: Option<Arc<dyn ParamStore>>,
    clock: Option<Arc<dyn Clock>>,
}

impl MachineEngineBuilder {
    pub fn config(mut self, config: MachineConfig) -> Self {
        self.config = config;
        self
    }

    /// Default: a [`ParameterTree`] holding the Field parameter set.
    pub fn store(mut self, store: Arc<dyn ParamStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Default: [`SystemClock`].
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn build(self) -> Result<MachineEngine> {
        let session = AnalysisSession::new(&self.config)?;
        let store = self
            .store
            .unwrap_or_else(|| Arc::new(ParameterTree::field_defaults()));
        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock::new()));

        tracing::debug!(diagnostics = %session.diagnostics(), "machine engine ready");

        Ok(MachineEngine {
            listen: Duration::from_secs_f64(self.config.listen_seconds),
            config: self.config,
            session,
            state: MachineState::Idle,
            context: Context::default(),
            targets: Targets::default(),
            source: ListenSource::Pre,
            started_at: Duration::ZERO,
            clock,
            controller: ApplyController::new(store),
            proposals: Arc::new(ArcSwap::from_pointee(Vec::new())),
            summary: Arc::new(ArcSwapOption::empty()),
            log: Default::default(),
            #[cfg(feature = "live")]
            pre_tap: None,
            #[cfg(feature = "live")]
            post_tap: None,
            #[cfg(feature = "live")]
            pull_left: Vec::new(),
            #[cfg(feature = "live")]
            pull_right: Vec::new(),
        })
    }
}

pub struct MachineEngine {
    config: MachineConfig,
    session: AnalysisSession,
    state: MachineState,
    context: Context,
    targets: Targets,
    source: ListenSource,
    listen: Duration,
    started_at: Duration,
    clock: Arc<dyn Clock>,
    controller: ApplyController,
    proposals: Arc<ArcSwap<Vec<Proposal>>>,
    summary: Arc<ArcSwapOption<AnalysisSummary>>,
    log: crate::status::StatusLog,

    #[cfg(feature = "live")]
    pre_tap: Option<TapConsumer>,
    #[cfg(feature = "live")]
    post_tap: Option<TapConsumer>,
    #[cfg(feature = "live")]
    pull_left: Vec<f32>,
    #[cfg(feature = "live")]
    pull_right: Vec<f32>,
}

impl MachineEngine {
    pub fn builder() -> MachineEngineBuilder {
        MachineEngineBuilder::default()
    }

    /// Start a Learn session with the configured listening window.
    pub fn start_learning(&mut self, context: Context, source: ListenSource) {
        self.start_learning_for(context, source, self.config.listen_seconds);
    }

    /// Start a Learn session listening for `seconds` (clamped to 300 s).
    ///
    /// Starting while already learning discards the session in flight.
    pub fn start_learning_for(&mut self, context: Context, source: ListenSource, seconds: f64) {
        if self.state == MachineState::Learning {
            tracing::info!("restarting learn session");
        }

        let seconds = if seconds.is_finite() && seconds > 0.0 {
            seconds.min(MAX_LISTEN_SECONDS)
        } else {
            self.config.listen_seconds
        };

        self.log.set_status(STATUS_INITIALIZING);
        self.session.reset();
        self.proposals.store(Arc::new(Vec::new()));
        self.summary.store(None);

        self.context = context;
        self.targets = Targets::from_context(&context);
        self.controller.set_rails(SafetyRails {
            width_max: self.targets.width_max,
        });
        self.source = source;
        self.listen = Duration::from_secs_f64(seconds);
        self.started_at = self.clock.now();
        self.state = MachineState::Learning;

        #[cfg(feature = "live")]
        for tap in [self.pre_tap.as_mut(), self.post_tap.as_mut()].into_iter().flatten() {
            tap.clear();
        }

        tracing::info!(
            genre = context.genre.name(),
            venue = context.venue.name(),
            track = context.track.name(),
            source = source.name(),
            seconds,
            "learn session started"
        );
        let status = self.listening_status();
        self.log.set_status(status);
    }

    /// Feed audio to the running session. Ignored unless learning.
    ///
    /// Returns the number of STFT frames completed.
    pub fn process_block(&mut self, left: &[f32], right: Option<&[f32]>) -> usize {
        if self.state != MachineState::Learning {
            return 0;
        }
        self.session.process_block(left, right)
    }

    /// Periodic update: pull tapped audio, refresh the countdown and finish the
    /// session once the window has elapsed.
    pub fn tick(&mut self) -> MachineState {
        if self.state != MachineState::Learning {
            return self.state;
        }

        #[cfg(feature = "live")]
        self.pull_taps();

        if self.clock.now().saturating_sub(self.started_at) >= self.listen {
            self.finalize();
        } else {
            let status = self.listening_status();
            self.log.set_status_quiet(status);
        }
        self.state
    }

    /// End a Learn session early. With `finalize` the audio heard so far is
    /// turned into proposals; without it the session is dropped.
    ///
    /// Does nothing unless learning.
    pub fn stop(&mut self, finalize: bool) {
        if self.state != MachineState::Learning {
            return;
        }

        if finalize {
            self.finalize();
        } else {
            self.session.reset();
            self.state = MachineState::Idle;
            tracing::info!("learn session abandoned");
            self.log.set_status(STATUS_STOPPED);
        }
    }

    fn finalize(&mut self) {
        self.log.set_status(STATUS_ANALYZING);

        let summary = self.session.summarize();
        let proposals = build_proposals(
            summary.as_ref(),
            &self.context,
            &self.targets,
            self.controller.store().as_ref(),
        );

        tracing::info!(
            samples = self.session.samples(),
            proposals = proposals.len(),
            "learn session finished"
        );

        // The count goes to the log; the status line itself never varies.
        let outcome = if proposals.is_empty() {
            "Nothing to suggest yet".to_string()
        } else {
            format!("{} proposals", proposals.len())
        };

        self.summary.store(summary.map(Arc::new));
        self.proposals.store(Arc::new(proposals));
        self.session.reset();
        self.state = MachineState::Ready;
        self.log.push(outcome);
        self.log.set_status(STATUS_READY);
    }

    fn listening_status(&self) -> String {
        format!(
            "Listening ({}), {:.0}s left",
            self.source.name(),
            self.remaining_seconds().ceil()
        )
    }

    pub fn state(&self) -> MachineState {
        self.state
    }

    pub fn context(&self) -> Context {
        self.context
    }

    pub fn targets(&self) -> &Targets {
        &self.targets
    }

    pub fn source(&self) -> ListenSource {
        self.source
    }

    pub fn config(&self) -> &MachineConfig {
        &self.config
    }

    /// Countdown for the progress bar; 0 outside a session.
    pub fn remaining_seconds(&self) -> f64 {
        if self.state != MachineState::Learning {
            return 0.0;
        }
        let elapsed = self.clock.now().saturating_sub(self.started_at);
        self.listen.saturating_sub(elapsed).as_secs_f64()
    }

    pub fn status(&self) -> &str {
        self.log.status()
    }

    pub fn messages(&self) -> Vec<String> {
        self.log.messages()
    }

    /// Snapshot of the latest proposal list.
    pub fn proposals(&self) -> Arc<Vec<Proposal>> {
        self.proposals.load_full()
    }

    /// Shared handle for readers on other threads.
    pub fn proposals_handle(&self) -> Arc<ArcSwap<Vec<Proposal>>> {
        Arc::clone(&self.proposals)
    }

    pub fn summary(&self) -> Option<Arc<AnalysisSummary>> {
        self.summary.load_full()
    }

    pub fn summary_handle(&self) -> Arc<ArcSwapOption<AnalysisSummary>> {
        Arc::clone(&self.summary)
    }

    pub fn diagnostics(&self) -> Diagnostics {
        self.session.diagnostics()
    }

    pub fn store(&self) -> &Arc<dyn ParamStore> {
        self.controller.store()
    }

    pub fn controller(&self) -> &ApplyController {
        &self.controller
    }

    pub fn apply(&mut self, proposal: &Proposal) -> ApplyReport {
        let report = self.controller.apply(proposal);
        self.log_apply(&proposal.title, &report);
        report
    }

    pub fn apply_blended(&mut self, proposal: &Proposal, amount: f32) -> ApplyReport {
        let report = self.controller.apply_blended(proposal, amount);
        self.log_apply(&proposal.title, &report);
        report
    }

    pub fn apply_composite(&mut self, proposals: &[Proposal], amount: f32) -> ApplyReport {
        let report = self.controller.apply_composite(proposals, amount);
        self.log_apply("Composite", &report);
        report
    }

    /// Apply one of the current proposals, looked up by id.
    pub fn apply_by_id(&mut self, id: &str, amount: f32) -> Result<ApplyReport> {
        let proposals = self.proposals();
        let proposal = proposals
            .iter()
            .find(|p| p.id == id)
            .ok_or_else(|| Error::UnknownProposal(id.to_string()))?;
        Ok(self.apply_blended(proposal, amount))
    }

    /// Blend every current proposal at once.
    pub fn apply_all(&mut self, amount: f32) -> ApplyReport {
        let proposals = self.proposals();
        self.apply_composite(&proposals, amount)
    }

    pub fn revert(&mut self) -> ApplyReport {
        let report = self.controller.revert();
        if !report.results.is_empty() {
            self.log.push("Preview reverted");
        }
        report
    }

    pub fn commit(&mut self) {
        self.controller.commit();
        self.log.push("Changes kept");
    }

    fn log_apply(&mut self, what: &str, report: &ApplyReport) {
        let skipped = report.skipped().count();
        if skipped == 0 {
            self.log.push(format!("Applied {what}"));
        } else {
            self.log
                .push(format!("Applied {what} ({skipped} parameters skipped)"));
        }
    }
}

#[cfg(feature = "live")]
impl MachineEngine {
    /// Create the pre/post audio taps. The producers go to the audio thread;
    /// [`tick`](Self::tick) drains the consumers. Calling again replaces them.
    pub fn attach_taps(&mut self) -> (TapProducer, TapProducer) {
        let (pre_producer, pre_consumer) = analysis_tap(self.config.tap_capacity);
        let (post_producer, post_consumer) = analysis_tap(self.config.tap_capacity);
        self.pre_tap = Some(pre_consumer);
        self.post_tap = Some(post_consumer);
        (pre_producer, post_producer)
    }

    fn pull_taps(&mut self) {
        let (active, idle) = match self.source {
            ListenSource::Pre => (self.pre_tap.as_mut(), self.post_tap.as_mut()),
            ListenSource::Post => (self.post_tap.as_mut(), self.pre_tap.as_mut()),
        };

        if let Some(idle) = idle {
            idle.clear();
        }

        let Some(tap) = active else {
            return;
        };

        let dropped = tap.dropped();
        let pulled = tap.pull(
            self.config.max_pull_samples,
            &mut self.pull_left,
            &mut self.pull_right,
        );
        if pulled > 0 {
            self.session
                .process_block(&self.pull_left, Some(&self.pull_right));
        }
        tracing::trace!(pulled, dropped, "tick pull");
    }
}
