//! Builder to construct a scheduler from configuration and collaborators.

use std::sync::Arc;

use crate::config::SchedulerConfig;
use crate::core::{AdmissionGate, AuditSink, Scheduler, SchedulerError};
use crate::util::{Clock, SystemClock, TaskLogger, TracingLogger};

/// Wires a [`Scheduler`].
///
/// Defaults: [`SchedulerConfig::default`], [`SystemClock`], [`TracingLogger`],
/// no admission gate (everything admitted), no audit sink.
#[derive(Default)]
pub struct SchedulerBuilder {
    config: SchedulerConfig,
    clock: Option<Arc<dyn Clock>>,
    logger: Option<Arc<dyn TaskLogger>>,
    gate: Option<Arc<dyn AdmissionGate>>,
    audit: Option<Box<dyn AuditSink>>,
}

impl SchedulerBuilder {
    /// Builder with default collaborators.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `config`.
    #[must_use]
    pub fn with_config(mut self, config: SchedulerConfig) -> Self {
        self.config = config;
        self
    }

    /// Use `clock` for all timing decisions.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Report action failures to `logger`.
    #[must_use]
    pub fn with_logger(mut self, logger: Arc<dyn TaskLogger>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Offer every new task to `gate`.
    #[must_use]
    pub fn with_gate(mut self, gate: Arc<dyn AdmissionGate>) -> Self {
        self.gate = Some(gate);
        self
    }

    /// Record lifecycle transitions to `sink`.
    #[must_use]
    pub fn with_audit(mut self, sink: impl AuditSink + 'static) -> Self {
        self.audit = Some(Box::new(sink));
        self
    }

    /// Validate the configuration and build an idle scheduler.
    ///
    /// # Errors
    ///
    /// [`SchedulerError::Config`] when validation fails.
    pub fn build(self) -> Result<Scheduler, SchedulerError> {
        self.config.validate().map_err(SchedulerError::Config)?;
        Ok(Scheduler::from_parts(
            self.config,
            self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
            self.logger.unwrap_or_else(|| Arc::new(TracingLogger)),
            self.gate,
            self.audit,
        ))
    }
}

impl std::fmt::Debug for SchedulerBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchedulerBuilder")
            .field("config", &self.config)
            .field("gate", &self.gate.is_some())
            .field("audit", &self.audit.is_some())
            .finish_non_exhaustive()
    }
}
