//! The readiness-gated reconcile pass.
//!
//! Every reconciling event runs the same guard sequence:
//!
//! 1. A required relation is missing: Blocked, no retry.
//! 2. The container is unreachable: Waiting, defer.
//! 3. A peer has not published its connection string: Waiting, defer.
//! 4. Render and push the config if needed, publish the plan, Active.
//!
//! Transient collaborator failures in step 4 also end in Waiting + defer.
//! Only invariant violations escape as errors.

use std::net::Ipv4Addr;

use tracing::{debug, info, warn};

use super::publisher::{self, PublishOutcome};
use crate::error::{OperatorError, Result};
use crate::infrastructure::{HostRuntime, RelationSource, Workload};
use crate::readiness::{self, PeerCredentials, ReadinessState};
use crate::render::{self, RenderInputs, UE_ROUTING};
use crate::types::config::{OperatorSettings, PeerRole};
use crate::types::event::Event;
use crate::types::status::UnitStatus;
use crate::workload::{config_path, routing_path, scrape_job, service_ports};

const CONTAINER_NOT_READY: &str = "Waiting for container to be ready";

/// The collaborators one pass talks to.
pub struct Collaborators<'a> {
    pub workload: &'a mut dyn Workload,
    pub relations: &'a dyn RelationSource,
    pub host: &'a mut dyn HostRuntime,
}

/// What a pass decided and did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Outcome {
    /// Status reported to the host, if the pass reported one.
    pub status: Option<UnitStatus>,
    /// Whether the event should be re-delivered later.
    pub deferred: bool,
    /// Container paths written during the pass.
    pub files_written: Vec<String>,
    pub published: Option<PublishOutcome>,
}

impl Outcome {
    fn blocked(message: String) -> Self {
        Outcome {
            status: Some(UnitStatus::Blocked(message)),
            ..Outcome::default()
        }
    }

    fn waiting(message: impl Into<String>) -> Self {
        Outcome {
            status: Some(UnitStatus::waiting(message)),
            deferred: true,
            ..Outcome::default()
        }
    }
}

pub struct Reconciler {
    settings: OperatorSettings,
}

impl Reconciler {
    pub fn new(settings: OperatorSettings) -> Self {
        Reconciler { settings }
    }

    pub fn settings(&self) -> &OperatorSettings {
        &self.settings
    }

    /// Handle one event and report the resulting status to the host.
    pub fn handle(&self, event: &Event, ctx: &mut Collaborators<'_>) -> Result<Outcome> {
        let mut outcome = match event {
            Event::Install => self.install(ctx)?,
            Event::WorkloadReady => {
                let mut files = Vec::new();
                if ctx.workload.can_connect() {
                    match ensure_routing_file(ctx.workload) {
                        Ok(true) => files.push(routing_path()),
                        Ok(false) => {}
                        Err(e) if e.is_retryable() => {
                            warn!(error = %e, "routing file not written, container went away");
                        }
                        Err(e) => return Err(e),
                    }
                }
                let mut outcome = self.reconcile(event, ctx)?;
                files.append(&mut outcome.files_written);
                outcome.files_written = files;
                outcome
            }
            _ => self.reconcile(event, ctx)?,
        };

        if let Some(status) = &outcome.status {
            match ctx.host.set_status(status) {
                Ok(()) => {}
                Err(e) if e.is_retryable() => {
                    warn!(error = %e, status = %status, "could not report unit status");
                    outcome.deferred = true;
                }
                Err(e) => return Err(e),
            }
        }
        if outcome.deferred {
            debug!(event = %event.key(), "deferring event");
        }
        Ok(outcome)
    }

    /// Declare ports and the scrape job, then copy the routing file once the
    /// container answers.
    fn install(&self, ctx: &mut Collaborators<'_>) -> Result<Outcome> {
        let declared = ctx
            .host
            .open_ports(&service_ports())
            .and_then(|_| ctx.host.register_scrape_job(&scrape_job()));
        if let Err(e) = declared {
            if e.is_retryable() {
                warn!(error = %e, "could not declare ports");
                return Ok(Outcome {
                    deferred: true,
                    ..Outcome::default()
                });
            }
            return Err(e);
        }

        if !ctx.workload.can_connect() {
            return Ok(Outcome::waiting(CONTAINER_NOT_READY));
        }
        match ensure_routing_file(ctx.workload) {
            Ok(written) => Ok(Outcome {
                files_written: if written { vec![routing_path()] } else { Vec::new() },
                ..Outcome::default()
            }),
            Err(e) if e.is_retryable() => Ok(Outcome::waiting(CONTAINER_NOT_READY)),
            Err(e) => Err(e),
        }
    }

    fn reconcile(&self, event: &Event, ctx: &mut Collaborators<'_>) -> Result<Outcome> {
        let state = readiness::assess(
            &self.settings.dependencies,
            ctx.relations,
            &*ctx.workload,
            event,
        );
        let credentials = match state {
            ReadinessState::MissingRelation(dep) => {
                info!(relation = %dep.relation, "required relation missing");
                return Ok(Outcome::blocked(format!(
                    "Waiting for {} relation to be created",
                    dep.role
                )));
            }
            ReadinessState::ContainerUnreachable => {
                return Ok(Outcome::waiting(CONTAINER_NOT_READY));
            }
            ReadinessState::MissingCredentials(dep) => {
                info!(relation = %dep.relation, "peer has not published its connection string");
                return Ok(Outcome::waiting(dep.role.waiting_message()));
            }
            ReadinessState::Ready(credentials) => credentials,
        };

        match self.configure(event, &credentials, ctx) {
            Ok(outcome) => Ok(outcome),
            Err(e) if e.is_retryable() => {
                warn!(error = %e, event = %event.key(), "collaborator unavailable");
                Ok(Outcome::waiting(CONTAINER_NOT_READY))
            }
            Err(e) => Err(e),
        }
    }

    fn configure(
        &self,
        event: &Event,
        credentials: &PeerCredentials,
        ctx: &mut Collaborators<'_>,
    ) -> Result<Outcome> {
        let pod_ip = ctx.host.pod_ip()?;
        let mut files_written = Vec::new();

        let path = config_path();
        if event.carries_credentials() || !ctx.workload.exists(&path)? {
            let rendered = render::render(&self.render_inputs(credentials, pod_ip)?)?;
            if ctx.workload.pull(&path)?.as_deref() != Some(rendered.as_str()) {
                ctx.workload.push(&path, rendered.as_str())?;
                info!(path = %path, "pushed config file");
                files_written.push(path.clone());
            }
        }

        let with_routing = ctx.workload.exists(&routing_path())?;
        let layer = publisher::build_plan(pod_ip, with_routing);
        let published = publisher::publish(ctx.workload, &layer)?;

        Ok(Outcome {
            status: Some(UnitStatus::Active),
            deferred: false,
            files_written,
            published: Some(published),
        })
    }

    fn render_inputs(
        &self,
        credentials: &PeerCredentials,
        pod_ip: Ipv4Addr,
    ) -> Result<RenderInputs> {
        let required = |role: PeerRole| {
            credentials.get(role).map(str::to_string).ok_or_else(|| {
                OperatorError::Invariant(format!("no {} connection string after readiness", role))
            })
        };
        let upf_node = match self.settings.dependency(PeerRole::Upf) {
            Some(_) => required(PeerRole::Upf)?,
            None => self.settings.upf_node.clone(),
        };
        Ok(RenderInputs {
            database_url: required(PeerRole::Database)?,
            nrf_url: required(PeerRole::Nrf)?,
            upf_node,
            pod_ip,
            hostname: self.settings.hostname(),
        })
    }
}

/// Copy the static routing file if it is not there yet. Returns whether it
/// was written.
fn ensure_routing_file(workload: &mut dyn Workload) -> Result<bool> {
    let path = routing_path();
    if workload.exists(&path)? {
        return Ok(false);
    }
    workload.push(&path, UE_ROUTING)?;
    info!(path = %path, "pushed routing file");
    Ok(true)
}
