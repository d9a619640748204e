//! The reconciliation loop.
//!
//! One pass per resource: probe current state, compare with desired state,
//! then either report the match or run (or, in check-mode, only build) the
//! mutating commands. Every path ends in an [`InvocationResult`].

use crate::command::{self, Cluster, CommandPlan};
use crate::context::ExecutionContext;
use crate::error::Error;
use crate::report::{InvocationResult, Outcome, Timer};
use crate::resource::{Observed, ProbeOutput, Resource};
use crate::runner::{RawOutput, Runner};
use std::fmt;

/// Where a reconciliation currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Validated, nothing run yet
    Start,
    /// Probes ran and were interpreted
    Probed,
    /// Observed state already matches
    Satisfied,
    /// At least one mutating step is needed
    NeedsChange,
    /// Mutating steps ran
    Executed,
    /// Mutating steps were built but not run (check-mode)
    Skipped,
    /// Result materialized
    Reported,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Start => "start",
            Phase::Probed => "probed",
            Phase::Satisfied => "satisfied",
            Phase::NeedsChange => "needs change",
            Phase::Executed => "executed",
            Phase::Skipped => "skipped",
            Phase::Reported => "reported",
        };
        f.write_str(name)
    }
}

/// Failure carrying whatever command and output were involved.
struct Failure {
    cmd: CommandPlan,
    output: Option<RawOutput>,
    error: Error,
}

impl Failure {
    fn before_run(error: Error) -> Self {
        Self {
            cmd: CommandPlan::default(),
            output: None,
            error,
        }
    }

    fn into_outcome(self, changed: bool) -> Outcome {
        Outcome::Failed {
            cmd: self.cmd,
            output: self.output,
            changed,
            msg: self.error.to_string(),
        }
    }
}

/// Observed state plus the primary probe's command and output.
struct Probed<S> {
    observed: Observed<S>,
    primary: Option<(CommandPlan, RawOutput)>,
}

/// Drives resources to their desired state through a [`Runner`].
pub struct Reconciler<'a> {
    runner: &'a dyn Runner,
    cluster: &'a Cluster,
    context: &'a ExecutionContext,
}

impl<'a> Reconciler<'a> {
    /// Reconciler running commands for `cluster` under `context`.
    pub fn new(runner: &'a dyn Runner, cluster: &'a Cluster, context: &'a ExecutionContext) -> Self {
        Self {
            runner,
            cluster,
            context,
        }
    }

    /// Full argument vector for one step of `resource`.
    pub fn command<R: Resource + ?Sized>(&self, resource: &R, step: &[String]) -> CommandPlan {
        command::build_for_tool(self.context, self.cluster, resource.tool(), step.iter().cloned())
    }

    /// Reconcile `resource`, running no mutating command when `check_mode`.
    pub fn reconcile<R: Resource>(&self, resource: &R, check_mode: bool) -> InvocationResult {
        let timer = Timer::start();
        let label = format!("{} '{}'", resource.resource_type(), resource.id());

        let outcome = self.drive(resource, check_mode, &label);
        let result = timer.finish(outcome);
        trace(&label, Phase::Reported);

        if result.failed {
            log::info!(
                "{label}: failed ({})",
                result.msg.as_deref().unwrap_or("unknown error")
            );
        } else if result.changed && check_mode {
            log::info!("{label}: would change");
        } else if result.changed {
            log::info!("{label}: changed");
        } else {
            log::info!("{label}: ok");
        }
        result
    }

    fn drive<R: Resource>(&self, resource: &R, check_mode: bool, label: &str) -> Outcome {
        if let Err(e) = resource.validate() {
            return Failure::before_run(e).into_outcome(false);
        }
        trace(label, Phase::Start);

        let probed = match self.probe(resource) {
            Ok(probed) => probed,
            Err(failure) => return failure.into_outcome(false),
        };
        trace(label, Phase::Probed);

        let steps = match resource.plan(&probed.observed) {
            Ok(steps) => steps,
            Err(e) => {
                let failure = match probed.primary {
                    Some((cmd, output)) => Failure {
                        cmd,
                        output: Some(output),
                        error: e,
                    },
                    None => Failure::before_run(e),
                };
                return failure.into_outcome(false);
            }
        };

        if steps.is_empty() {
            trace(label, Phase::Satisfied);
            return match probed.primary {
                Some((cmd, output)) => Outcome::Satisfied { cmd, output },
                None => Outcome::Unchanged {
                    cmd: CommandPlan::default(),
                },
            };
        }
        trace(label, Phase::NeedsChange);

        let mut commands: Vec<CommandPlan> =
            steps.iter().map(|step| self.command(resource, step)).collect();

        if check_mode {
            trace(label, Phase::Skipped);
            let cmd = commands.pop().unwrap_or_default();
            return Outcome::Planned { cmd };
        }

        let outcome = self.execute(commands);
        trace(label, Phase::Executed);
        outcome
    }

    /// Run every probe and interpret the outputs.
    fn probe<R: Resource>(&self, resource: &R) -> Result<Probed<R::State>, Failure> {
        let mut outputs = Vec::new();
        let mut primary: Option<(CommandPlan, RawOutput)> = None;

        for probe in resource.probes() {
            let cmd = self.command(resource, &probe.args);
            let output = match self.runner.run(&cmd) {
                Ok(output) => output,
                Err(error) => {
                    return Err(Failure {
                        cmd,
                        output: None,
                        error,
                    });
                }
            };

            let parsed = if output.success() {
                match serde_json::from_slice(&output.stdout) {
                    Ok(value) => ProbeOutput::Json(value),
                    Err(e) => {
                        return Err(Failure {
                            cmd,
                            output: Some(output),
                            error: Error::probe(format!("output is not JSON: {e}")),
                        });
                    }
                }
            } else if probe.not_found.contains(&output.rc) {
                ProbeOutput::NotFound
            } else {
                let error = Error::probe(format!("`{cmd}` exited with status {}", output.rc));
                return Err(Failure {
                    cmd,
                    output: Some(output),
                    error,
                });
            };

            let missing = parsed == ProbeOutput::NotFound;
            outputs.push(parsed);
            if primary.is_none() {
                primary = Some((cmd, output));
                // nothing else to learn about an entity that does not exist
                if missing {
                    break;
                }
            }
        }

        match resource.observe(&outputs) {
            Ok(observed) => Ok(Probed { observed, primary }),
            Err(error) => {
                let (cmd, output) = match primary {
                    Some((cmd, output)) => (cmd, Some(output)),
                    None => (CommandPlan::default(), None),
                };
                Err(Failure { cmd, output, error })
            }
        }
    }

    /// Run mutating commands in order, stopping at the first failure.
    fn execute(&self, commands: Vec<CommandPlan>) -> Outcome {
        let mut last = None;
        for cmd in commands {
            match self.runner.run(&cmd) {
                Ok(output) => {
                    let ok = output.success();
                    last = Some((cmd, output));
                    if !ok {
                        break;
                    }
                }
                Err(error) => {
                    return Failure {
                        cmd,
                        output: None,
                        error,
                    }
                    .into_outcome(last.is_some());
                }
            }
        }

        match last {
            Some((cmd, output)) => Outcome::Ran {
                cmd,
                output,
                changed: true,
            },
            None => Outcome::Unchanged {
                cmd: CommandPlan::default(),
            },
        }
    }
}

fn trace(label: &str, phase: Phase) {
    log::debug!("{label}: {phase}");
}
