//! Script Runner
//!
//! Runs setter scripts in dependency order against a [`ProtocolAdmin`].
//! Each call is logged with the events it emitted. The first revert ends
//! the run: the failing script is not journaled and nothing is retried.

use std::collections::BTreeSet;

use stablecoin_common::{
    errors::{StablecoinError, StablecoinResult},
    types::CallContext,
};

use crate::journal::DeploymentJournal;
use crate::network::ContractAddresses;
use crate::script::{ConfigScript, ProtocolAdmin};

/// Where a run stopped
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptFailure {
    pub tag: String,
    /// Index of the reverted action
    pub action: usize,
    pub error: StablecoinError,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    /// Tags run to completion, in order
    pub executed: Vec<String>,
    /// Tags found in the journal
    pub skipped: Vec<String>,
    /// One line per call and per emitted event
    pub log: Vec<String>,
    pub failure: Option<ScriptFailure>,
}

impl RunReport {
    pub fn is_success(&self) -> bool {
        self.failure.is_none()
    }
}

pub struct ScriptRunner<'a> {
    addresses: &'a ContractAddresses,
    journal: &'a mut DeploymentJournal,
}

impl<'a> ScriptRunner<'a> {
    pub fn new(addresses: &'a ContractAddresses, journal: &'a mut DeploymentJournal) -> Self {
        Self { addresses, journal }
    }

    /// Scripts sorted so each runs after its dependencies
    ///
    /// A dependency is met by a scheduled script or a journaled tag. Ties
    /// keep input order.
    pub fn order<'s>(&self, scripts: &'s [ConfigScript]) -> StablecoinResult<Vec<&'s ConfigScript>> {
        let scheduled: BTreeSet<&str> = scripts.iter().map(|s| s.tag.as_str()).collect();
        if scheduled.len() != scripts.len() {
            return Err(StablecoinError::InvalidConfig {
                reason: "duplicate script tag".into(),
            });
        }
        for script in scripts {
            for dependency in &script.dependencies {
                if !scheduled.contains(dependency.as_str()) && self.journal.entry(dependency).is_none() {
                    return Err(StablecoinError::MissingDependency {
                        tag: script.tag.clone(),
                        dependency: dependency.clone(),
                    });
                }
            }
        }

        let mut placed: BTreeSet<&str> = BTreeSet::new();
        let mut ordered = Vec::with_capacity(scripts.len());
        while ordered.len() < scripts.len() {
            let ready = scripts.iter().find(|script| {
                !placed.contains(script.tag.as_str())
                    && script
                        .dependencies
                        .iter()
                        .all(|dep| placed.contains(dep.as_str()) || !scheduled.contains(dep.as_str()))
            });
            let Some(script) = ready else {
                return Err(StablecoinError::InvalidConfig {
                    reason: "script dependencies form a cycle".into(),
                });
            };
            placed.insert(script.tag.as_str());
            ordered.push(script);
        }
        Ok(ordered)
    }

    /// Run `scripts` as `ctx.sender`
    ///
    /// Planning errors (missing dependency, cycle, changed script) fail the
    /// whole run before any call is made. Reverts land in the report.
    pub fn run(
        &mut self,
        ctx: &mut CallContext,
        admin: &mut dyn ProtocolAdmin,
        scripts: &[ConfigScript],
    ) -> StablecoinResult<RunReport> {
        let ordered = self.order(scripts)?;

        // 1. Split off journaled scripts
        let mut pending = Vec::new();
        let mut report = RunReport::default();
        for script in ordered {
            if self.journal.is_executed(script)? {
                report.skipped.push(script.tag.clone());
                report.log.push(format!("{}: already executed, skipping", script.tag));
            } else {
                pending.push(script);
            }
        }

        // 2. Run the rest, stopping at the first revert
        for script in pending {
            report.log.push(format!("{}: {}", script.tag, script.description));
            for (index, action) in script.actions.iter().enumerate() {
                let checkpoint = ctx.checkpoint();
                report.log.push(format!("{}: {}", script.tag, action.describe()));

                if let Err(error) = action.apply(ctx, self.addresses, admin) {
                    ctx.revert_to(checkpoint);
                    report.log.push(format!("{}: reverted with {error}", script.tag));
                    report.failure = Some(ScriptFailure {
                        tag: script.tag.clone(),
                        action: index,
                        error,
                    });
                    return Ok(report);
                }
                report.log.extend(ctx.events.render_from(checkpoint));
            }

            // 3. Journal only complete scripts
            self.journal.record(script, ctx.timestamp)?;
            report.executed.push(script.tag.clone());
        }

        Ok(report)
    }
}
