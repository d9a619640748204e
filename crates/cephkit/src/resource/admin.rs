//! Pass-through admin commands.

use super::{Observed, Resource, Step};
use crate::command::Tool;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// An arbitrary sub-command of one of the admin tools.
///
/// Always executed; there is nothing to probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminCommand {
    /// Tool to run
    #[serde(default)]
    pub tool: Tool,
    /// Sub-command path, e.g. `["osd", "pool", "ls"]`
    pub subcommand: Vec<String>,
    /// Arguments appended after the sub-command
    #[serde(default)]
    pub args: Vec<String>,
}

impl AdminCommand {
    /// Command for `tool` with no extra args.
    pub fn new<I, S>(tool: Tool, subcommand: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tool,
            subcommand: subcommand.into_iter().map(Into::into).collect(),
            args: Vec::new(),
        }
    }

    /// Append arguments.
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }
}

impl Resource for AdminCommand {
    type State = ();

    fn id(&self) -> String {
        self.subcommand.join(" ")
    }

    fn resource_type(&self) -> &'static str {
        "admin"
    }

    fn tool(&self) -> Tool {
        self.tool
    }

    fn validate(&self) -> Result<()> {
        if self.subcommand.iter().all(|s| s.trim().is_empty()) {
            return Err(Error::invalid("admin", self.id(), "sub-command is empty"));
        }
        Ok(())
    }

    fn plan(&self, _observed: &Observed<()>) -> Result<Vec<Step>> {
        Ok(vec![
            self.subcommand
                .iter()
                .chain(&self.args)
                .cloned()
                .collect(),
        ])
    }
}
