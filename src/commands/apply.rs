//! `cephctl apply` and `cephctl plan`

use anyhow::Result;
use cephkit::{DesiredState, InvocationResult};
use colored::Colorize;
use serde::Serialize;
use std::path::Path;

use crate::Context;
use crate::manifest::Manifest;
use crate::ui;

/// Summary of a manifest run
#[derive(Debug, Default, Serialize)]
pub struct Summary {
    pub changed: usize,
    pub unchanged: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl Summary {
    pub fn record(&mut self, result: &InvocationResult) {
        if result.failed {
            self.failed += 1;
        } else if result.changed {
            self.changed += 1;
        } else {
            self.unchanged += 1;
        }
    }

    pub fn total(&self) -> usize {
        self.changed + self.unchanged + self.skipped + self.failed
    }

    pub fn is_success(&self) -> bool {
        self.failed == 0
    }
}

/// One manifest entry in `--json` output
#[derive(Serialize)]
struct Entry<'a> {
    kind: &'static str,
    id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<&'a InvocationResult>,
}

#[derive(Serialize)]
struct Report<'a> {
    resources: Vec<Entry<'a>>,
    summary: &'a Summary,
}

pub fn apply(ctx: &Context, file: &Path, yes: bool) -> Result<bool> {
    run(ctx, file, ctx.check, yes)
}

pub fn plan(ctx: &Context, file: &Path) -> Result<bool> {
    run(ctx, file, true, true)
}

fn run(ctx: &Context, file: &Path, check: bool, yes: bool) -> Result<bool> {
    let manifest = Manifest::load(file)?;
    if manifest.resources.is_empty() {
        if !ctx.json {
            ui::info(&format!("No resources in {}", file.display()));
        }
        return Ok(true);
    }

    let skip_destructive = !check && !yes && !confirm_destructive(&manifest)?;
    let client = ctx.client()?;

    if !ctx.json && !ctx.quiet {
        let verb = if check { "Checking" } else { "Applying" };
        ui::header(&format!("{verb} {}", file.display()));
    }

    let mut summary = Summary::default();
    let mut results: Vec<(&DesiredState, Option<InvocationResult>)> = Vec::new();

    for desired in &manifest.resources {
        let label = format!("{} '{}'", desired.resource_type(), desired.id());

        if skip_destructive && desired.is_destructive() {
            summary.skipped += 1;
            if !ctx.json {
                ui::warn(&format!("{label}: skipped"));
            }
            results.push((desired, None));
            continue;
        }

        let result = client.reconcile(desired, check);
        summary.record(&result);
        if !ctx.json {
            ui::print_result(&label, &result, check, ctx.quiet);
        }
        results.push((desired, Some(result)));
    }

    if ctx.json {
        let report = Report {
            resources: results
                .iter()
                .map(|(desired, result)| Entry {
                    kind: desired.resource_type(),
                    id: desired.id(),
                    result: result.as_ref(),
                })
                .collect(),
            summary: &summary,
        };
        ui::print_json(&report)?;
    } else {
        print_summary(&summary, check);
    }

    Ok(summary.is_success())
}

/// List destructive resources and ask whether to run them
fn confirm_destructive(manifest: &Manifest) -> Result<bool> {
    let destructive: Vec<_> = manifest.destructive().collect();
    if destructive.is_empty() {
        return Ok(true);
    }

    ui::warn("This manifest contains destructive resources:");
    for desired in &destructive {
        ui::dim(&format!("{} '{}'", desired.resource_type(), desired.id()));
    }
    super::confirm("Run them?")
}

fn print_summary(summary: &Summary, check: bool) {
    println!();
    if summary.is_success() {
        let msg = if check {
            "Check complete"
        } else {
            "Manifest applied successfully!"
        };
        println!("  {} {msg}", "✓".green().bold());
    } else {
        println!("  {} Manifest applied with errors", "⚠".yellow().bold());
    }
    log::debug!("{} resources processed", summary.total());

    if summary.changed > 0 {
        let verb = if check { "would change" } else { "changed" };
        println!("    • {} resources {verb}", summary.changed);
    }
    if summary.unchanged > 0 {
        println!("    • {} resources unchanged", summary.unchanged);
    }
    if summary.skipped > 0 {
        println!("    • {} resources skipped", summary.skipped);
    }
    if summary.failed > 0 {
        println!("    • {} {} failed", summary.failed, "resources".red());
    }
}
