use clap::{Args, ValueEnum};
use serde_json::Value;

use homeledger_core::comparison::{project_and_compare, ScenarioSetInput};
use homeledger_core::projection::{project_net_worth, ProjectionInput};

use crate::commands::narrow;
use crate::input;

/// Which part of a projection to print
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum ProjectionView {
    /// Monthly, yearly and summary sections
    #[default]
    Full,
    Summary,
    Yearly,
    Monthly,
}

/// Which part of a scenario comparison to print
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum CompareView {
    /// Deltas of each alternative against the baseline
    #[default]
    Deltas,
    /// Deltas plus every projection
    Full,
}

/// Arguments for a household net-worth projection
#[derive(Args)]
pub struct ProjectArgs {
    /// Path to JSON/YAML projection input (mortgage, cash flow, fund, investments)
    #[arg(long)]
    pub input: Option<String>,

    /// Part of the projection to print
    #[arg(long, value_enum, default_value_t = ProjectionView::Full)]
    pub view: ProjectionView,
}

/// Arguments for comparing scenarios against a baseline
#[derive(Args)]
pub struct CompareArgs {
    /// Path to JSON/YAML scenario set (`baseline` plus `alternatives`)
    #[arg(long)]
    pub input: Option<String>,

    /// Part of the comparison to print
    #[arg(long, value_enum, default_value_t = CompareView::Deltas)]
    pub view: CompareView,
}

pub fn run_project(args: ProjectArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let projection_input: ProjectionInput = input::read_input(args.input.as_deref())?
        .ok_or("--input <file> or stdin required for a projection")?;
    let result = project_net_worth(&projection_input)?;
    let value = serde_json::to_value(result)?;
    Ok(match args.view {
        ProjectionView::Full => value,
        ProjectionView::Summary => narrow(value, "summary"),
        ProjectionView::Yearly => narrow(value, "yearly"),
        ProjectionView::Monthly => narrow(value, "monthly"),
    })
}

pub fn run_compare(args: CompareArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let set: ScenarioSetInput = input::read_input(args.input.as_deref())?
        .ok_or("--input <file> or stdin required for a scenario comparison")?;
    let result = project_and_compare(&set)?;
    let value = serde_json::to_value(result)?;
    Ok(match args.view {
        CompareView::Full => value,
        CompareView::Deltas => narrow(value, "comparison"),
    })
}
