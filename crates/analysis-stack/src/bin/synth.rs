use std::path::PathBuf;
use std::process::ExitCode;

use analysis_stack::stack::parse_tag;
use analysis_stack::{AnalysisStack, Environment, StackError, StackProps};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Synthesize the property analysis stack to a CloudFormation template.
#[derive(Parser, Debug)]
#[command(name = "synth")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Write the template here instead of stdout
    #[arg(long, short, env = "ANALYSIS_SYNTH_OUT")]
    out: Option<PathBuf>,

    /// Scope id of the stack
    #[arg(long, default_value = "PropertyAnalysisStack")]
    scope: String,

    /// Deployed stack name (defaults to the scope id)
    #[arg(long, env = "ANALYSIS_STACK_NAME")]
    stack_name: Option<String>,

    /// Template description
    #[arg(long, env = "ANALYSIS_STACK_DESCRIPTION")]
    description: Option<String>,

    /// Target AWS account
    #[arg(long, env = "CDK_DEFAULT_ACCOUNT")]
    account: Option<String>,

    /// Target AWS region
    #[arg(long, env = "CDK_DEFAULT_REGION")]
    region: Option<String>,

    /// Directory holding the built function bundle
    #[arg(long, env = "ANALYSIS_ASSET_DIR")]
    asset_dir: Option<PathBuf>,

    /// Tag applied to every taggable resource, as key=value (repeatable)
    #[arg(long = "tag", value_parser = parse_tag)]
    tags: Vec<(String, String)>,

    /// Pretty-print the template
    #[arg(long)]
    pretty: bool,
}

impl Cli {
    fn props(&self) -> StackProps {
        let env = if self.account.is_some() || self.region.is_some() {
            Some(Environment {
                account: self.account.clone(),
                region: self.region.clone(),
            })
        } else {
            None
        };

        StackProps {
            stack_name: self.stack_name.clone(),
            description: self.description.clone(),
            env,
            tags: self.tags.iter().cloned().collect(),
            asset_dir: self.asset_dir.clone(),
        }
    }
}

fn run(cli: &Cli) -> Result<(), StackError> {
    let stack = AnalysisStack::new(&cli.scope, cli.props())?;
    let json = stack.to_json(cli.pretty)?;

    match &cli.out {
        Some(path) => {
            std::fs::write(path, json + "\n")?;
            info!(stack = %stack.stack_name(), path = %path.display(), "wrote template");
        }
        None => println!("{json}"),
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Logs go to stderr so stdout stays a clean template.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "synth failed");
            ExitCode::FAILURE
        }
    }
}
