//! Binary entry point for the `awssh` CLI.

use std::io::{self, Write};
use std::process;

use clap::{CommandFactory, Parser};
use thiserror::Error;

use awssh::{
    ConnectConfig, Ec2Inventory, Ec2InventoryError, LaunchError, LaunchOptions, Resolution,
    ResolveError, Resolver, SshLauncher, render_table,
};

#[derive(Debug, Parser)]
#[command(
    name = "awssh",
    about = "SSH into EC2 instances by instance ID, private IPv4 address, or Name tag"
)]
struct Cli {
    /// Be verbose (passes -v to the underlying SSH invocation).
    #[arg(short = 'v', long)]
    verbose: bool,
    /// Path to the directory with SSH key files, default is ~/.ssh.
    #[arg(short = 'p', long = "key-path", env = "AWS_KEY_PATH", value_name = "DIR")]
    key_path: Option<String>,
    /// Show the list of running and pending instances and exit.
    #[arg(short = 'l', long = "list")]
    list: bool,
    /// A command to run on the remote server.
    #[arg(short = 'c', long = "command", value_name = "CMD")]
    command: Option<String>,
    /// AWS profile to use instead of the default chain.
    #[arg(long, value_name = "PROFILE")]
    profile: Option<String>,
    /// AWS region to use instead of the default chain.
    #[arg(long, value_name = "REGION")]
    region: Option<String>,
    /// Instance ID, private IPv4 address, or name of the instance.
    #[arg(value_name = "LOOKUP")]
    lookup: Option<String>,
}

#[derive(Debug, Error)]
enum CliError {
    #[error("configuration error: {0}")]
    Config(String),
    #[error("found no instances")]
    NoInstances,
    #[error(transparent)]
    Resolve(#[from] ResolveError<Ec2InventoryError>),
    #[error(transparent)]
    Launch(#[from] LaunchError),
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let exit_code = match dispatch(cli).await {
        Ok(code) => code,
        Err(err) => {
            report_error(&err);
            1
        }
    };

    process::exit(exit_code);
}

fn init_tracing(verbose: bool) {
    let default_directive = if verbose { "awssh=debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("AWSSH_LOG")
                .unwrap_or_else(|_| default_directive.into()),
        )
        .with_writer(io::stderr)
        .init();
}

async fn dispatch(cli: Cli) -> Result<i32, CliError> {
    match cli.lookup.clone() {
        Some(lookup) => connect(&cli, &lookup).await,
        None if cli.list => list_instances(&cli).await,
        None => {
            write_usage(&mut io::stderr());
            Ok(1)
        }
    }
}

async fn connect(cli: &Cli, lookup: &str) -> Result<i32, CliError> {
    let resolver = resolver_from_cli(cli).await;

    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut output = io::stdout();
    let record = match resolver.resolve(lookup, &mut input, &mut output).await? {
        Resolution::Cancelled => return Ok(0),
        Resolution::Instance(record) => record,
    };

    let config = load_config(cli)?;
    let launcher = SshLauncher::with_process_spawner(config)?;
    let options = LaunchOptions {
        verbose: cli.verbose,
        remote_command: cli.command.clone(),
    };
    launcher.connect(&record, &options)?;
    Ok(0)
}

async fn list_instances(cli: &Cli) -> Result<i32, CliError> {
    let resolver = resolver_from_cli(cli).await;
    let candidates = resolver.list().await?;
    if candidates.is_empty() {
        return Err(CliError::NoInstances);
    }

    write!(io::stdout(), "{}", render_table(&candidates)).ok();
    Ok(0)
}

async fn resolver_from_cli(cli: &Cli) -> Resolver<Ec2Inventory> {
    Resolver::new(Ec2Inventory::from_env(cli.profile.clone(), cli.region.clone()).await)
}

fn load_config(cli: &Cli) -> Result<ConnectConfig, CliError> {
    let mut config =
        ConnectConfig::load_without_cli_args().map_err(|err| CliError::Config(err.to_string()))?;
    if let Some(ref key_path) = cli.key_path {
        config.key_dir = key_path.clone();
    }
    Ok(config)
}

fn write_usage(target: &mut impl Write) {
    let mut command = Cli::command();
    let help = command.render_help();
    write!(target, "{help}").ok();
}

fn report_error(err: &CliError) {
    write_error(io::stderr(), err);
}

fn write_error(mut target: impl Write, err: &CliError) {
    writeln!(target, "{err}").ok();
}
