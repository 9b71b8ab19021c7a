//! Command-line entry point.

use std::process;
use std::time::Duration;

use clap::Parser;
use log::{error, info, warn};

use surelay::config::ElevateConfig;
use surelay::driver;
use surelay::session::ByteStream;
use surelay::transport::{self, SshConfig, SshTransport};

/// Connects to the target and runs the script from stdin on-target after
/// running su.
#[derive(Parser, Debug)]
#[command(name = "surelay", version, about, arg_required_else_help = true)]
struct Args {
    /// Target, as host or host:port
    target: String,

    /// Unprivileged username
    #[arg(long, default_value = "sysadmin", value_name = "USERNAME")]
    user: String,

    /// Unprivileged password
    #[arg(long, default_value = "changeme", value_name = "PASSWORD")]
    pass: String,

    /// Root's password, sent at the su prompt
    #[arg(long, default_value = "changeme", value_name = "PASSWORD")]
    root_pass: String,

    /// Case-insensitive su prompt marker
    #[arg(long, default_value = surelay::config::DEFAULT_PROMPT_MARKER, value_name = "MARKER")]
    prompt: String,

    /// Password buffer length, including space for the MOTD
    #[arg(long, default_value_t = surelay::config::DEFAULT_SCAN_LIMIT, value_name = "BYTES")]
    pblen: usize,

    /// Connection timeout in seconds
    #[arg(long, default_value_t = 30, value_name = "SECONDS")]
    connect_timeout: u64,
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    if let Err(e) = run(args).await {
        error!("{e}");
        process::exit(1);
    }
}

async fn run(args: Args) -> surelay::Result<()> {
    let (host, port) = transport::parse_target(&args.target, transport::DEFAULT_PORT)?;

    let transport = SshTransport::connect(SshConfig {
        host,
        port,
        username: args.user,
        password: args.pass.into(),
        timeout: Duration::from_secs(args.connect_timeout),
    })
    .await?;

    let config = ElevateConfig::new(args.root_pass.into())
        .with_prompt_marker(args.prompt)
        .with_scan_limit(args.pblen);

    let (output, input) = transport.open_shell().await?.split();

    let mut script = tokio::io::stdin();
    let sent = driver::run(
        ByteStream::new(output),
        input,
        &config,
        &mut script,
        tokio::io::stdout(),
    )
    .await?;

    info!("done, sent {sent} bytes to target");

    if let Err(e) = transport.close().await {
        warn!("error closing connection: {e}");
    }

    Ok(())
}
