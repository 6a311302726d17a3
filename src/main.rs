//! command-exec binary entry point.

use std::io::Write;
use std::process::ExitCode;

use command_exec::cli::{self, Args, Backend};
use command_exec::config::Config;
use command_exec::execution::run_command_async;
use command_exec::remote::Host;
use command_exec::{logging, Bash, CommandExecutor, Exec, PowerShell};
use tracing::info;

fn build_executor(args: &Args, config: &Config) -> Box<dyn CommandExecutor> {
    match args.backend {
        Backend::Exec => Box::new(Exec),
        Backend::Bash => Box::new(Bash::new()),
        Backend::PowerShell => Box::new(PowerShell::new()),
        Backend::Ssh => match args.host.as_deref() {
            Some(host) => Box::new(config.ssh_client(host)),
            None => Box::new(Exec),
        },
    }
}

async fn run(args: Args) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let config = Config::load(&args)?;
    if let Err(e) = logging::init_with_filter(config.log_filter()) {
        eprintln!("warning: {}", e);
    }

    if let Some(ref hostname) = args.host {
        let host = Host::from_ssh_client(config.ssh_client(hostname));
        let wait = config.wait_options();
        if args.wait_ping {
            let elapsed = host.wait_until_pingable(&Exec, &wait)?;
            info!(host = %hostname, ?elapsed, "host answers pings");
        }
        if args.wait_ssh {
            let elapsed = host.wait_until_ssh_reachable(&wait)?;
            info!(host = %hostname, ?elapsed, "host accepts ssh");
        }
    }

    if args.command.is_empty() {
        return Ok(ExitCode::SUCCESS);
    }

    let executor = build_executor(&args, &config);
    let options = config
        .run_options(args.command.clone())?
        .allow_all_exit_codes(args.allow_all_exit_codes)
        .run_as_root(args.root);

    let output = run_command_async(executor.as_ref(), &options).await?;

    if !options.live_output_on_stdout {
        std::io::stdout().write_all(output.stdout_as_bytes()?)?;
    }
    std::io::stderr().write_all(output.stderr_as_bytes()?)?;

    let code = output.return_code()?;
    Ok(ExitCode::from(u8::try_from(code).unwrap_or(1)))
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = match cli::parse_args().and_then(|a| a.validate().map(|()| a)) {
        Ok(args) => args,
        Err(e) => {
            eprintln!("error: {}", e);
            eprintln!("Try 'command-exec --help' for more information.");
            return ExitCode::from(2);
        }
    };

    if args.help {
        cli::print_help();
        return ExitCode::SUCCESS;
    }
    if args.version {
        cli::print_version();
        return ExitCode::SUCCESS;
    }

    match run(args).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}
