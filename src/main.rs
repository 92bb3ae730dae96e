use clap::Parser;
use envcrypt::cli::{commands, output, Cli, Commands};
use tracing_subscriber::EnvFilter;

fn main() {
    // Diagnostics go to stderr; RUST_LOG overrides the default level.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Set { ref key, ref value } => commands::set::execute(&cli, key, value.as_deref()),
        Commands::Get { ref key } => commands::get::execute(&cli, key),
        Commands::List => commands::list::execute(&cli),
        Commands::Remove { ref key, force } => commands::remove::execute(&cli, key, force),
        Commands::Import { ref file } => commands::import_cmd::execute(&cli, file),
        Commands::Export {
            ref format,
            ref output,
        } => commands::export::execute(&cli, format.as_deref(), output.as_deref()),
        Commands::Run {
            ref command,
            clean_env,
        } => commands::run::execute(&cli, command, clean_env),
        Commands::ChangePassword => commands::change_password::execute(&cli),
        Commands::Stats => commands::stats::execute(&cli),
        Commands::CreateShares {
            parts,
            threshold,
            ref out,
        } => commands::create_shares::execute(&cli, parts, threshold, out),
        Commands::Recover { ref shares } => commands::recover::execute(&cli, shares),
        Commands::Audit { last } => commands::audit_cmd::execute(&cli, last),
    };

    match result {
        Ok(()) => {}
        // Mirror the child's exit status without an extra error line.
        Err(envcrypt::errors::EnvCryptError::ChildProcessFailed(code)) => std::process::exit(code),
        Err(e) => {
            output::error(&e.to_string());
            std::process::exit(1);
        }
    }
}
