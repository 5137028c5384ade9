use clap::Parser;
use lockbox::cli::commands;
use lockbox::cli::{Cli, Commands};

fn main() {
    let cli = Cli::parse();
    lockbox::logging::init(cli.verbose);

    let result = match cli.command {
        Commands::Init => commands::init::execute(&cli),
        Commands::Add {
            ref name,
            ref value,
            secret_type,
        } => commands::add::execute(&cli, name, value.as_deref(), secret_type),
        Commands::Update {
            ref name,
            ref value,
        } => commands::update::execute(&cli, name, value.as_deref()),
        Commands::Get {
            ref name,
            version,
            copy,
        } => commands::get::execute(&cli, name, version, copy),
        Commands::List => commands::list::execute(&cli),
        Commands::History { ref name } => commands::history::execute(&cli, name),
        Commands::Revert {
            ref name,
            version,
            unchecked,
        } => commands::revert::execute(&cli, name, version, unchecked),
        Commands::Delete { ref name, force } => commands::delete::execute(&cli, name, force),
        Commands::Info => commands::info::execute(&cli),
        Commands::Migrate { ref file } => commands::migrate::execute(&cli, file.as_deref()),
        Commands::Audit { last, ref since } => {
            commands::audit_cmd::execute(&cli, last, since.as_deref())
        }
        Commands::Completions { ref shell } => commands::completions::execute(shell),
    };

    if let Err(e) = result {
        tracing::debug!(error = ?e, "command failed");
        lockbox::cli::output::error(&e.to_string());
        std::process::exit(1);
    }
}
