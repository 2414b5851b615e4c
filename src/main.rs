use clap::Parser;
use compound::api::{self, Cli, Command};

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let result = match cli.command {
        Command::Project(args) => api::run_project_command(&args),
        Command::Interactive(args) => api::run_interactive(&args),
        Command::Serve { port } => api::run_http_server(port)
            .await
            .map_err(|e| format!("Server error: {e}")),
    };

    if let Err(e) = result {
        eprintln!("{e}");
        std::process::exit(1);
    }
}
