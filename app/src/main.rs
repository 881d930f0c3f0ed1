use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use devlab::io::FileStore;
use devlab::{ApiClient, ApiConfig, SessionManager};
use tracing::{debug, error};

mod cli;
mod error;
mod logging;
mod pages;

pub use error::{Error, Result};

use cli::{Cli, Commands};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    logging::init();

    let args = Cli::parse();
    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{}", err);
            if let Error::Api(api) = &err {
                if api.is_session_expired() {
                    eprintln!("Your session has expired, run `devlab login` again.");
                }
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Cli) -> Result<()> {
    let config = ApiConfig::new(args.api_url);
    let session_path = args.session_file.unwrap_or_else(FileStore::default_path);
    debug!("Session file: {}", session_path.display());

    let store = FileStore::open(session_path)?;
    let session = SessionManager::new(Arc::new(store));
    let client = ApiClient::new(config, session);

    match args.command {
        Commands::Login { username, password } => pages::login::login(&client, &username, password).await,
        Commands::Register(register) => pages::login::register(&client, register).await,
        Commands::Logout => pages::login::logout(&client),
        Commands::Whoami => pages::login::whoami(&client).await,
        Commands::Users(command) => pages::users::run(&client, command).await,
        Commands::Projects(command) => pages::projects::run(&client, command).await,
        Commands::Teams(command) => pages::teams::run(&client, command).await,
        Commands::Tasks(command) => pages::tasks::run(&client, command).await,
    }
}
