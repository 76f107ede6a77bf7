//! bazaar-cli: command-line client for the Bazaar marketplace API.
#![deny(clippy::all, clippy::pedantic)]

mod args;
mod context;
mod handlers;
mod io;
mod print;

use bazaar::config;
use bazaar::infra::telemetry;
use clap::Parser;
use tracing::debug;

use args::{Cli, Commands};
use context::{CliError, Ctx};
use handlers::{admin, auth, buyer, products, seller};

#[tokio::main]
async fn main() -> Result<(), CliError> {
    let cli = Cli::parse();
    let settings = config::load(&cli.config)?;
    telemetry::init(&settings.logging)?;

    let ctx = Ctx::from_settings(&settings)?;
    if let Some(identity) = ctx.market.restore_session().await? {
        debug!(user_id = %identity.user_id, "session restored");
    }

    run(&ctx, cli.command).await
}

async fn run(ctx: &Ctx, command: Commands) -> Result<(), CliError> {
    match command {
        Commands::Login {
            email,
            password_file,
            password_env,
        } => auth::login(ctx, email, password_file, password_env).await,
        Commands::Register {
            name,
            email,
            password_file,
            password_env,
            role,
        } => {
            let input = auth::RegisterInput {
                name,
                email,
                password_file,
                password_env,
                role,
            };
            auth::register(ctx, input).await
        }
        Commands::Logout => auth::logout(ctx).await,
        Commands::Whoami => auth::whoami(ctx).await,
        Commands::Products(cmd) => products::handle(ctx, cmd.action).await,
        Commands::Cart(cmd) => buyer::cart(ctx, cmd.action).await,
        Commands::Orders(cmd) => buyer::orders(ctx, cmd.action).await,
        Commands::Seller(cmd) => seller::handle(ctx, cmd.action).await,
        Commands::Admin(cmd) => admin::handle(ctx, cmd.action).await,
    }
}

#[cfg(test)]
mod tests;
