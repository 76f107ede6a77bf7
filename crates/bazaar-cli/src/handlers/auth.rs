#![deny(clippy::all, clippy::pedantic)]

use std::path::PathBuf;

use bazaar_api_types::{LoginForm, RegisterForm};
use serde_json::json;

use crate::args::RoleArg;
use crate::context::{CliError, Ctx};
use crate::io::read_secret;
use crate::print::print_json;

pub async fn login(
    ctx: &Ctx,
    email: String,
    password_file: Option<PathBuf>,
    password_env: Option<String>,
) -> Result<(), CliError> {
    let form = LoginForm {
        email,
        password: read_secret(password_env, password_file)?,
        remember: Some(true),
    };
    let identity = ctx.market.login(&form).await?;
    print_json(&identity.user)
}

pub struct RegisterInput {
    pub name: String,
    pub email: String,
    pub password_file: Option<PathBuf>,
    pub password_env: Option<String>,
    pub role: RoleArg,
}

pub async fn register(ctx: &Ctx, input: RegisterInput) -> Result<(), CliError> {
    let password = read_secret(input.password_env, input.password_file)?;
    let form = RegisterForm {
        name: input.name,
        email: input.email,
        confirm_password: password.clone(),
        password,
        role: input.role.role(),
        accept_terms: true,
    };
    let identity = ctx.market.register(&form).await?;
    print_json(&identity.user)
}

pub async fn logout(ctx: &Ctx) -> Result<(), CliError> {
    ctx.market.logout().await?;
    print_json(&json!({ "signedOut": true }))
}

pub async fn whoami(ctx: &Ctx) -> Result<(), CliError> {
    ctx.require_session()?;
    let user = ctx.market.me().await?;
    print_json(&user)
}
