//! Sign-up, sign-in, and password management.

use clap::{Args, Subcommand};
use loom_core::account::{
    validate_email, validate_new_password, validate_otp, ChangePasswordRequest, RegisterRequest,
    ResetPasswordRequest, VerifyOtpRequest, VerifyResetOtpRequest,
};
use loom_core::auth::Persistence;

use super::App;
use crate::prompt;

#[derive(Args, Debug)]
pub struct RegisterArgs {
    #[arg(long)]
    pub email: Option<String>,
    #[arg(long)]
    pub first_name: Option<String>,
    #[arg(long)]
    pub last_name: Option<String>,
    /// Read from the prompt when omitted
    #[arg(long, env = "LOOM_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
}

#[derive(Args, Debug)]
pub struct VerifyArgs {
    #[arg(long)]
    pub email: Option<String>,
    /// Six-digit code from the e-mail
    #[arg(long)]
    pub code: Option<String>,
    /// Keep the session across restarts
    #[arg(long)]
    pub remember: bool,
}

#[derive(Args, Debug)]
pub struct LoginArgs {
    /// Defaults to the last e-mail used
    #[arg(long)]
    pub email: Option<String>,
    #[arg(long, env = "LOOM_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
    /// Keep the session across restarts
    #[arg(long)]
    pub remember: bool,
}

#[derive(Subcommand, Debug)]
pub enum PasswordCommand {
    /// E-mail a reset code
    Forgot {
        #[arg(long)]
        email: Option<String>,
    },
    /// Verify a reset code and choose a new password
    Reset {
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        code: Option<String>,
    },
    /// Change the password of the signed-in account
    Change,
}

fn persistence(remember: bool) -> Persistence {
    if remember {
        Persistence::Remembered
    } else {
        Persistence::SessionOnly
    }
}

fn email_or_ask(app: &App, given: Option<String>) -> anyhow::Result<String> {
    let email = match given.or_else(|| app.remembered_email()) {
        Some(email) => email.trim().to_string(),
        None => prompt::line("E-mail")?,
    };
    validate_email(&email)?;
    Ok(email)
}

fn new_password(given: Option<String>) -> anyhow::Result<String> {
    let password = prompt::secret(given.clone(), "New password")?;
    let confirmation = match given {
        Some(given) => given,
        None => prompt::secret(None, "Confirm password")?,
    };
    validate_new_password(&password, &confirmation)?;
    Ok(password)
}

pub async fn register(app: &App, args: RegisterArgs) -> anyhow::Result<()> {
    let email = match args.email {
        Some(email) => email.trim().to_string(),
        None => prompt::line("E-mail")?,
    };
    validate_email(&email)?;
    let first_name = prompt::or_ask(args.first_name, "First name")?;
    let last_name = prompt::or_ask(args.last_name, "Last name")?;
    let password = new_password(args.password)?;

    let response = app
        .api
        .register(&RegisterRequest {
            email: email.clone(),
            password,
            first_name,
            last_name,
        })
        .await?;

    println!("{}", response.message);
    if response.otp_sent {
        println!("Check {email} for a 6-digit code, then run `loom verify --email {email}`.");
    }
    Ok(())
}

pub async fn verify(app: &App, args: VerifyArgs) -> anyhow::Result<()> {
    let email = email_or_ask(app, args.email)?;
    let code = prompt::or_ask(args.code, "Verification code")?;
    validate_otp(&code)?;

    let persistence = persistence(args.remember);
    app.api
        .verify_otp(
            &VerifyOtpRequest {
                email: email.clone(),
                otp_code: code.trim().to_string(),
                password: None,
            },
            persistence,
        )
        .await?;
    app.sessions.save_from(app.api.auth(), Some(email.clone()))?;

    println!("E-mail verified. Signed in as {email}.");
    Ok(())
}

pub async fn login(app: &App, args: LoginArgs) -> anyhow::Result<()> {
    let email = email_or_ask(app, args.email)?;
    let password = prompt::secret(args.password, "Password")?;

    let persistence = persistence(args.remember);
    app.api.login(&email, &password, persistence).await?;
    app.sessions.save_from(app.api.auth(), Some(email.clone()))?;

    match persistence {
        Persistence::Remembered => println!("Signed in as {email}. Session remembered."),
        Persistence::SessionOnly => println!("Signed in as {email} until you log out or restart."),
    }
    Ok(())
}

pub fn logout(app: &App) -> anyhow::Result<()> {
    let was_signed_in = app.api.logout();
    app.sessions.clear()?;
    if was_signed_in {
        println!("Signed out.");
    } else {
        println!("Not signed in.");
    }
    Ok(())
}

pub async fn password(app: &App, command: PasswordCommand) -> anyhow::Result<()> {
    match command {
        PasswordCommand::Forgot { email } => {
            let email = email_or_ask(app, email)?;
            let response = app.api.forgot_password(&email).await?;
            println!("{}", response.message);
            println!("Then run `loom password reset --email {email}`.");
        }
        PasswordCommand::Reset { email, code } => {
            let email = email_or_ask(app, email)?;
            let code = prompt::or_ask(code, "Reset code")?;
            validate_otp(&code)?;

            let verified = app
                .api
                .verify_reset_otp(&VerifyResetOtpRequest {
                    email,
                    otp_code: code.trim().to_string(),
                })
                .await?;
            let new_password = new_password(None)?;
            let response = app
                .api
                .reset_password(&ResetPasswordRequest {
                    token: verified.reset_token,
                    new_password,
                })
                .await?;
            println!("{}", response.message);
        }
        PasswordCommand::Change => {
            app.require_login()?;
            let current_password = prompt::secret(None, "Current password")?;
            let new_password = new_password(None)?;
            let response = app
                .api
                .change_password(&ChangePasswordRequest {
                    current_password,
                    new_password,
                })
                .await?;
            println!("{}", response.message);
        }
    }
    Ok(())
}
