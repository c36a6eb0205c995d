//! Main signon-cli command line entry points
use crate::{paths::config_file, settings::Settings};
use anyhow::Result;
use clap::{Parser, Subcommand};
use inquire::{ui::RenderConfig, PasswordDisplayMode};
use signon_core::{
    code::CODE_LENGTH,
    common::{Credentials, RegistrationRequest, StudyGroup, StudyLevel},
    error::AuthError,
    flow::AuthFlow,
    machine::SessionState,
    messages::{self, Notice, Severity},
    resend::ResendState,
    transport::HttpAuthTransport,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use url::Url;

#[derive(Debug, Parser)]
#[command(name = "signon")]
#[command(about = "Manage your signon account from the command line")]
pub struct Cli {
    #[arg(long, help = "Override the API endpoint of the signon backend")]
    api_endpoint: Option<Url>,
    #[arg(long, help = "Whether to turn off ansi terminal colors")]
    no_colors: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Account and login management commands
    Account(AccountCmds),
    /// Print file paths used by the application (e.g. the path to config)
    Paths,
}

#[derive(Debug, Parser)]
pub struct AccountCmds {
    #[command(subcommand)]
    command: AccountCommands,
}

#[derive(Debug, Subcommand)]
pub enum AccountCommands {
    /// Create a new signon account and verify its email address
    Register,
    /// Login to an existing signon account
    Login,
}

impl Cli {
    pub async fn run(&self, mut settings: Settings) -> Result<()> {
        let ansi = !self.no_colors;
        setup_tracing(ansi);

        if let Some(api_endpoint) = &self.api_endpoint {
            settings.api_endpoint = api_endpoint.clone();
        }

        match &self.command {
            Commands::Account(account) => {
                let mut state = CliState::new(&settings, ansi);

                match &account.command {
                    AccountCommands::Register => state.register().await?,
                    AccountCommands::Login => state.login().await?,
                }
            }
            Commands::Paths => {
                println!(
                    "{}",
                    config_file().to_str().expect("non utf8 config file path")
                );
            }
        }

        Ok(())
    }
}

#[derive(Debug)]
pub(crate) struct CliState {
    pub(crate) render_config: RenderConfig,
    pub(crate) flow: AuthFlow<HttpAuthTransport>,
}

impl CliState {
    fn new(settings: &Settings, colors: bool) -> Self {
        let render_config = if colors {
            RenderConfig::default_colored()
        } else {
            RenderConfig::empty()
        };

        let transport = HttpAuthTransport::new(settings.api_endpoint.clone());

        Self {
            render_config,
            flow: AuthFlow::new(transport),
        }
    }

    async fn login(&mut self) -> Result<()> {
        let identifier = inquire::Text::new("Email or username:")
            .with_render_config(self.render_config)
            .prompt()?;
        tracing::info!(identifier, "Identifier entered");

        let secret = inquire::Password::new("Password:")
            .with_render_config(self.render_config)
            .with_display_mode(PasswordDisplayMode::Masked)
            .without_confirmation()
            .prompt()?;

        self.flow.login(Credentials { identifier, secret }).await?;
        self.report_notices();

        match self.flow.machine().state() {
            SessionState::Authenticated { session } => {
                println!("Successfully logged in as {}", session.user.username);
                tracing::info!(username = %session.user.username, "Logged into account");
            }
            SessionState::PendingVerification { .. } => {
                self.verification_loop().await?;
            }
            _ => {}
        }

        Ok(())
    }

    async fn register(&mut self) -> Result<()> {
        loop {
            let request = self.prompt_registration()?;

            match self.flow.register(request).await {
                Ok(_) => break,
                Err(AuthError::Validation(errors)) => {
                    println!("{errors}");
                    println!("Please try again.");
                }
                Err(error) => return Err(error.into()),
            }
        }

        self.report_notices();

        if matches!(
            self.flow.machine().state(),
            SessionState::PendingVerification { .. }
        ) {
            self.verification_loop().await?;
        }

        Ok(())
    }

    async fn verification_loop(&mut self) -> Result<()> {
        const ENTER_CODE: &str = "Enter the verification code";
        const RESEND_CODE: &str = "Resend the code";
        const CANCEL: &str = "Cancel";

        loop {
            let email = match self.flow.machine().state() {
                SessionState::PendingVerification { email } => email.clone(),
                _ => break,
            };

            let prompt = format!("A verification code was sent to {email}. What next?");
            let choice = inquire::Select::new(&prompt, vec![ENTER_CODE, RESEND_CODE, CANCEL])
                .with_render_config(self.render_config)
                .prompt()?;

            match choice {
                ENTER_CODE => {
                    self.prompt_code()?;

                    if let Err(error) = self.flow.submit_code().await {
                        match error {
                            AuthError::IncompleteCode => {
                                println!("{}", messages::CODE_MUST_BE_SIX_DIGITS);
                                continue;
                            }
                            other => return Err(other.into()),
                        }
                    }

                    if let Some(error) = self.flow.machine().error() {
                        print_notice(error);
                    }

                    if matches!(self.flow.machine().state(), SessionState::Unauthenticated) {
                        if let Some(banner) = self.flow.machine().banner() {
                            print_notice(banner);
                        }
                        break;
                    }
                }
                RESEND_CODE => match self.flow.resend().await {
                    Ok(ResendState::Sent { message, .. }) => println!("{message}"),
                    Ok(_) => {}
                    Err(error) => return Err(error.into()),
                },
                _ => {
                    self.flow.machine_mut().reset();
                    println!("Cancelled.");
                    break;
                }
            }
        }

        Ok(())
    }

    fn prompt_code(&mut self) -> Result<()> {
        loop {
            let input = inquire::Text::new("Please enter the verification code:")
                .with_render_config(self.render_config)
                .prompt()?;

            let entry = self.flow.machine_mut().code_entry_mut();
            entry.reset();
            for (index, digit) in input.trim().chars().take(CODE_LENGTH).enumerate() {
                entry.set_digit(index, &digit.to_string());
            }

            if entry.is_complete() {
                return Ok(());
            }

            println!("{}", messages::CODE_MUST_BE_SIX_DIGITS);
        }
    }

    fn prompt_registration(&self) -> Result<RegistrationRequest> {
        let username = inquire::Text::new("Choose a username:")
            .with_render_config(self.render_config)
            .prompt()?;

        let name = inquire::Text::new("What's your full name?")
            .with_render_config(self.render_config)
            .prompt()?;

        let email = inquire::Text::new("What's your email address?")
            .with_render_config(self.render_config)
            .prompt()?;
        tracing::info!(email, "Email entered");

        let phone = inquire::Text::new("Phone number (leave empty to skip):")
            .with_render_config(self.render_config)
            .prompt()?;
        let phone = {
            let trimmed = phone.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        };

        let study_level = match inquire::Select::new("Level of study:", vec!["SSC", "HSC"])
            .with_render_config(self.render_config)
            .prompt()?
        {
            "SSC" => StudyLevel::Ssc,
            _ => StudyLevel::Hsc,
        };

        let group = match inquire::Select::new("Group:", vec!["Science", "Arts", "Commerce"])
            .with_render_config(self.render_config)
            .prompt()?
        {
            "Science" => StudyGroup::Science,
            "Arts" => StudyGroup::Arts,
            _ => StudyGroup::Commerce,
        };

        let password = inquire::Password::new("Password:")
            .with_render_config(self.render_config)
            .with_display_mode(PasswordDisplayMode::Masked)
            .without_confirmation()
            .prompt()?;

        let confirm_password = inquire::Password::new("Confirm password:")
            .with_render_config(self.render_config)
            .with_display_mode(PasswordDisplayMode::Masked)
            .without_confirmation()
            .prompt()?;

        Ok(RegistrationRequest {
            username,
            name,
            email,
            phone,
            study_level,
            group,
            password,
            confirm_password,
        })
    }

    fn report_notices(&self) {
        if let Some(banner) = self.flow.machine().banner() {
            print_notice(banner);
        }
        if let Some(error) = self.flow.machine().error() {
            print_notice(error);
        }
    }
}

fn print_notice(notice: &Notice) {
    match notice.severity {
        Severity::Error => eprintln!("{}", notice.text),
        _ => println!("{}", notice.text),
    }
}

fn setup_tracing(ansi: bool) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(ansi)
                .with_writer(std::io::stderr),
        )
        .with(EnvFilter::from_default_env())
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_command_structure() {
        Cli::command().debug_assert();
    }
}
