use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use assistant_llm::{ChatAssistant, GeminiProvider, SendOutcome};
use clap::{Parser, Subcommand};
use colored::Colorize;
use contact_mailer::{ContactFormState, ContactFormSubmitter, EmailJsClient, SubmissionStatus};
use site_core::{Config, Role, TokioTimer, Transcript};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "site-cli")]
#[command(about = "Talk to the portfolio assistant or send the contact form")]
#[command(version)]
struct Cli {
    /// TOML config file (defaults to ~/.portfolio/config.json, then ./config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start interactive chat
    Chat,
    /// Ask a single question and print the transcript
    Ask {
        /// Message content
        message: String,
    },
    /// Validate and send the contact form
    Contact {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long, default_value = "")]
        subject: String,
        #[arg(long, default_value = "")]
        phone: String,
        #[arg(long)]
        message: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(
            fmt::layer()
                .with_target(true)
                .with_thread_ids(false)
                .with_line_number(true)
                .with_file(false)
                .with_writer(io::stderr),
        )
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::from_path(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => Config::new(),
    };

    match cli.command {
        Commands::Chat => run_interactive_chat(&config).await,
        Commands::Ask { message } => ask(&config, &message).await,
        Commands::Contact {
            name,
            email,
            subject,
            phone,
            message,
        } => {
            let form = ContactFormState {
                name,
                email,
                subject,
                phone,
                message,
            };
            send_contact(&config, form).await
        }
    }
}

fn build_assistant(config: &Config) -> anyhow::Result<ChatAssistant> {
    let provider = GeminiProvider::from_config(&config.assistant)?;
    tracing::debug!("Using Gemini model '{}'", provider.model());
    Ok(ChatAssistant::from_config(Arc::new(provider), config))
}

fn print_message(role: Role, content: &str) {
    match role {
        Role::User => println!("{} {}", "You:".cyan().bold(), content),
        Role::Assistant => println!("{} {}", "Assistant:".green().bold(), content),
    }
}

fn print_transcript(transcript: &Transcript) {
    for message in transcript.messages() {
        print_message(message.role, &message.content);
    }
}

async fn ask(config: &Config, message: &str) -> anyhow::Result<()> {
    let assistant = build_assistant(config)?;

    if assistant.send_message(message).await == SendOutcome::Empty {
        println!("{}", "Nothing to send.".yellow());
        return Ok(());
    }

    print_transcript(&assistant.transcript());
    Ok(())
}

async fn run_interactive_chat(config: &Config) -> anyhow::Result<()> {
    let assistant = build_assistant(config)?;

    println!("{}", "Portfolio assistant".cyan().bold());
    println!("{}", "Type 'exit' or 'quit' to leave".dimmed());
    println!();
    print_transcript(&assistant.transcript());

    loop {
        print!("{} ", "You:".cyan().bold());
        io::stdout().flush()?;

        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 {
            break;
        }
        let input = input.trim();

        if input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit") {
            println!("{}", "Goodbye!".cyan());
            break;
        }

        if assistant.send_message(input).await == SendOutcome::Empty {
            continue;
        }

        if let Some(reply) = assistant.transcript().last() {
            print_message(reply.role, &reply.content);
        }
        println!();
    }

    Ok(())
}

async fn send_contact(config: &Config, form: ContactFormState) -> anyhow::Result<()> {
    let sender = EmailJsClient::from_config(&config.mail)?;
    let submitter =
        ContactFormSubmitter::from_config(Arc::new(sender), Arc::new(TokioTimer::new()), config);

    let status = submitter.submit(form).await;

    let errors = submitter.errors();
    if !errors.is_empty() {
        for (field, message) in errors.iter() {
            println!("{}", format!("{}: {}", field, message).red());
        }
        anyhow::bail!("contact form has {} invalid field(s)", errors.len());
    }

    match status {
        SubmissionStatus::Success => {
            println!("{}", "Message sent! We'll get back to you soon.".green());
            Ok(())
        }
        SubmissionStatus::Error => {
            println!(
                "{}",
                format!(
                    "Failed to send message. Please try again or email {} directly.",
                    submitter.destination()
                )
                .red()
            );
            anyhow::bail!("email delivery failed")
        }
        SubmissionStatus::Idle => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn contact_optional_fields_default_to_empty() {
        let cli = Cli::parse_from([
            "site-cli",
            "contact",
            "--name",
            "Ada",
            "--email",
            "ada@example.com",
            "--message",
            "hello",
        ]);

        match cli.command {
            Commands::Contact { subject, phone, .. } => {
                assert!(subject.is_empty());
                assert!(phone.is_empty());
            }
            _ => panic!("expected contact command"),
        }
    }

    #[test]
    fn global_config_flag_after_subcommand() {
        let cli = Cli::parse_from(["site-cli", "ask", "hi", "--config", "site.toml"]);
        assert_eq!(cli.config, Some(PathBuf::from("site.toml")));
        assert!(matches!(cli.command, Commands::Ask { message } if message == "hi"));
    }
}
