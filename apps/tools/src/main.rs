use anyhow::Result;
use clap::{Parser, Subcommand};
use client_core::{LandingController, LeadField};
use url::Url;

#[derive(Parser, Debug)]
struct Cli {
    #[arg(long, default_value = "http://127.0.0.1:8080")]
    gateway_url: String,
    /// Page URL reported as the lead source; defaults to the gateway root.
    #[arg(long)]
    page_url: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    ShowConfig,
    SubmitLead {
        name: String,
        email: String,
        #[arg(long, default_value = "")]
        company: String,
        #[arg(long, default_value = "")]
        message: String,
    },
    Confirm {
        token: String,
    },
    Resend {
        email: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let page_url = cli
        .page_url
        .clone()
        .unwrap_or_else(|| format!("{}/", cli.gateway_url.trim_end_matches('/')));

    match cli.command {
        Command::ShowConfig => {
            let controller = LandingController::new(&cli.gateway_url, &page_url);
            controller.load_config().await;
            let config = controller.snapshot().await.config;
            println!("enabled={}", config.enabled);
            println!("cta={}", config.cta);
            println!("headline={}", config.headline);
            println!("subheadline={}", config.subheadline);
        }
        Command::SubmitLead {
            name,
            email,
            company,
            message,
        } => {
            let controller = LandingController::new(&cli.gateway_url, &page_url);
            controller.set_field(LeadField::Name, name).await;
            controller.set_field(LeadField::Email, email).await;
            controller.set_field(LeadField::Company, company).await;
            controller.set_field(LeadField::Message, message).await;
            controller.submit_lead().await;
            let snapshot = controller.snapshot().await;
            println!(
                "status={:?} message={}",
                snapshot.submission_status, snapshot.submission_message
            );
        }
        Command::Confirm { token } => {
            let mut page = Url::parse(&page_url)?;
            page.query_pairs_mut().append_pair("confirm", &token);
            let controller = LandingController::new(&cli.gateway_url, page.as_str());
            controller.check_confirmation().await;
            let snapshot = controller.snapshot().await;
            match snapshot.confirmation.banner() {
                Some(banner) => println!("{banner}"),
                None => println!("no confirmation was attempted"),
            }
        }
        Command::Resend { email } => {
            let controller = LandingController::new(&cli.gateway_url, &page_url);
            controller.set_resend_email(email).await;
            controller.resend_confirmation().await;
            println!("{}", controller.snapshot().await.resend_message);
        }
    }

    Ok(())
}
