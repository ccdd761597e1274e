//! FDX DCR validation CLI tool.
//!
//! Runs the FDX registration validator against a JSON registration document
//! (the decoded DCR request claims) or renders a stored-metadata document
//! into the FDX registration response. Configuration is read from the same
//! environment variables the library uses:
//!
//! - `FDX_DCR_MAXIMUM_DURATION_PERIOD`
//! - `FDX_DCR_MAXIMUM_LOOKBACK_PERIOD`
//! - `FDX_DCR_DEFAULT_TOKEN_ENDPOINT_AUTH_METHOD`
//! - `FDX_DCR_MODIFY_RESPONSE`
//! - `FDX_DCR_REGISTRATION_BASE_URI` (response rendering only)
//!
//! ## Usage examples
//!
//! ```bash
//! # Validate a registration request document
//! fdx-dcr validate request.json
//!
//! # Validate an update to an existing registration
//! fdx-dcr validate --update request.json
//!
//! # Render the client-facing response from stored metadata
//! fdx-dcr render metadata.json
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::prelude::*;

use fdx_dcr::config::DcrConfig;
use fdx_dcr::dcr::{CredentialIssuer, RegistrationRequest, RegistrationValidator};
use fdx_dcr::errors::RegistrationError;

#[derive(Parser)]
#[command(
    name = "fdx-dcr",
    about = "FDX dynamic client registration validation tool",
    version = env!("CARGO_PKG_VERSION")
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate and normalize a registration request document
    Validate(ValidateArgs),
    /// Render stored client metadata into the registration response
    Render(RenderArgs),
}

#[derive(clap::Args)]
struct ValidateArgs {
    /// Path to the JSON registration request document
    file: PathBuf,

    /// Treat the document as an update to an existing registration
    #[arg(long)]
    update: bool,
}

#[derive(clap::Args)]
struct RenderArgs {
    /// Path to the JSON stored-metadata document
    file: PathBuf,
}

/// Credential issuer for local use: the registration base URI comes from the
/// environment, and access-token issuance is left to the host accelerator.
struct EnvCredentialIssuer {
    base_uri: String,
}

impl EnvCredentialIssuer {
    fn new() -> Self {
        Self {
            base_uri: std::env::var("FDX_DCR_REGISTRATION_BASE_URI").unwrap_or_default(),
        }
    }
}

impl CredentialIssuer for EnvCredentialIssuer {
    fn issue_access_token(
        &self,
        _client_id: &str,
        _tls_certificate: &str,
    ) -> Result<String, RegistrationError> {
        Err(RegistrationError::CredentialIssuance(
            "access token issuance requires the host accelerator".to_string(),
        ))
    }

    fn registration_client_base_uri(&self) -> String {
        self.base_uri.clone()
    }
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        ))
        .with(tracing_subscriber::fmt::layer().pretty())
        .init();

    let cli = Cli::parse();
    let config = DcrConfig::new()?;
    let validator = RegistrationValidator::new(config, Arc::new(EnvCredentialIssuer::new()));

    match cli.command {
        Commands::Validate(args) => validate(&validator, &args),
        Commands::Render(args) => render(&validator, &args),
    }
}

fn validate(validator: &RegistrationValidator, args: &ValidateArgs) -> Result<()> {
    let document = std::fs::read_to_string(&args.file)
        .with_context(|| format!("reading {}", args.file.display()))?;
    let parameters: serde_json::Map<String, serde_json::Value> =
        serde_json::from_str(&document).context("parsing registration request document")?;

    let mut request = RegistrationRequest::from_request_parameters(parameters)
        .context("building registration request")?;

    let result = if args.update {
        validator.validate_update(&mut request)
    } else {
        validator.validate_create(&mut request)
    };

    match result {
        Ok(()) => {
            tracing::info!("registration request is valid");
            println!(
                "{}",
                serde_json::to_string_pretty(&serde_json::Value::Object(
                    request.request_parameters
                ))?
            );
            Ok(())
        }
        Err(err) => {
            eprintln!("error: {} (code: {})", err.description(), err.error_code());
            std::process::exit(1);
        }
    }
}

fn render(validator: &RegistrationValidator, args: &RenderArgs) -> Result<()> {
    let document = std::fs::read_to_string(&args.file)
        .with_context(|| format!("reading {}", args.file.display()))?;
    let metadata: serde_json::Map<String, serde_json::Value> =
        serde_json::from_str(&document).context("parsing stored metadata document")?;

    let response = validator.registration_response(metadata)?;
    println!("{}", response);
    Ok(())
}
