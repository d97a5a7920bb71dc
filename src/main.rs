use std::sync::Arc;

use anyhow::Context;
use tokio::io::BufReader;

use drill_intake::channels::{ConsoleChannel, WebState, registration_routes};
use drill_intake::classifier::ClassifierGateway;
use drill_intake::config::IntakeConfig;
use drill_intake::intake::FlowController;
use drill_intake::llm::create_provider;
use drill_intake::submission::{HttpRegistrationApi, RegistrationSubmitter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env is fine; real environment variables still apply.
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let mode = std::env::args().nth(1).unwrap_or_else(|| "console".to_string());
    let config = IntakeConfig::from_env().context("Invalid configuration")?;
    let flow = build_controller(&config)?;

    match mode.as_str() {
        "console" => {
            let stdin = BufReader::new(tokio::io::stdin());
            ConsoleChannel::new(&flow, stdin, tokio::io::stdout())
                .run()
                .await?;
        }
        "serve" => {
            let app = registration_routes(WebState::new(Arc::new(flow)));
            let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.http_port))
                .await
                .with_context(|| format!("Failed to bind port {}", config.http_port))?;
            tracing::info!(port = config.http_port, "Registration server started");
            axum::serve(listener, app).await?;
        }
        other => anyhow::bail!("Unknown mode '{other}' (expected console or serve)"),
    }

    Ok(())
}

fn build_controller(config: &IntakeConfig) -> anyhow::Result<FlowController> {
    let llm = create_provider(&config.llm)?;
    tracing::info!(model = %config.llm.model, "Language model ready");

    let gateway = Arc::new(
        ClassifierGateway::new(llm)
            .with_temperature(config.temperature)
            .with_max_tokens(config.max_tokens),
    );
    let api = Arc::new(HttpRegistrationApi::new(&config.api)?);
    let submitter = RegistrationSubmitter::new(Arc::clone(&gateway), api, config.api.clone());

    Ok(FlowController::new(gateway, submitter, config.defaults.clone())
        .with_retry_policy(config.retry))
}
