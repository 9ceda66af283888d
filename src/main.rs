use clap::{Parser, ValueEnum};
use keystache_broker::application::broker::Broker;
use keystache_broker::config::BrokerConfig;
use keystache_broker::domain::ports::SharedEmitter;
use keystache_broker::domain::verdict::PayInvoiceOutcome;
use keystache_broker::infrastructure::channel::ChannelEmitter;
use keystache_broker::infrastructure::policy::{FixedPayPolicy, FixedSignPolicy, PubkeyAllowList};
use keystache_broker::interfaces::jsonl::{RequestReader, ResponseWriter};
use miette::{IntoDiagnostic, Result};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::BufReader;
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum SignPolicy {
    Approve,
    Deny,
}

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// JSON configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Answer every sign-event request the same way
    #[arg(long, value_enum)]
    sign_policy: Option<SignPolicy>,

    /// Report this outcome for every invoice (paid, failed or denied)
    #[arg(long)]
    pay_policy: Option<PayInvoiceOutcome>,

    /// Approve signing for this requester public key (repeatable)
    #[arg(long = "allow-pubkey")]
    allow_pubkeys: Vec<String>,

    /// Discard a handler's opinion if it takes longer than this
    #[arg(long)]
    handler_timeout_ms: Option<u64>,

    /// Default log filter when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn init_tracing(log_level: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .into_diagnostic()?;

    // Stdout carries verdicts, so logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|e| miette::miette!("failed to initialise logging: {e}"))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level)?;

    let mut config = match &cli.config {
        Some(path) => BrokerConfig::load(path).into_diagnostic()?,
        None => BrokerConfig::default(),
    };
    if let Some(ms) = cli.handler_timeout_ms {
        config = config.with_handler_timeout(Duration::from_millis(ms));
    }
    config.validate().into_diagnostic()?;

    let (emitter, mut responses) = ChannelEmitter::new(config.channel_capacity);
    let emitter: SharedEmitter = Arc::new(emitter);
    let broker = Broker::new(emitter, config.clone());

    match cli.sign_policy {
        Some(SignPolicy::Approve) => {
            broker.register_sign_event_handler(FixedSignPolicy::approve_all());
        }
        Some(SignPolicy::Deny) => {
            broker.register_sign_event_handler(FixedSignPolicy::deny_all());
        }
        None => {}
    }
    if !cli.allow_pubkeys.is_empty() {
        broker.register_sign_event_handler(PubkeyAllowList::new(cli.allow_pubkeys));
    }
    if let Some(outcome) = cli.pay_policy {
        broker.register_pay_invoice_handler(FixedPayPolicy::new(outcome));
    }
    info!(
        handler_timeout = ?broker.config().handler_timeout,
        sign_handlers = broker.sign_event_handlers().len(),
        pay_handlers = broker.pay_invoice_handlers().len(),
        "Broker ready"
    );

    // Write verdicts as they are emitted
    let writer = tokio::spawn(async move {
        let mut writer = ResponseWriter::new(tokio::io::stdout());
        while let Some(response) = responses.recv().await {
            writer.write_response(&response).await?;
        }
        Ok::<_, keystache_broker::error::BrokerError>(())
    });

    let (inbound, receiver) = mpsc::channel(config.channel_capacity);
    let listener = broker.listen(receiver);
    drop(broker);

    let mut reader = RequestReader::new(BufReader::new(tokio::io::stdin()));
    while let Some(request) = reader.next_request().await {
        match request {
            Ok(request) => {
                if inbound.send(request).await.is_err() {
                    error!("Broker stopped accepting requests");
                    break;
                }
            }
            Err(e) => {
                warn!(error = %e, "Error reading request");
            }
        }
    }

    drop(inbound);
    listener.join().await;
    writer.await.into_diagnostic()?.into_diagnostic()?;

    Ok(())
}
