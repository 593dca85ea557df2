use std::sync::Arc;

use inbox_triage::auth::OAuthClient;
use inbox_triage::classify::Classifier;
use inbox_triage::config::TriageConfig;
use inbox_triage::drafter::Drafter;
use inbox_triage::inference::{HttpInference, Inference};
use inbox_triage::labels::LabelManager;
use inbox_triage::limiter::RateLimiter;
use inbox_triage::mailbox::MailboxClient;
use inbox_triage::pipeline::Orchestrator;
use inbox_triage::queue::ReplyQueue;
use inbox_triage::server::{self, AppState};
use inbox_triage::transport::SmtpMailTransport;
use inbox_triage::worker::DeliveryWorker;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Install rustls crypto provider before any TLS usage
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("Failed to install rustls crypto provider");

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = TriageConfig::from_env()?;
    let http = reqwest::Client::new();

    eprintln!("📬 Inbox Triage v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Mailbox API: {}", config.mailbox_base_url);
    eprintln!(
        "   Rate limit: one call per {}ms",
        config.min_call_interval.as_millis()
    );
    eprintln!(
        "   Queue: {} ({} worker(s), {} attempts)",
        config.queue_name, config.worker_count, config.max_delivery_attempts
    );
    eprintln!(
        "   Consent: http://0.0.0.0:{}/  Callback: {}\n",
        config.http_port, config.oauth.redirect_uri
    );

    // One limiter paces every provider and inference call.
    let limiter = RateLimiter::new(config.min_call_interval);

    let mailbox = Arc::new(MailboxClient::new(
        http.clone(),
        config.mailbox_base_url.clone(),
        limiter.clone(),
    ));
    let inference: Arc<dyn Inference> =
        Arc::new(HttpInference::new(http.clone(), &config.inference));

    let labels = Arc::new(LabelManager::new(Arc::clone(&mailbox)));
    let classifier = Arc::new(Classifier::new(Arc::clone(&inference), limiter.clone()));
    let drafter = Arc::new(Drafter::new(
        Arc::clone(&inference),
        limiter.clone(),
        config.persona.clone(),
    ));

    // Reply queue and delivery worker(s)
    let queue = ReplyQueue::new(config.queue_name.clone(), config.max_delivery_attempts);
    let transport = Arc::new(SmtpMailTransport::new(&config.smtp));
    let _delivery_handles = DeliveryWorker::new(
        Arc::clone(&queue),
        transport,
        config.smtp.from_address.clone(),
    )
    .spawn(config.worker_count);

    let orchestrator = Arc::new(Orchestrator::new(
        mailbox,
        labels,
        classifier,
        drafter,
        queue,
        config.enqueue_delay,
    ));
    let oauth = Arc::new(OAuthClient::new(http, config.oauth.clone()));

    let app = server::routes(AppState {
        oauth,
        orchestrator,
    });
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.http_port)).await?;
    tracing::info!(port = config.http_port, "Trigger server started");
    axum::serve(listener, app).await?;

    Ok(())
}
