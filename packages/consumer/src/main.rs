use std::sync::Arc;

use anyhow::Context;
use consumer::{ConsumerAppConfig, Dispatcher, LogNotifier, ProcessBackend};
use mq::{BroccoliError, MqConfig, RawMessage, init_mq};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_target(false)
        .init();

    let config = ConsumerAppConfig::load().context("Failed to load config")?;
    let topic = config.consumer.topic;
    info!(
        consumer_id = %config.consumer.id,
        %topic,
        concurrency = config.consumer.concurrency,
        max_retries = config.consumer.retry.max_retries,
        retry_backend_errors = config.consumer.retry.retry_backend_errors,
        "Consumer starting"
    );

    let mq = init_mq(MqConfig::from(&config.mq))
        .await
        .context("Failed to initialize MQ")?;

    let backend = ProcessBackend::from(&config.consumer.backend);
    let dispatcher = Arc::new(Dispatcher::new(
        backend,
        LogNotifier,
        config.consumer.retry.clone(),
    ));

    let result = mq
        .process_messages(
            topic.as_str(),
            Some(config.consumer.concurrency),
            None,
            move |message: RawMessage| {
                let dispatcher = Arc::clone(&dispatcher);
                async move {
                    let message_id = message.task_id.to_string();
                    dispatcher
                        .dispatch(topic, &message_id, &message.payload)
                        .await;
                    Ok::<_, BroccoliError>(())
                }
            },
        )
        .await;

    if let Err(e) = result {
        error!(error = %e, "Consumer stopped unexpectedly");
    }

    info!("Consumer stopped");
    Ok(())
}
