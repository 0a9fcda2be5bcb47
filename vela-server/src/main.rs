use anyhow::Context;
use clap::Parser;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;
use vela::{Engine, Hub};
use vela_core::stream::stopped;
use vela_ingest::from_tag;
use vela_server::config::Cli;
use vela_server::server;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();
    let cli = Cli::parse();

    let mut builder = Engine::builder().interval(cli.interval);
    for tag in &cli.exchanges {
        let tag = tag.trim();
        if tag.is_empty() || tag.eq_ignore_ascii_case("none") {
            continue;
        }
        match from_tag(tag) {
            Some(connector) => builder = builder.with_connector(connector),
            None => tracing::warn!(tag, "unknown connector; skipped"),
        }
    }
    for symbol in &cli.symbols {
        builder = builder.symbol(symbol);
    }
    let engine = builder.build().context("invalid configuration")?;

    let (stop_tx, stop_rx) = watch::channel(false);
    spawn_signal_listener(stop_tx);

    let listener = TcpListener::bind(&cli.listen_addr)
        .await
        .with_context(|| format!("bind {}", cli.listen_addr))?;
    tracing::info!(addr = %cli.listen_addr, "websocket listening");

    let hub = Hub::new();
    let interval_ms = i64::try_from(engine.interval().as_millis()).unwrap_or(i64::MAX);
    tokio::spawn(server::serve(
        listener,
        hub.clone(),
        interval_ms,
        stop_rx.clone(),
    ));

    #[cfg(feature = "kafka")]
    let publisher = if cli.kafka_enable {
        let p = vela_server::publish::CandlePublisher::new(&cli.kafka_brokers, &cli.kafka_topic)
            .context("kafka producer")?;
        tracing::info!(brokers = %cli.kafka_brokers, topic = %cli.kafka_topic, "kafka enabled");
        Some(p)
    } else {
        None
    };
    #[cfg(not(feature = "kafka"))]
    if cli.kafka_enable {
        anyhow::bail!("built without kafka support; rebuild with --features kafka");
    }

    let mut stream = engine.start(stop_rx.clone());
    let mut stop = stop_rx;
    loop {
        tokio::select! {
            () = stopped(&mut stop) => break,
            maybe = stream.candles.recv() => match maybe {
                Some(candle) => {
                    hub.publish(&candle);
                    #[cfg(feature = "kafka")]
                    if let Some(publisher) = &publisher {
                        publisher.publish(&candle);
                    }
                }
                None => break,
            },
        }
    }

    tracing::info!("shutting down");
    stream.shutdown().await;
    Ok(())
}

/// Flip the stop watch on SIGINT or SIGTERM.
fn spawn_signal_listener(stop_tx: watch::Sender<bool>) {
    tokio::spawn(async move {
        #[cfg(unix)]
        {
            use tokio::signal::unix::{SignalKind, signal};
            match signal(SignalKind::terminate()) {
                Ok(mut term) => {
                    tokio::select! {
                        _ = tokio::signal::ctrl_c() => {}
                        _ = term.recv() => {}
                    }
                }
                Err(_) => {
                    let _ = tokio::signal::ctrl_c().await;
                }
            }
        }
        #[cfg(not(unix))]
        {
            let _ = tokio::signal::ctrl_c().await;
        }
        tracing::info!("signal received");
        let _ = stop_tx.send(true);
    });
}
