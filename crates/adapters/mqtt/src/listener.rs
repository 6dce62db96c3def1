//! Inbound side of the transport: drives the rumqttc event loop.

use std::future::Future;
use std::time::Duration;

use rumqttc::{AsyncClient, ConnectionError, Event, EventLoop, Outgoing, Packet, QoS};
use tokio::task::{JoinError, JoinSet};

use homelink_app::ports::MessageHandler;

/// Upper bound on flushing in-flight work once shutdown is requested.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Owns the rumqttc event loop and hands every inbound publish to a
/// [`MessageHandler`] on its own task.
pub struct Listener {
    client: AsyncClient,
    eventloop: EventLoop,
    subscription: String,
    qos: QoS,
    reconnect_delay: Duration,
    subscribe_pending: bool,
}

impl Listener {
    pub(crate) fn new(
        client: AsyncClient,
        eventloop: EventLoop,
        subscription: String,
        qos: QoS,
        reconnect_delay: Duration,
    ) -> Self {
        Self {
            client,
            eventloop,
            subscription,
            qos,
            reconnect_delay,
            subscribe_pending: false,
        }
    }

    /// Poll the broker connection until `shutdown` completes.
    ///
    /// The subscription is renewed on every connection acknowledgement, so a
    /// broker restart is transparent. A renewal the client cannot queue is
    /// retried on the following events. Handler tasks are reaped as they
    /// finish; a panicking handler is logged and does not affect the others.
    ///
    /// On shutdown no new message is accepted, but the event loop keeps
    /// running until in-flight handlers are done and their outbound messages
    /// are flushed, bounded by a grace period.
    pub async fn run<H>(mut self, handler: H, shutdown: impl Future<Output = ()>)
    where
        H: MessageHandler + Clone + 'static,
    {
        let mut tasks = JoinSet::new();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                biased;
                () = &mut shutdown => break,
                Some(joined) = tasks.join_next(), if !tasks.is_empty() => reap(joined),
                event = self.eventloop.poll() => {
                    match event {
                        Ok(Event::Incoming(Packet::ConnAck(_))) => {
                            tracing::info!(subscription = %self.subscription, "connected to broker");
                            self.subscribe_pending = true;
                        }
                        Ok(Event::Incoming(Packet::Publish(publish))) => {
                            let Ok(topic) = std::str::from_utf8(publish.topic.as_ref()) else {
                                tracing::warn!("dropping message with non UTF-8 topic");
                                continue;
                            };
                            let topic = topic.to_owned();
                            let handler = handler.clone();
                            tasks.spawn(async move {
                                handler.handle(&topic, &publish.payload).await;
                            });
                        }
                        Ok(_) => {}
                        Err(err) => self.back_off(&err).await,
                    }
                    if self.subscribe_pending {
                        self.subscribe();
                    }
                }
            }
        }

        tracing::info!(in_flight = tasks.len(), "listener stopping");
        if tokio::time::timeout(SHUTDOWN_GRACE, self.drain(&mut tasks))
            .await
            .is_err()
        {
            tracing::warn!(abandoned = tasks.len(), "shutdown grace period elapsed");
            tasks.abort_all();
        }
    }

    /// Keep the connection serviced while the remaining handlers finish, then
    /// disconnect once everything they queued has gone out.
    async fn drain(&mut self, tasks: &mut JoinSet<()>) {
        while !tasks.is_empty() {
            tokio::select! {
                biased;
                Some(joined) = tasks.join_next() => reap(joined),
                event = self.eventloop.poll() => {
                    if let Err(err) = event {
                        self.back_off(&err).await;
                    }
                }
            }
        }

        if let Err(err) = self.client.try_disconnect() {
            tracing::debug!(%err, "disconnect request not queued");
            return;
        }
        loop {
            match self.eventloop.poll().await {
                Ok(Event::Outgoing(Outgoing::Disconnect)) => break,
                Ok(_) => {}
                Err(err) => {
                    tracing::debug!(%err, "connection closed before disconnect");
                    break;
                }
            }
        }
    }

    async fn back_off(&self, err: &ConnectionError) {
        tracing::warn!(%err, delay = ?self.reconnect_delay, "broker connection error");
        tokio::time::sleep(self.reconnect_delay).await;
    }

    fn subscribe(&mut self) {
        match self.client.try_subscribe(&self.subscription, self.qos) {
            Ok(()) => self.subscribe_pending = false,
            Err(err) => {
                tracing::warn!(%err, subscription = %self.subscription, "subscribe not queued, will retry");
            }
        }
    }
}

fn reap(joined: Result<(), JoinError>) {
    match joined {
        Ok(()) => {}
        Err(err) if err.is_panic() => tracing::error!(%err, "message handler panicked"),
        Err(err) => tracing::debug!(%err, "message handler cancelled"),
    }
}
