use std::sync::Arc;

use freshair_common::{ServiceCall, ServiceCaller, StateSnapshot};
use futures::{Sink, SinkExt, Stream, StreamExt};
use tokio::sync::{mpsc::UnboundedSender, watch};
use tokio_tungstenite::tungstenite::{self, Message};

use crate::{
    Error, Result,
    messages::{
        AuthClientMessage, AuthServerMessage, ClientMessage, Packet, PacketId, PacketIds,
        STATE_CHANGED, ServerMessage,
    },
    snapshot::StateTracker,
};

/// Connection to a Home Assistant instance acting as the card's host
///
/// Cheap to clone; all clones share one websocket writer.
#[derive(Debug, Clone)]
pub struct HomeAssistant {
    tx: UnboundedSender<ClientMessage>,
}

impl HomeAssistant {
    pub fn websocket_url(host: &str, secure: bool) -> String {
        let scheme = if secure { "wss" } else { "ws" };
        format!("{scheme}://{host}/api/websocket")
    }

    /// Authenticates, subscribes to state changes and requests the full state
    /// table.
    ///
    /// The receiver only ever holds the latest table. It first changes once
    /// the full table has loaded, and its sender is dropped when the
    /// connection ends.
    pub async fn connect(
        addr: &str,
        token: &str,
    ) -> Result<(Self, watch::Receiver<Arc<StateSnapshot>>)> {
        let (mut conn, res) = tokio_tungstenite::connect_async(addr).await?;

        tracing::debug!("WebSocket response: {res:?}");

        authenticate(&mut conn, token).await?;

        let ids = PacketIds::new();

        conn.send(encode(ids.next(), &ClientMessage::SubscribeEvents {
            event_type: Some(STATE_CHANGED.to_owned()),
        })?)
        .await?;

        let get_states_id = ids.next();
        conn.send(encode(get_states_id, &ClientMessage::GetStates)?).await?;

        let (mut conn_tx, mut conn_rx) = conn.split();
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<ClientMessage>();

        tokio::spawn(async move {
            while let Some(msg) = rx.recv().await {
                let msg = match encode(ids.next(), &msg) {
                    Ok(msg) => msg,
                    Err(e) => {
                        tracing::error!("Failed to serialize message: {e}");
                        continue;
                    }
                };

                if let Err(e) = conn_tx.send(msg).await {
                    tracing::error!("Error sending message to Home Assistant: {e}");
                    break;
                }
            }
        });

        let (snapshot_tx, snapshot_rx) = watch::channel(Arc::new(StateSnapshot::new()));

        tokio::spawn(async move {
            let mut tracker = StateTracker::new(get_states_id);

            loop {
                let packet = match conn_rx.next().await {
                    Some(Ok(Message::Text(txt))) => {
                        match serde_json::from_str::<Packet<ServerMessage>>(&txt) {
                            Ok(packet) => packet,
                            Err(e) => {
                                tracing::warn!("Ignoring unrecognised message ({e}): {}", txt.as_str());
                                continue;
                            }
                        }
                    }
                    Some(Ok(Message::Ping(_) | Message::Pong(_))) => continue,
                    Some(Ok(Message::Close(frame))) => {
                        tracing::warn!("Home Assistant closed the connection: {frame:?}");
                        break;
                    }
                    Some(Ok(msg)) => {
                        tracing::warn!("expected text message, got: {:?}", msg);
                        continue;
                    }
                    Some(Err(e)) => {
                        tracing::error!("WebSocket error: {e}");
                        break;
                    }
                    None => {
                        tracing::error!("connection closed unexpectedly");
                        break;
                    }
                };

                tracing::trace!("Received message: {packet:#?}");

                let mut outcome = Ok(false);
                snapshot_tx.send_if_modified(|states| {
                    outcome = tracker.handle(states, packet);
                    matches!(outcome, Ok(true))
                });

                if let Err(e) = outcome {
                    tracing::error!("{e}");
                    break;
                }

                if snapshot_tx.is_closed() {
                    tracing::debug!("Snapshot receiver dropped, closing connection");
                    break;
                }
            }
        });

        Ok((Self { tx }, snapshot_rx))
    }
}

fn encode(id: PacketId, payload: &ClientMessage) -> Result<Message> {
    Ok(Message::text(serde_json::to_string(&Packet { id, payload })?))
}

/// `auth_required`, then our `auth`, then `auth_ok` or `auth_invalid`
async fn authenticate<S>(conn: &mut S, token: &str) -> Result<()>
where
    S: Stream<Item = tungstenite::Result<Message>>
        + Sink<Message, Error = tungstenite::Error>
        + Unpin,
{
    match next_auth_message(conn).await? {
        AuthServerMessage::AuthRequired { ha_version } => {
            tracing::info!("Connected to Home Assistant version {ha_version}");
        }
        other => {
            return Err(Error::Protocol(format!("expected auth_required, got: {other:?}")));
        }
    }

    let auth = AuthClientMessage::Auth { access_token: token.to_owned() };
    conn.send(Message::text(serde_json::to_string(&auth)?)).await?;

    match next_auth_message(conn).await? {
        AuthServerMessage::AuthOk { .. } => {
            tracing::info!("Authentication successful");
            Ok(())
        }
        AuthServerMessage::AuthInvalid { message } => Err(Error::Authentication(message)),
        other => Err(Error::Protocol(format!("expected auth outcome, got: {other:?}"))),
    }
}

async fn next_auth_message(
    conn: &mut (impl Stream<Item = tungstenite::Result<Message>> + Unpin),
) -> Result<AuthServerMessage> {
    loop {
        let msg = conn
            .next()
            .await
            .ok_or_else(|| Error::Protocol("connection closed during authentication".to_owned()))??;

        match msg {
            Message::Text(txt) => return Ok(serde_json::from_str(&txt)?),
            Message::Ping(_) | Message::Pong(_) => continue,
            other => {
                return Err(Error::Protocol(format!("expected text message, got: {other:?}")));
            }
        }
    }
}

impl ServiceCaller for HomeAssistant {
    fn call_service(&self, call: ServiceCall) {
        let ServiceCall { domain, service, service_data } = call;

        if self
            .tx
            .send(ClientMessage::CallService { domain, service, service_data })
            .is_err()
        {
            tracing::error!("Home Assistant connection is closed, dropping service call");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{
        collections::VecDeque,
        pin::Pin,
        task::{Context, Poll},
    };

    use freshair_common::{EntityId, FanSpeed};

    use super::*;

    /// Replays canned server messages and records what was sent
    #[derive(Default)]
    struct Scripted {
        incoming: VecDeque<Message>,
        sent: Vec<Message>,
    }

    impl Scripted {
        fn new(incoming: impl IntoIterator<Item = Message>) -> Self {
            Self { incoming: incoming.into_iter().collect(), sent: Vec::new() }
        }
    }

    impl Stream for Scripted {
        type Item = tungstenite::Result<Message>;

        fn poll_next(mut self: Pin<&mut Self>, _: &mut Context<'_>) -> Poll<Option<Self::Item>> {
            Poll::Ready(self.incoming.pop_front().map(Ok))
        }
    }

    impl Sink<Message> for Scripted {
        type Error = tungstenite::Error;

        fn poll_ready(self: Pin<&mut Self>, _: &mut Context<'_>) -> Poll<tungstenite::Result<()>> {
            Poll::Ready(Ok(()))
        }

        fn start_send(mut self: Pin<&mut Self>, item: Message) -> tungstenite::Result<()> {
            self.sent.push(item);
            Ok(())
        }

        fn poll_flush(self: Pin<&mut Self>, _: &mut Context<'_>) -> Poll<tungstenite::Result<()>> {
            Poll::Ready(Ok(()))
        }

        fn poll_close(self: Pin<&mut Self>, _: &mut Context<'_>) -> Poll<tungstenite::Result<()>> {
            Poll::Ready(Ok(()))
        }
    }

    const AUTH_REQUIRED: &str = r#"{"type":"auth_required","ha_version":"2024.5.0"}"#;

    #[test]
    fn authenticate_sends_the_token() {
        let mut conn = Scripted::new([
            Message::text(AUTH_REQUIRED),
            Message::Ping(Default::default()),
            Message::text(r#"{"type":"auth_ok","ha_version":"2024.5.0"}"#),
        ]);

        futures::executor::block_on(authenticate(&mut conn, "secret")).unwrap();

        assert_eq!(conn.sent.len(), 1);
        let sent: serde_json::Value =
            serde_json::from_str(conn.sent[0].to_text().unwrap()).unwrap();
        assert_eq!(sent, serde_json::json!({ "type": "auth", "access_token": "secret" }));
    }

    #[test]
    fn authenticate_rejected() {
        let mut conn = Scripted::new([
            Message::text(AUTH_REQUIRED),
            Message::text(r#"{"type":"auth_invalid","message":"Invalid access token"}"#),
        ]);

        let err = futures::executor::block_on(authenticate(&mut conn, "wrong")).unwrap_err();
        assert!(matches!(err, Error::Authentication(msg) if msg == "Invalid access token"));
    }

    #[test]
    fn authenticate_needs_auth_required_first() {
        let mut conn =
            Scripted::new([Message::text(r#"{"type":"auth_ok","ha_version":"2024.5.0"}"#)]);

        let err = futures::executor::block_on(authenticate(&mut conn, "secret")).unwrap_err();
        assert!(matches!(err, Error::Protocol(_)));
        assert!(conn.sent.is_empty());
    }

    #[test]
    fn authenticate_on_closed_connection() {
        let mut conn = Scripted::default();

        let err = futures::executor::block_on(authenticate(&mut conn, "secret")).unwrap_err();
        assert!(matches!(err, Error::Protocol(msg) if msg.contains("closed")));
    }

    #[test]
    fn websocket_url() {
        assert_eq!(
            HomeAssistant::websocket_url("homeassistant.local:8123", false),
            "ws://homeassistant.local:8123/api/websocket"
        );
        assert_eq!(
            HomeAssistant::websocket_url("ha.example.com", true),
            "wss://ha.example.com/api/websocket"
        );
    }

    #[test]
    fn call_service_is_queued_for_the_writer() {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let hass = HomeAssistant { tx };

        hass.call_service(ServiceCall::set_speed(&EntityId::from("fan.a"), FanSpeed::Low));

        let queued = serde_json::to_value(rx.try_recv().unwrap()).unwrap();
        assert_eq!(
            queued,
            serde_json::json!({
                "type": "call_service",
                "domain": "fan",
                "service": "set_speed",
                "service_data": { "entity_id": "fan.a", "speed": "low" },
            }),
        );
    }

    #[test]
    fn call_service_after_disconnect_does_not_panic() {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        drop(rx);

        HomeAssistant { tx }.call_service(ServiceCall::turn_off(&EntityId::from("fan.a")));
    }
}
