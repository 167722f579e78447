//! WebSocket connection handling.
//!
//! Bridges an upgraded axum socket into the relay core: the write half becomes
//! a [`ConnectionHandle`] owned by the dispatch loop, the read half feeds the
//! connection's reader.

use crate::state::AppState;
use anyhow::Result;
use axum::extract::ws::{Message, WebSocket};
use futures::{future, SinkExt, StreamExt};
use relay_core::{supervise_reader, ConnectionHandle, ConnectionId, InboundFrame, WriteError};
use relay_types::Response;
use std::sync::Arc;
use tracing::info;

pub async fn handle_websocket(socket: WebSocket, state: Arc<AppState>) -> Result<()> {
    let (mut ws_tx, ws_rx) = socket.split();

    // The acknowledgement goes out before the connection is registered, so it
    // is always the first frame the client sees.
    let ack = Response::connected().to_json()?;
    ws_tx.send(Message::Text(ack.into())).await?;

    let id = ConnectionId::new();
    let sink = ws_tx
        .with(|text: String| future::ready(Ok::<_, axum::Error>(Message::Text(text.into()))))
        .sink_map_err(|e| WriteError::Transport(e.to_string()));
    state.queue.connect(ConnectionHandle::new(id, sink))?;
    info!(target: "relay::ws", "Client {} connected", id);

    let frames = ws_rx.map(|msg| msg.map(inbound_frame));
    supervise_reader(id, frames, state.queue.clone(), state.config.prune_on_disconnect).await;

    info!(target: "relay::ws", "Client {} disconnected", id);
    Ok(())
}

fn inbound_frame(msg: Message) -> InboundFrame {
    match msg {
        Message::Text(text) => InboundFrame::Text(text.as_str().to_owned()),
        Message::Binary(bytes) => InboundFrame::Binary(bytes.to_vec()),
        Message::Close(_) => InboundFrame::Close,
        Message::Ping(_) | Message::Pong(_) => InboundFrame::Control,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inbound_frame_mapping() {
        assert_eq!(
            inbound_frame(Message::Text("{}".into())),
            InboundFrame::Text("{}".to_string())
        );
        assert_eq!(
            inbound_frame(Message::Binary(vec![1, 2, 3].into())),
            InboundFrame::Binary(vec![1, 2, 3])
        );
        assert_eq!(inbound_frame(Message::Close(None)), InboundFrame::Close);
        assert_eq!(inbound_frame(Message::Ping(Vec::new().into())), InboundFrame::Control);
        assert_eq!(inbound_frame(Message::Pong(Vec::new().into())), InboundFrame::Control);
    }
}
