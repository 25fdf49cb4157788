//! Binary RPC listener: a second `TcpListener`, speaking the same
//! length-prefixed `bincode` frame the agent's reporter uses, dispatching
//! into the same [`MetricStore`] the HTTP surface writes through.

use crate::state::AppState;
use rt_metrics_rpc::{read_frame, write_frame, Frame, DEFAULT_RPC_PORT};
use std::net::IpAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tracing::{error, info, warn};

pub async fn run(state: Arc<AppState>, bind_ip: IpAddr) -> std::io::Result<()> {
    let listener = TcpListener::bind((bind_ip, DEFAULT_RPC_PORT)).await?;
    info!(addr = %listener.local_addr()?, "rpc listener bound");
    loop {
        let (socket, peer) = listener.accept().await?;
        let state = state.clone();
        tokio::spawn(async move {
            if let Err(e) = handle_connection(socket, &state).await {
                warn!(error = %e, %peer, "rpc connection ended with error");
            }
        });
    }
}

async fn handle_connection(
    mut socket: TcpStream,
    state: &Arc<AppState>,
) -> Result<(), rt_metrics_rpc::RpcError> {
    let frame = read_frame(&mut socket).await?;
    let response = match frame {
        Frame::InsertOne(record) => match state.store.insert_metric(record).await {
            Ok(()) => Frame::Ack,
            Err(e) => {
                error!(error = %e, "rpc insert_one failed");
                Frame::Error(e.to_string())
            }
        },
        Frame::InsertBatch(records) => match state.store.insert_batch(records).await {
            Ok(()) => Frame::Ack,
            Err(e) => {
                error!(error = %e, "rpc insert_batch failed");
                Frame::Error(e.to_string())
            }
        },
        other => Frame::Error(format!("unexpected frame on server: {other:?}")),
    };
    write_frame(&mut socket, &response).await
}
