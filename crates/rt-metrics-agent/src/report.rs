//! Agent-side reporter: HTTP leg (always) plus an optional binary RPC leg,
//! grounded in spec §4.7's "shared HTTP client" requirement and the
//! `reportMetrics` loop of `original_source/cmd/agent/main.go` (one POST per
//! record, log-and-continue on failure).

use reqwest::Client;
use rt_metrics_crypto::RsaPublicKey;
use rt_metrics_rpc::{read_frame, write_frame, Frame, DEFAULT_RPC_PORT};
use rt_metrics_types::MetricRecord;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::net::TcpStream;
use tracing::warn;

/// Reports a buffer snapshot to the server over HTTP, and optionally over
/// the binary RPC leg as well. Transport failures are logged and skipped —
/// the next scheduler tick retries implicitly, there is no local queue.
pub struct Reporter {
    client: Client,
    address: String,
    key: Vec<u8>,
    public_key: Option<RsaPublicKey>,
    rpc: bool,
}

impl Reporter {
    pub fn new(
        address: String,
        key: Vec<u8>,
        public_key: Option<RsaPublicKey>,
        rpc: bool,
    ) -> Self {
        Reporter {
            client: Client::new(),
            address,
            key,
            public_key,
            rpc,
        }
    }

    fn sign_all(&self, records: Vec<MetricRecord>) -> Vec<MetricRecord> {
        records
            .into_iter()
            .filter_map(|r| {
                rt_metrics_crypto::sign::sign(r, &self.key)
                    .map_err(|e| warn!(error = %e, "dropping unsignable record"))
                    .ok()
            })
            .collect()
    }

    fn encode_body(&self, body: Vec<u8>) -> Option<Vec<u8>> {
        match &self.public_key {
            None => Some(body),
            Some(public_key) => match rt_metrics_crypto::envelope::encrypt(&body, public_key) {
                Ok(encrypted) => Some(encrypted),
                Err(e) => {
                    warn!(error = %e, "envelope encryption failed; dropping report cycle");
                    None
                }
            },
        }
    }

    async fn post(&self, path: &str, payload: Vec<u8>) -> Result<(), reqwest::Error> {
        let url = format!("http://{}{}", self.address, path);
        self.client
            .post(url)
            .header("Content-Type", "application/json")
            .body(payload)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    async fn rpc_send(&self, frame: Frame) -> Result<(), rt_metrics_rpc::RpcError> {
        let host = self.address.split(':').next().unwrap_or("localhost");
        let mut stream = TcpStream::connect((host, DEFAULT_RPC_PORT)).await?;
        write_frame(&mut stream, &frame).await?;
        read_frame(&mut stream).await?;
        Ok(())
    }

    /// Single-record mode: POST each record to `/update/` individually,
    /// checking `update_allowed` between records so a shutdown mid-cycle
    /// stops sending rather than publishing a half-drained buffer.
    pub async fn report_single(&self, records: Vec<MetricRecord>, update_allowed: &AtomicBool) {
        for record in self.sign_all(records) {
            if !update_allowed.load(Ordering::SeqCst) {
                return;
            }
            let Ok(body) = serde_json::to_vec(&record) else {
                continue;
            };
            let Some(payload) = self.encode_body(body) else {
                continue;
            };
            if let Err(e) = self.post("/update/", payload).await {
                warn!(error = %e, id = %record.id, "http report failed; continuing");
            }
            if self.rpc {
                if let Err(e) = self.rpc_send(Frame::InsertOne(record)).await {
                    warn!(error = %e, "rpc report failed; continuing");
                }
            }
        }
    }

    /// Batched mode: POST the whole list to `/updates/` in one request.
    pub async fn report_batch(&self, records: Vec<MetricRecord>) {
        let signed = self.sign_all(records);
        if signed.is_empty() {
            return;
        }
        let Ok(body) = serde_json::to_vec(&signed) else {
            return;
        };
        let Some(payload) = self.encode_body(body) else {
            return;
        };
        if let Err(e) = self.post("/updates/", payload).await {
            warn!(error = %e, "http batch report failed; continuing");
        }
        if self.rpc {
            if let Err(e) = self.rpc_send(Frame::InsertBatch(signed)).await {
                warn!(error = %e, "rpc batch report failed; continuing");
            }
        }
    }
}
