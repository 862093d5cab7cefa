use std::net::IpAddr;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::sync::mpsc::UnboundedSender;

use crate::http_probe::prelude::*;

/// Everything the coordinator hands to the reporting sink.
#[derive(Debug)]
pub enum Report {
    /// One finished probe of one (endpoint, IP) pair.
    Probe(ProbeResult),
    /// The host resolved to no addresses; nothing was probed.
    Unresolved { input: String, hostname: String },
    /// The input was not a usable URL.
    Malformed(ProbeError),
}

/// Two-level fan-out: one task per input URL, one sub-task per resolved address.
///
/// Each level keeps the join handles of its own children and waits only on them.
/// Failures, including panics, are turned into reports at the level they happen.
pub struct Coordinator<L> {
    lookup: Arc<L>,
    prober: Prober,
    limiter: Option<Arc<Semaphore>>,
}

impl<L: Lookup> Coordinator<L> {
    pub fn new(lookup: L, prober: Prober) -> Self {
        Self {
            lookup: Arc::new(lookup),
            prober,
            limiter: None,
        }
    }

    /// Caps the number of probes running at once. Zero means unbounded.
    pub fn max_in_flight(mut self, limit: usize) -> Self {
        self.limiter = (limit > 0).then(|| Arc::new(Semaphore::new(limit)));
        self
    }

    /// Probes every input and returns once every URL task and every address sub-task
    /// has finished. Reports are sent in completion order.
    pub async fn run(&self, inputs: Vec<String>, sink: UnboundedSender<Report>) {
        let mut handles = Vec::with_capacity(inputs.len());

        for input in inputs {
            let lookup = self.lookup.clone();
            let prober = self.prober.clone();
            let limiter = self.limiter.clone();
            let sink = sink.clone();
            let task_input = input.clone();

            let handle = tokio::spawn(async move {
                probe_input(lookup, prober, limiter, task_input, sink).await;
            });
            handles.push((input, handle));
        }

        for (input, handle) in handles {
            if let Err(e) = handle.await {
                log::error!("Probing {input} aborted: {e}");
            }
        }
    }
}

async fn probe_input<L: Lookup>(
    lookup: Arc<L>,
    prober: Prober,
    limiter: Option<Arc<Semaphore>>,
    input: String,
    sink: UnboundedSender<Report>,
) {
    let endpoint = match resolve(lookup.as_ref(), &input).await {
        Ok(endpoint) => endpoint,
        Err(e) => {
            let _ = sink.send(Report::Malformed(e));
            return;
        }
    };

    if endpoint.resolved_ips.is_empty() {
        let _ = sink.send(Report::Unresolved {
            input,
            hostname: endpoint.hostname,
        });
        return;
    }

    let endpoint = Arc::new(endpoint);
    let mut handles: Vec<(IpAddr, _)> = Vec::with_capacity(endpoint.resolved_ips.len());

    for &ip in &endpoint.resolved_ips {
        let shared = endpoint.clone();
        let prober = prober.clone();
        let limiter = limiter.clone();
        let sink = sink.clone();

        let handle = tokio::spawn(async move {
            let _permit = match limiter {
                Some(limiter) => limiter.acquire_owned().await.ok(),
                None => None,
            };
            let result = prober.probe(&shared, ip).await;
            let _ = sink.send(Report::Probe(result));
        });
        handles.push((ip, handle));
    }

    for (ip, handle) in handles {
        // The task reports as its last step, so a failed join means nothing was sent.
        if let Err(e) = handle.await {
            let result = ProbeResult::new(endpoint.original_input.clone(), ip, endpoint.scheme)
                .with_error(format!("probe task failed: {e}"));
            let _ = sink.send(Report::Probe(result));
        }
    }
}
