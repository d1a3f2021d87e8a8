use crate::{Dispatcher, EventSource, SourceError};
use osc_transport::DatagramSink;
use std::time::Duration;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BridgeStats {
    pub iterations: u64,
    pub events: u64,
}

/// Drive the bridge until the source is exhausted.
///
/// Each iteration pumps one polling window of events, forwards the device requests
/// they raised, then flushes sticky pose flags.
pub fn run_bridge<S, E>(
    dispatcher: &mut Dispatcher<S>,
    source: &mut E,
    poll: Duration,
) -> Result<BridgeStats, SourceError>
where
    S: DatagramSink,
    E: EventSource + ?Sized,
{
    let mut stats = BridgeStats::default();
    loop {
        let more = source.run(poll, &mut |event| {
            stats.events += 1;
            dispatcher.handle(&event);
        })?;
        for request in dispatcher.drain_requests() {
            if let Err(e) = source.apply(request) {
                tracing::warn!(?request, error = %e, "device request failed");
            }
        }
        dispatcher.flush_poses();
        stats.iterations += 1;
        if !more {
            tracing::info!(
                iterations = stats.iterations,
                events = stats.events,
                "event source exhausted"
            );
            return Ok(stats);
        }
    }
}
