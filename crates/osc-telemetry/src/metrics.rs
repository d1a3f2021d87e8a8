use prometheus::core::Collector;
use prometheus::{Encoder, IntCounter, IntGauge, Registry, TextEncoder};

#[derive(Clone)]
pub struct TelemetryMetrics {
    pub datagrams_sent: IntCounter,
    pub transmit_failures: IntCounter,
    pub devices_registered: IntGauge,
}

#[derive(Clone)]
pub struct MetricsHub {
    pub registry: Registry,
    pub telemetry: TelemetryMetrics,
}

impl MetricsHub {
    pub fn new() -> Result<Self, String> {
        let registry = Registry::new();
        let datagrams_sent = IntCounter::new("osc_datagrams_sent", "Total OSC datagrams sent")
            .map_err(|e| format!("metrics init error: {e}"))?;
        let transmit_failures = IntCounter::new(
            "osc_transmit_failures",
            "OSC messages dropped by encode or transmit errors",
        )
        .map_err(|e| format!("metrics init error: {e}"))?;
        let devices_registered =
            IntGauge::new("osc_devices_registered", "Devices currently holding an id")
                .map_err(|e| format!("metrics init error: {e}"))?;
        let telemetry = TelemetryMetrics {
            datagrams_sent,
            transmit_failures,
            devices_registered,
        };
        let collectors: [(&str, Box<dyn Collector>); 3] = [
            ("osc_datagrams_sent", Box::new(telemetry.datagrams_sent.clone())),
            ("osc_transmit_failures", Box::new(telemetry.transmit_failures.clone())),
            ("osc_devices_registered", Box::new(telemetry.devices_registered.clone())),
        ];
        for (name, collector) in collectors {
            register(&registry, name, collector);
        }
        Ok(Self {
            registry,
            telemetry,
        })
    }

    pub fn encode_text(&self) -> String {
        let mut buf = Vec::new();
        let encoder = TextEncoder::new();
        if let Err(e) = encoder.encode(&self.registry.gather(), &mut buf) {
            return format!("error encoding metrics: {e}");
        }
        String::from_utf8(buf).unwrap_or_default()
    }
}

/// Returns false, after logging, when the registry refuses the collector.
fn register(registry: &Registry, name: &str, collector: Box<dyn Collector>) -> bool {
    match registry.register(collector) {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(metric = name, error = %e, "metric not registered");
            false
        }
    }
}
