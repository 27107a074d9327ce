use crate::host::ServerHost;
use std::sync::Arc;
use throughput_common::ClientId;

/// Formats a client-reported rate, always with a decimal point (`10.0`, `37.5`).
pub fn format_report(chunks_per_tick: f32) -> String {
    format!("chunks per tick: {}", format_rate(chunks_per_tick))
}

/// Renders a float the way the host's chat formatting does: plain decimals in
/// `[1e-3, 1e7)`, `1.0E20` style scientific notation outside it, and `NaN`/`Infinity`.
fn format_rate(value: f32) -> String {
    if value.is_nan() {
        return "NaN".to_owned();
    }
    if value.is_infinite() {
        let sign = if value.is_sign_negative() { "-" } else { "" };
        return format!("{}Infinity", sign);
    }

    let magnitude = value.abs();
    if magnitude == 0.0 || (1e-3..1e7).contains(&magnitude) {
        return format!("{:?}", value);
    }

    let scientific = format!("{:e}", value);
    match scientific.split_once('e') {
        Some((mantissa, exponent)) if mantissa.contains('.') => {
            format!("{}E{}", mantissa, exponent)
        }
        Some((mantissa, exponent)) => format!("{}.0E{}", mantissa, exponent),
        None => scientific,
    }
}

/// Shows clients the chunks-per-tick rate they reported.
#[derive(Clone)]
pub struct ThroughputReporter {
    host: Arc<dyn ServerHost>,
}

impl ThroughputReporter {
    pub fn new(host: Arc<dyn ServerHost>) -> Self {
        Self { host }
    }

    /// Sends the formatted rate to `client` only and returns the message.
    pub fn report(&self, client: ClientId, chunks_per_tick: f32) -> String {
        let message = format_report(chunks_per_tick);
        self.host.send_message(client, &message);
        message
    }
}
