//! Bridges a collaborator-supplied [`LogSink`] callback into the `tracing`
//! pipeline everything else in this workspace emits through.
//!
//! Most collaborators just install a `tracing_subscriber::Subscriber` and
//! are done. `LogSink` exists for the ones that instead want plain
//! `(severity, target, message)` callbacks — matching the "pluggable
//! logging interface" surface the toolkit documents at its boundary —
//! without us maintaining a second, parallel logging path to get there.

use std::sync::Arc;

use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::Layer;
use tracing_subscriber::layer::Context;

/// A callback-style log destination: severity, the emitting source site
/// (a `module_path!`-shaped target string), the formatted message, and an
/// optional byte-buffer dump — a reactor or codec call site attaches the
/// frame it just failed to parse so a collaborator's sink can hex-dump it
/// without the core ever formatting hex itself.
pub trait LogSink: Send + Sync {
    fn log(&self, level: Level, target: &str, message: &str, dump: Option<&[u8]>);
}

/// Adapts a [`LogSink`] into a `tracing_subscriber::Layer`, so a collaborator
/// can register it via `tracing_subscriber::registry().with(SinkLayer::new(sink))`
/// alongside (or instead of) any other layer.
pub struct SinkLayer<S> {
    sink: Arc<S>,
}

impl<S: LogSink> SinkLayer<S> {
    pub fn new(sink: Arc<S>) -> Self {
        SinkLayer { sink }
    }
}

impl<S, Sub> Layer<Sub> for SinkLayer<S>
where
    S: LogSink + 'static,
    Sub: Subscriber,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, Sub>) {
        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);
        // `tracing::Event` fields carry `dyn Debug`, never a raw byte slice,
        // so a frame dump can never survive this bridge — call sites that
        // want one invoke `sink.log` directly instead of going through a
        // `tracing` event.
        self.sink.log(*event.metadata().level(), event.metadata().target(), &visitor.message, None);
    }
}

#[derive(Default)]
struct MessageVisitor {
    message: String,
}

impl Visit for MessageVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{value:?}");
        } else if self.message.is_empty() {
            self.message = format!("{}={:?}", field.name(), value);
        }
    }
}
