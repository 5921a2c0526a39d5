//! Output layers
//!
//! Every sink is boxed so the builder can collect any combination of
//! console and file outputs into one `Vec` layer.

use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::{Layer, Registry};

use crate::config::{ConsoleConfig, JsonlConfig};

/// A type-erased layer over the base registry
pub type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync + 'static>;

/// JSONL formatting layer writing to `writer`
pub fn jsonl_layer<W>(config: &JsonlConfig, writer: W) -> BoxedLayer
where
    W: for<'writer> MakeWriter<'writer> + Send + Sync + 'static,
{
    tracing_subscriber::fmt::layer()
        .json()
        .with_current_span(config.include_current_span)
        .with_span_list(config.include_spans)
        .flatten_event(config.flatten_events)
        .with_file(config.include_location)
        .with_line_number(config.include_location)
        .with_thread_ids(config.include_thread_info)
        .with_thread_names(config.include_thread_info)
        .with_writer(writer)
        .boxed()
}

/// Console layer, pretty or JSONL depending on `console`
pub fn console_layer(console: &ConsoleConfig, jsonl: &JsonlConfig) -> BoxedLayer {
    match (console.pretty, console.capture) {
        (true, true) => tracing_subscriber::fmt::layer()
            .with_ansi(console.ansi)
            .with_target(true)
            .with_test_writer()
            .boxed(),
        (true, false) => tracing_subscriber::fmt::layer()
            .with_ansi(console.ansi)
            .with_target(true)
            .boxed(),
        (false, true) => jsonl_layer(jsonl, tracing_subscriber::fmt::TestWriter::new()),
        (false, false) => jsonl_layer(jsonl, std::io::stdout),
    }
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::sync::{Arc, Mutex};

    use tracing_subscriber::layer::SubscriberExt;

    use super::*;
    use crate::context::NodeContextGuard;

    #[derive(Clone, Default)]
    struct Buffer(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Buffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for Buffer {
        type Writer = Buffer;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    #[test]
    fn test_jsonl_carries_node_context() {
        let buffer = Buffer::default();
        let subscriber =
            Registry::default().with(jsonl_layer(&JsonlConfig::default(), buffer.clone()));

        tracing::subscriber::with_default(subscriber, || {
            let _guard = NodeContextGuard::new("rv-router");
            tracing::info!(prefix = "/mp", "route announced");
        });

        let output = String::from_utf8(buffer.0.lock().unwrap().clone()).unwrap();
        let line: serde_json::Value = serde_json::from_str(output.lines().next().unwrap()).unwrap();
        assert_eq!(line["message"], "route announced");
        assert_eq!(line["prefix"], "/mp");
        assert_eq!(line["span"]["node"], "rv-router");
    }
}
