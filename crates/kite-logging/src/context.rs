//! Node context injection for multi-forwarder logging
//!
//! Several forwarders often run in one process (integration tests,
//! simulated topologies). A [`NodeContextGuard`] tags every event emitted
//! in its scope with the node name and a per-run instance id.

use std::cell::RefCell;

use tracing::span::EnteredSpan;
use uuid::Uuid;

/// Node context data stored in thread-local storage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeContextData {
    /// Human-readable forwarder name
    pub node: String,
    /// Unique instance ID for this forwarder run
    pub instance_id: Uuid,
}

thread_local! {
    static NODE_CONTEXT: RefCell<Option<NodeContextData>> = const { RefCell::new(None) };
}

/// RAII guard for node context
///
/// While alive, the guard keeps a `node` span entered so JSON output
/// carries `node` and `instance_id`. Dropping it restores the previous
/// context.
///
/// ```ignore
/// let _guard = NodeContextGuard::new("rv-router");
/// tracing::info!("forwarding"); // includes node = "rv-router"
/// ```
pub struct NodeContextGuard {
    previous: Option<NodeContextData>,
    _span: EnteredSpan,
}

impl NodeContextGuard {
    pub fn new(node: impl Into<String>) -> Self {
        Self::with_instance_id(node, Uuid::new_v4())
    }

    /// Reuse an instance id, e.g. across restarts of the same forwarder
    pub fn with_instance_id(node: impl Into<String>, instance_id: Uuid) -> Self {
        let data = NodeContextData {
            node: node.into(),
            instance_id,
        };
        let span = tracing::info_span!(
            "node",
            node = %data.node,
            instance_id = %data.instance_id
        )
        .entered();

        let previous = NODE_CONTEXT.with(|ctx| ctx.borrow_mut().replace(data));

        Self {
            previous,
            _span: span,
        }
    }

    /// Get the current node context (if any)
    pub fn current() -> Option<NodeContextData> {
        NODE_CONTEXT.with(|ctx| ctx.borrow().clone())
    }

    pub fn current_node() -> Option<String> {
        Self::current().map(|ctx| ctx.node)
    }
}

impl Drop for NodeContextGuard {
    fn drop(&mut self) {
        NODE_CONTEXT.with(|ctx| *ctx.borrow_mut() = self.previous.take());
    }
}

/// Run a block inside a node context
///
/// ```ignore
/// with_node_context!("consumer", {
///     tracing::info!("expressing interest");
/// });
/// ```
#[macro_export]
macro_rules! with_node_context {
    ($node:expr, $body:block) => {{
        let _guard = $crate::context::NodeContextGuard::new($node);
        $body
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_context_guard() {
        assert!(NodeContextGuard::current().is_none());

        {
            let _guard = NodeContextGuard::new("rv");
            assert_eq!(NodeContextGuard::current_node(), Some("rv".to_string()));
        }

        assert!(NodeContextGuard::current().is_none());
    }

    #[test]
    fn test_nested_contexts() {
        {
            let _outer = NodeContextGuard::new("producer");
            {
                let _inner = NodeContextGuard::new("access-point");
                assert_eq!(
                    NodeContextGuard::current_node(),
                    Some("access-point".to_string())
                );
            }
            assert_eq!(
                NodeContextGuard::current_node(),
                Some("producer".to_string())
            );
        }
        assert!(NodeContextGuard::current_node().is_none());
    }

    #[test]
    fn test_with_instance_id() {
        let instance_id = Uuid::new_v4();
        let _guard = NodeContextGuard::with_instance_id("rv", instance_id);
        assert_eq!(
            NodeContextGuard::current().unwrap().instance_id,
            instance_id
        );
    }

    #[test]
    fn test_macro_scopes_context() {
        let node = with_node_context!("consumer", { NodeContextGuard::current_node() });
        assert_eq!(node, Some("consumer".to_string()));
        assert!(NodeContextGuard::current().is_none());
    }
}
