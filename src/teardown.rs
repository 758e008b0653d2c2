//! Deferred teardown: delayed stop and release of a set of nodes on a
//! background thread.

use std::thread;
use std::time::Duration;

use tracing::{debug, trace};

use crate::node::SignalNode;

/// Single-shot timer that stops and releases a set of nodes after a delay.
///
/// The timer takes ownership of its nodes; [`start`](Self::start) consumes
/// it (single-use, no cancellation) and hands the nodes to a background
/// thread, so the caller is never blocked. After the delay every node is
/// stopped - failures from nodes that were already stopped or released are
/// suppressed, so one bad node cannot block the rest - and then all nodes
/// are dropped, releasing their streams.
///
/// No ordering is guaranteed between the background release and concurrent
/// use of projections of these nodes by the caller; using a node's values
/// after its teardown has fired is a use-after-release the caller must
/// avoid.
pub struct Teardown {
    delay: Duration,
    nodes: Vec<Box<dyn SignalNode + Send>>,
}

impl Teardown {
    pub fn new(delay: Duration) -> Self {
        Teardown {
            delay,
            nodes: Vec::new(),
        }
    }

    /// Add a node to tear down (builder form).
    pub fn with(mut self, node: impl SignalNode + Send + 'static) -> Self {
        self.nodes.push(Box::new(node));
        self
    }

    /// Add a node to tear down.
    pub fn add(&mut self, node: impl SignalNode + Send + 'static) {
        self.nodes.push(Box::new(node));
    }

    /// Start the timer. Returns the background thread's handle; joining it
    /// is optional.
    pub fn start(self) -> thread::JoinHandle<()> {
        let Teardown { delay, mut nodes } = self;
        thread::spawn(move || {
            thread::sleep(delay);
            for node in nodes.iter_mut() {
                if let Err(e) = node.channels_mut().stop_all() {
                    trace!("suppressed stop failure during teardown: {}", e);
                }
            }
            debug!(nodes = nodes.len(), "deferred teardown fired");
            drop(nodes);
        })
    }
}
