//! Static endpoint table.
//!
//! # Responsibilities
//! - Map `(path, method)` to the processor that answers it
//! - Return an explicit miss rather than a silent default
//!
//! # Design Decisions
//! - Built once at startup, immutable afterwards (shared without locks)
//! - O(1) exact lookup; there are no wildcard or prefix routes

use std::collections::HashMap;
use std::sync::Arc;

use crate::endpoint::{Endpoint, EndpointProcessor};

/// Immutable `Endpoint → EndpointProcessor` map.
#[derive(Clone, Default)]
pub struct RoutingTable {
    routes: HashMap<Endpoint, Arc<dyn EndpointProcessor>>,
}

impl RoutingTable {
    /// Build the table from processors, keyed by the endpoint each declares.
    ///
    /// A later processor for the same endpoint replaces an earlier one.
    pub fn new(processors: impl IntoIterator<Item = Arc<dyn EndpointProcessor>>) -> Self {
        let mut routes = HashMap::new();
        for processor in processors {
            let endpoint = processor.endpoint();
            tracing::debug!(endpoint = %endpoint, "Registered endpoint");
            if routes.insert(endpoint.clone(), processor).is_some() {
                tracing::warn!(endpoint = %endpoint, "Endpoint registered twice, keeping the last");
            }
        }
        Self { routes }
    }

    pub fn lookup(&self, endpoint: &Endpoint) -> Option<&Arc<dyn EndpointProcessor>> {
        self.routes.get(endpoint)
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn endpoints(&self) -> impl Iterator<Item = &Endpoint> {
        self.routes.keys()
    }
}
