use crate::plan::{PlanNode, Route};

/// A hook allowed to wrap or replace plan elements while a flow is compiled.
///
/// Both methods default to identity, so an interceptor only overrides what it needs.
pub trait NodeInterceptor: Send + Sync {
    /// Interceptors run in ascending priority.
    fn priority(&self) -> i32 {
        0
    }

    /// Called for every plan element before it is attached to the tree.
    fn on_step(&self, _flow_id: &str, node: PlanNode) -> PlanNode {
        node
    }

    /// Called once with the finished root.
    fn on_route(&self, _flow_id: &str, route: Route) -> Route {
        route
    }
}

/// An ordered set of interceptors. Empty by default, which is the identity chain.
#[derive(Default)]
pub struct InterceptorChain {
    interceptors: Vec<Box<dyn NodeInterceptor>>,
}

impl InterceptorChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an interceptor, keeping the chain sorted. Equal priorities keep insertion order.
    pub fn push(&mut self, interceptor: Box<dyn NodeInterceptor>) {
        let position = self
            .interceptors
            .partition_point(|existing| existing.priority() <= interceptor.priority());
        self.interceptors.insert(position, interceptor);
    }

    pub fn len(&self) -> usize {
        self.interceptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.interceptors.is_empty()
    }

    pub fn on_step(&self, flow_id: &str, node: PlanNode) -> PlanNode {
        self.interceptors
            .iter()
            .fold(node, |node, interceptor| interceptor.on_step(flow_id, node))
    }

    pub fn on_route(&self, flow_id: &str, route: Route) -> Route {
        self.interceptors
            .iter()
            .fold(route, |route, interceptor| interceptor.on_route(flow_id, route))
    }
}
