/// Generates plan ids namespaced by the owning flow.
///
/// One counter is shared by every kind of id, so ids are unique within a
/// compilation and identical across repeated compilations of the same graph.
#[derive(Debug)]
pub(crate) struct IdGenerator {
    namespace: String,
    next: u64,
}

impl IdGenerator {
    pub(crate) fn new(namespace: &str) -> Self {
        Self {
            namespace: namespace.to_string(),
            next: 0,
        }
    }

    pub(crate) fn next_id(&mut self, kind: &str) -> String {
        let id = namespaced_id(&format!("{}-{}", self.namespace, kind), self.next);
        self.next += 1;
        id
    }
}

pub(crate) fn namespaced_id(owner: &str, index: impl std::fmt::Display) -> String {
    format!("{}-{}", owner, index)
}
