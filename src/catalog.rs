use ahash::AHashMap;
use serde::{Deserialize, Serialize};

/// The only distinction the compiler draws between components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeShape {
    /// Successors are plain edges: one for a sequence, several for a fan-out.
    Plain,
    /// Successors are named when/otherwise branches.
    Conditional,
}

/// Resolves a node's declared component id to its shape.
pub trait NodeCatalog: Send + Sync {
    /// Returns `None` when the component is not recognized.
    fn shape_of(&self, component_id: &str) -> Option<NodeShape>;
}

/// Component id of the built-in conditional node.
pub const CHOICE_COMPONENT: &str = "choice";

/// Master macro to declare the built-in components, their registration, and their lookup.
macro_rules! define_components {
    ( $( ($component_id:literal, $shape:ident) ),* $(,)? ) => {
        // 1. Register every built-in component
        fn register_default_components(registry: &mut AHashMap<String, NodeShape>) {
            $( registry.insert($component_id.to_string(), NodeShape::$shape); )*
        }

        // 2. Resolve a built-in component by its id
        fn builtin_shape(component_id: &str) -> Option<NodeShape> {
            match component_id {
                $( $component_id => Some(NodeShape::$shape), )*
                _ => None,
            }
        }
    };
}

define_components! {
    ("choice", Conditional),
    ("start", Plain),
    ("end", Plain),
    ("script", Plain),
    ("transform", Plain),
    ("filter", Plain),
    ("delay", Plain),
    ("log", Plain),
    ("http-request", Plain),
    ("save-telemetry", Plain),
}

/// The default `NodeCatalog`: the built-in components plus any registered by the caller.
#[derive(Debug, Clone)]
pub struct ComponentCatalog {
    registry: AHashMap<String, NodeShape>,
    fallback: Option<NodeShape>,
}

impl ComponentCatalog {
    pub fn new() -> Self {
        let mut registry = AHashMap::new();
        register_default_components(&mut registry);
        Self {
            registry,
            fallback: None,
        }
    }

    /// A catalog that treats every unregistered component as plain.
    pub fn permissive() -> Self {
        Self {
            fallback: Some(NodeShape::Plain),
            ..Self::new()
        }
    }

    pub fn with_component(mut self, component_id: &str, shape: NodeShape) -> Self {
        self.registry.insert(component_id.to_string(), shape);
        self
    }

    /// Gives a user component the shape of a built-in one. Unknown built-ins are ignored.
    pub fn with_type_mapping(mut self, user_component_id: &str, builtin_component_id: &str) -> Self {
        if let Some(shape) = builtin_shape(builtin_component_id) {
            self.registry.insert(user_component_id.to_string(), shape);
        } else {
            log::warn!(
                "Ignoring mapping '{}' -> '{}': not a built-in component",
                user_component_id,
                builtin_component_id
            );
        }
        self
    }
}

impl Default for ComponentCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl NodeCatalog for ComponentCatalog {
    fn shape_of(&self, component_id: &str) -> Option<NodeShape> {
        self.registry.get(component_id).copied().or(self.fallback)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtins_are_registered() {
        let catalog = ComponentCatalog::new();
        assert_eq!(catalog.shape_of("choice"), Some(NodeShape::Conditional));
        assert_eq!(catalog.shape_of("script"), Some(NodeShape::Plain));
        assert_eq!(catalog.shape_of("mystery"), None);
    }

    #[test]
    fn permissive_catalog_falls_back_to_plain() {
        let catalog = ComponentCatalog::permissive();
        assert_eq!(catalog.shape_of("mystery"), Some(NodeShape::Plain));
        assert_eq!(catalog.shape_of("choice"), Some(NodeShape::Conditional));
    }

    #[test]
    fn type_mapping_copies_builtin_shape() {
        let catalog = ComponentCatalog::new()
            .with_type_mapping("switch", "choice")
            .with_type_mapping("ghost", "not-a-builtin");
        assert_eq!(catalog.shape_of("switch"), Some(NodeShape::Conditional));
        assert_eq!(catalog.shape_of("ghost"), None);
    }
}
