use crate::error::{RenderError, Result};
use crate::instance::EntryKey;
use crate::schema::{Element, SchemaView, SlotDefinition};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// One step in the schema-side path.
#[derive(Debug, Clone)]
pub struct PathComponent {
    /// The schema element this step instantiates.
    pub element_type: String,
    /// The slot that led here from the parent; `None` at the root.
    pub slot: Option<Rc<SlotDefinition>>,
    /// For multivalued slots, the element selected from the collection.
    pub index: Option<EntryKey>,
}

impl PathComponent {
    pub fn root(element_type: &str) -> Self {
        Self {
            element_type: element_type.to_string(),
            slot: None,
            index: None,
        }
    }
}

impl fmt::Display for PathComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.slot {
            Some(slot) => write!(f, "{}", slot.name)?,
            None => write!(f, ".")?,
        }
        if let Some(index) = &self.index {
            write!(f, "[{}]", index)?;
        }
        match &self.slot {
            Some(slot) if !slot.is_inlined() => write!(f, "<<*{}>>", self.element_type),
            _ => write!(f, "<<{}>>", self.element_type),
        }
    }
}

/// A path from the tree root of an instance to the current element.
#[derive(Debug, Clone, Default)]
pub struct ObjectPath {
    pub components: Vec<PathComponent>,
}

impl fmt::Display for ObjectPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.components.iter().map(|c| c.to_string()).collect();
        write!(f, "{}", parts.join("/"))
    }
}

/// Output constructs that can be open while rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetMarker {
    Body,
    Table,
    DescriptionList,
    ListItem,
    Span,
    Heading,
}

impl fmt::Display for TargetMarker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TargetMarker::Body => "body",
            TargetMarker::Table => "table",
            TargetMarker::DescriptionList => "dl",
            TargetMarker::ListItem => "li",
            TargetMarker::Span => "span",
            TargetMarker::Heading => "h",
        };
        write!(f, "{}", name)
    }
}

struct PathNode {
    parent: Option<usize>,
    component: PathComponent,
}

/// Append-only storage for path components shared by every context of a
/// render. A context is a pointer to its last node; branching never copies.
#[derive(Default)]
pub struct PathArena {
    nodes: RefCell<Vec<PathNode>>,
}

impl PathArena {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, parent: Option<usize>, component: PathComponent) -> usize {
        let mut nodes = self.nodes.borrow_mut();
        nodes.push(PathNode { parent, component });
        nodes.len() - 1
    }

    fn component(&self, id: usize) -> PathComponent {
        self.nodes.borrow()[id].component.clone()
    }

    fn parent(&self, id: usize) -> Option<usize> {
        self.nodes.borrow()[id].parent
    }
}

/// A position in a traversal: where we are in the schema and which output
/// constructs are open.
///
/// Contexts are values. `extend` and `index_extend` return new contexts and
/// leave the receiver untouched, so sibling branches never observe each
/// other's extensions.
#[derive(Clone)]
pub struct Context<'a> {
    schema: &'a dyn SchemaView,
    arena: &'a PathArena,
    head: Option<usize>,
    target_path: Vec<TargetMarker>,
}

impl<'a> Context<'a> {
    pub fn new(schema: &'a dyn SchemaView, arena: &'a PathArena) -> Self {
        Self {
            schema,
            arena,
            head: None,
            target_path: Vec::new(),
        }
    }

    pub fn schema(&self) -> &'a dyn SchemaView {
        self.schema
    }

    /// Resets the source path to a single root component.
    pub fn set_root(&mut self, root: &str) {
        self.head = Some(self.arena.push(None, PathComponent::root(root)));
    }

    pub fn extend(&self, slot: Option<&SlotDefinition>, target: Option<TargetMarker>) -> Self {
        let mut extended = self.clone();
        if let Some(slot) = slot {
            let component = PathComponent {
                element_type: slot.range().to_string(),
                slot: Some(Rc::new(slot.clone())),
                index: None,
            };
            extended.head = Some(self.arena.push(self.head, component));
        }
        if let Some(marker) = target {
            extended.target_path.push(marker);
        }
        extended
    }

    /// Selects one element of the current collection. The schema position is
    /// unchanged; only the last component gains an index.
    pub fn index_extend(&self, index: EntryKey, target: Option<TargetMarker>) -> Self {
        let mut extended = self.clone();
        if let Some(head) = self.head {
            let mut component = self.arena.component(head);
            component.index = Some(index);
            extended.head = Some(self.arena.push(self.arena.parent(head), component));
        }
        if let Some(marker) = target {
            extended.target_path.push(marker);
        }
        extended
    }

    pub fn current(&self) -> Option<PathComponent> {
        self.head.map(|id| self.arena.component(id))
    }

    pub fn current_slot(&self) -> Option<Rc<SlotDefinition>> {
        self.current().and_then(|c| c.slot)
    }

    /// Name of the element type at the current position.
    pub fn current_element_name(&self) -> Option<String> {
        self.current().map(|c| c.element_type)
    }

    pub fn current_element_type(&self) -> Result<Element<'a>> {
        let name = self
            .current_element_name()
            .ok_or_else(|| RenderError::SchemaResolution("empty path".to_string()))?;
        match self.schema.element(&name) {
            Some(Element::Slot(_)) => Err(RenderError::TypeConsistency {
                name,
                expected: "class, enum or type".to_string(),
            }),
            Some(element) => Ok(element),
            None => Err(RenderError::SchemaResolution(name)),
        }
    }

    pub fn target_path(&self) -> &[TargetMarker] {
        &self.target_path
    }

    pub fn target_depth(&self) -> usize {
        self.target_path.len()
    }

    pub fn in_target(&self, marker: TargetMarker) -> bool {
        self.target_path.contains(&marker)
    }

    /// Looking at a multivalued slot's whole collection, not one element.
    pub fn in_collection(&self) -> bool {
        match self.current() {
            Some(PathComponent {
                slot: Some(slot),
                index,
                ..
            }) => slot.is_multivalued() && index.is_none(),
            _ => false,
        }
    }

    /// The current element type is a class embedded at this position (the
    /// root, or reached through an inlined slot), whether or not we are
    /// positioned on the collection itself.
    pub fn range_is_object(&self) -> bool {
        match self.current() {
            Some(c) => {
                self.schema.is_class(&c.element_type)
                    && c.slot.as_ref().map(|s| s.is_inlined()).unwrap_or(true)
            }
            None => false,
        }
    }

    pub fn in_object(&self) -> bool {
        !self.in_collection() && self.range_is_object()
    }

    /// A class reached through a non-inlined slot: the value is a reference.
    pub fn in_object_reference(&self) -> bool {
        if self.in_collection() {
            return false;
        }
        match self.current() {
            Some(PathComponent {
                element_type,
                slot: Some(slot),
                ..
            }) => self.schema.is_class(&element_type) && !slot.is_inlined(),
            _ => false,
        }
    }

    pub fn source_path(&self) -> ObjectPath {
        let mut components = Vec::new();
        let mut cursor = self.head;
        while let Some(id) = cursor {
            components.push(self.arena.component(id));
            cursor = self.arena.parent(id);
        }
        components.reverse();
        ObjectPath { components }
    }
}

impl fmt::Display for Context<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let target: Vec<String> = self.target_path.iter().map(|m| m.to_string()).collect();
        write!(f, "{} -> {}", self.source_path(), target.join("/"))
    }
}

impl fmt::Debug for Context<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Context({})", self)
    }
}
