use crate::error::{RenderError, Result};
use crate::schema::types::*;
use indexmap::IndexMap;
use std::collections::HashSet;

/// A schema element resolved by name.
#[derive(Debug, Clone, Copy)]
pub enum Element<'a> {
    Class(&'a ClassDefinition),
    Enum(&'a EnumDefinition),
    Type(&'a TypeDefinition),
    Slot(&'a SlotDefinition),
}

impl<'a> Element<'a> {
    pub fn name(&self) -> &'a str {
        match self {
            Element::Class(c) => &c.name,
            Element::Enum(e) => &e.name,
            Element::Type(t) => &t.name,
            Element::Slot(s) => &s.name,
        }
    }
}

/// Read-only schema queries needed by the rendering engine.
pub trait SchemaView {
    /// Resolves an element name to its definition.
    fn element(&self, name: &str) -> Option<Element<'_>>;

    fn all_classes(&self) -> Vec<&ClassDefinition>;

    /// Induced slots of a class: own slots first, then inherited and mixed-in
    /// ones, with `slot_usage` refinements applied.
    fn class_induced_slots(&self, class_name: &str) -> Result<Vec<SlotDefinition>>;

    /// The URI a slot maps to, as a CURIE or (with `expand`) a full URI.
    fn slot_uri(&self, slot: &SlotDefinition, expand: bool) -> String;

    /// Expands a CURIE with a known prefix; anything else is returned unchanged.
    fn expand_curie(&self, curie: &str) -> String;

    /// The type and all the types it descends from, nearest first.
    fn type_ancestors(&self, type_name: &str) -> Vec<String>;

    fn is_class(&self, name: &str) -> bool {
        matches!(self.element(name), Some(Element::Class(_)))
    }

    fn is_type(&self, name: &str) -> bool {
        matches!(self.element(name), Some(Element::Type(_)))
    }

    fn tree_roots(&self) -> Vec<String> {
        self.all_classes()
            .into_iter()
            .filter(|c| c.tree_root)
            .map(|c| c.name.clone())
            .collect()
    }

    /// The slot whose value identifies instances of the class, if any.
    fn identifier_slot(&self, class_name: &str) -> Option<SlotDefinition> {
        let slots = self.class_induced_slots(class_name).ok()?;
        slots
            .iter()
            .find(|s| s.is_identifier())
            .or_else(|| slots.iter().find(|s| s.is_key()))
            .cloned()
    }
}

/// In-memory [`SchemaView`] over a loaded [`SchemaDefinition`].
pub struct SchemaIndex {
    schema: SchemaDefinition,
    types: IndexMap<String, TypeDefinition>,
}

impl SchemaIndex {
    pub fn new(schema: SchemaDefinition) -> Self {
        let mut types: IndexMap<String, TypeDefinition> = TypeDefinition::builtins()
            .into_iter()
            .map(|t| (t.name.clone(), t))
            .collect();
        for (name, def) in &schema.types {
            types.insert(name.clone(), def.clone());
        }
        Self { schema, types }
    }

    pub fn schema(&self) -> &SchemaDefinition {
        &self.schema
    }

    fn class(&self, name: &str) -> Result<&ClassDefinition> {
        self.schema
            .classes
            .get(name)
            .ok_or_else(|| RenderError::SchemaResolution(format!("class {}", name)))
    }

    /// The class followed by its `is_a` parents and mixins, depth first.
    fn class_ancestors(&self, class_name: &str) -> Result<Vec<&ClassDefinition>> {
        let mut ancestors = Vec::new();
        let mut seen = HashSet::new();
        let mut pending = vec![class_name.to_string()];

        while let Some(name) = pending.pop() {
            if !seen.insert(name.clone()) {
                continue;
            }
            let class = self.class(&name)?;
            ancestors.push(class);
            // Pushed in reverse so is_a is visited before the mixins.
            for mixin in class.mixins.iter().rev() {
                pending.push(mixin.clone());
            }
            if let Some(parent) = &class.is_a {
                pending.push(parent.clone());
            }
        }

        Ok(ancestors)
    }

    fn default_prefix(&self) -> &str {
        self.schema
            .default_prefix
            .as_deref()
            .unwrap_or(&self.schema.name)
    }
}

impl SchemaView for SchemaIndex {
    fn element(&self, name: &str) -> Option<Element<'_>> {
        if let Some(class) = self.schema.classes.get(name) {
            return Some(Element::Class(class));
        }
        if let Some(enum_def) = self.schema.enums.get(name) {
            return Some(Element::Enum(enum_def));
        }
        if let Some(type_def) = self.types.get(name) {
            return Some(Element::Type(type_def));
        }
        self.schema.slots.get(name).map(Element::Slot)
    }

    fn all_classes(&self) -> Vec<&ClassDefinition> {
        self.schema.classes.values().collect()
    }

    fn class_induced_slots(&self, class_name: &str) -> Result<Vec<SlotDefinition>> {
        let ancestors = self.class_ancestors(class_name)?;

        let mut names: Vec<&str> = Vec::new();
        for class in &ancestors {
            for name in class.slots.iter().chain(class.attributes.keys()) {
                if !names.contains(&name.as_str()) {
                    names.push(name);
                }
            }
        }

        let mut induced = Vec::with_capacity(names.len());
        for name in names {
            // Most specific declaration wins: attributes, then global slots.
            let mut slot = ancestors
                .iter()
                .find_map(|c| c.attributes.get(name))
                .or_else(|| self.schema.slots.get(name))
                .cloned()
                .ok_or_else(|| RenderError::SchemaResolution(format!("slot {}", name)))?;

            // Refinements apply from the most general ancestor down.
            for class in ancestors.iter().rev() {
                if let Some(usage) = class.slot_usage.get(name) {
                    slot.refine(usage);
                }
            }

            if slot.range.is_none() {
                slot.range = self.schema.default_range.clone();
            }
            induced.push(slot);
        }

        Ok(induced)
    }

    fn slot_uri(&self, slot: &SlotDefinition, expand: bool) -> String {
        let uri = match &slot.slot_uri {
            Some(uri) => uri.clone(),
            None => format!("{}:{}", self.default_prefix(), slot.name),
        };
        if expand {
            self.expand_curie(&uri)
        } else {
            uri
        }
    }

    fn expand_curie(&self, curie: &str) -> String {
        let Some((prefix, local)) = curie.split_once(':') else {
            return curie.to_string();
        };
        match self.schema.prefixes.get(prefix) {
            Some(def) => format!("{}{}", def.reference(), local),
            None => curie.to_string(),
        }
    }

    fn type_ancestors(&self, type_name: &str) -> Vec<String> {
        let mut ancestors = Vec::new();
        let mut current = self.types.get(type_name);
        while let Some(type_def) = current {
            if ancestors.contains(&type_def.name) {
                break;
            }
            ancestors.push(type_def.name.clone());
            current = type_def.type_of.as_deref().and_then(|t| self.types.get(t));
        }
        ancestors
    }
}
