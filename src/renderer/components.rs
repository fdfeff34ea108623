use crate::error::{RenderError, Result};
use crate::instance::InstanceView;
use crate::paths::Context;
use crate::renderer::traits::FieldInfo;
use crate::schema::{SchemaView, SlotDefinition};

/// Rank given to slots with neither an explicit rank nor an identifying role.
const DEFAULT_RANK: i64 = 9999;

/// Group for identifier/key slots that declare no slot group.
pub const KEY_GROUP: &str = "key";

/// A block of attributes, typically one slot group.
#[derive(Debug, Clone)]
pub struct AttributeBlock {
    /// Slot group name; `None` for ungrouped slots.
    pub name: Option<String>,
    pub attributes: Vec<SlotDefinition>,
}

impl AttributeBlock {
    pub fn slot_names(&self) -> Vec<&str> {
        self.attributes.iter().map(|s| s.name.as_str()).collect()
    }
}

/// Helper for deciding which slots an object shows and in what order
pub struct SlotLayout;

impl SlotLayout {
    /// Induced slots of the current class with inlining normalized.
    ///
    /// A slot whose range is a class without an identifier slot is treated
    /// as inlined, since such objects cannot be referenced.
    pub fn slots(ctx: &Context<'_>) -> Result<Vec<SlotDefinition>> {
        let schema = ctx.schema();
        let class_name = ctx.current_element_name().unwrap_or_default();
        if !schema.is_class(&class_name) {
            return Err(RenderError::TypeConsistency {
                name: class_name,
                expected: "class".to_string(),
            });
        }

        let mut slots = schema.class_induced_slots(&class_name)?;
        for slot in &mut slots {
            Self::normalize_inlining(schema, slot);
        }
        Ok(slots)
    }

    pub fn normalize_inlining(schema: &dyn SchemaView, slot: &mut SlotDefinition) {
        if slot.is_inlined_as_list() {
            slot.inlined = Some(true);
        }
        if !slot.is_inlined()
            && schema.is_class(slot.range())
            && schema.identifier_slot(slot.range()).is_none()
        {
            slot.inlined = Some(true);
        }
    }

    pub fn rank(slot: &SlotDefinition) -> i64 {
        match slot.rank {
            Some(rank) => rank,
            None if slot.is_identifying() => 0,
            None => DEFAULT_RANK,
        }
    }

    /// Slots sorted by rank and grouped by slot group, groups in order of
    /// their first (lowest ranked) member.
    pub fn attribute_blocks(ctx: &Context<'_>) -> Result<Vec<AttributeBlock>> {
        let mut slots = Self::slots(ctx)?;
        slots.sort_by_key(Self::rank);

        let mut blocks: Vec<AttributeBlock> = Vec::new();
        for slot in slots {
            let group = match &slot.slot_group {
                Some(group) => Some(group.clone()),
                None if slot.is_identifying() => Some(KEY_GROUP.to_string()),
                None => None,
            };
            match blocks.iter_mut().find(|b| b.name == group) {
                Some(block) => block.attributes.push(slot),
                None => blocks.push(AttributeBlock {
                    name: group,
                    attributes: vec![slot],
                }),
            }
        }
        Ok(blocks)
    }

    pub fn ordered_slots(ctx: &Context<'_>) -> Result<Vec<SlotDefinition>> {
        Ok(Self::attribute_blocks(ctx)?
            .into_iter()
            .flat_map(|b| b.attributes)
            .collect())
    }

    pub fn field_info(ctx: &Context<'_>, slot: &SlotDefinition) -> FieldInfo {
        let schema = ctx.schema();
        FieldInfo {
            name: slot.name.clone(),
            label: slot.label().to_string(),
            uri: schema.slot_uri(slot, true),
            description: slot.description.clone(),
            nested: schema.is_class(slot.range()) && slot.is_inlined(),
            depth: ctx.target_depth(),
        }
    }
}

/// Helper for rendering atomic values
pub struct AtomRenderer;

impl AtomRenderer {
    /// Link target for a value of a URI-like type, if it is one.
    pub fn url(schema: &dyn SchemaView, type_name: &str, value: &str) -> Option<String> {
        let ancestors = schema.type_ancestors(type_name);
        if ancestors.iter().any(|t| t == "uriorcurie") {
            Some(schema.expand_curie(value))
        } else if ancestors.iter().any(|t| t == "uri") {
            Some(value.to_string())
        } else {
            None
        }
    }

    /// Text of a scalar field, if the field is present and atomic.
    pub fn field_text<V: InstanceView + ?Sized>(value: &V, field: &str) -> Option<String> {
        value
            .field(field)
            .and_then(|v| v.as_scalar())
            .map(|s| s.to_string())
    }
}

pub fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
