use crate::error::Result;
use crate::renderer::OutputFormat;
use crate::schema::{SchemaView, SlotDefinition};
use crate::style::model::*;

const TITLE_CURIES: &[&str] = &["dcterms:title"];
const DESCRIPTION_CURIES: &[&str] = &["dcterms:description", "skos:definition"];

/// Decides which style rules apply to a schema element.
///
/// Rules are scanned in order and the first match wins. Configuring the same
/// slot twice therefore keeps the first rule's effect.
#[derive(Debug, Clone, Default)]
pub struct StyleEngine {
    pub configuration: Configuration,
}

impl StyleEngine {
    pub fn new(configuration: Configuration) -> Self {
        Self { configuration }
    }

    /// First induced slot of the class whose CURIE is one of `curies`.
    pub fn slot_by_curie(
        &self,
        schema: &dyn SchemaView,
        class_name: &str,
        curies: &[&str],
    ) -> Result<Option<String>> {
        let slots = schema.class_induced_slots(class_name)?;
        Ok(slots
            .into_iter()
            .find(|s| curies.contains(&schema.slot_uri(s, false).as_str()))
            .map(|s| s.name))
    }

    pub fn title_slot(&self, schema: &dyn SchemaView, class_name: &str) -> Result<Option<String>> {
        self.slot_by_curie(schema, class_name, TITLE_CURIES)
    }

    pub fn description_slot(
        &self,
        schema: &dyn SchemaView,
        class_name: &str,
    ) -> Result<Option<String>> {
        self.slot_by_curie(schema, class_name, DESCRIPTION_CURIES)
    }

    pub fn configure_slot(&mut self, slot_name: &str, render_as: RenderElementType) {
        self.configuration
            .rules
            .push(RenderRule::for_slot(slot_name, render_as));
    }

    /// Adds one rule per slot. A slot that already has a rule keeps it.
    pub fn configure_slots<I, S>(&mut self, slot_names: I, render_as: RenderElementType)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for slot_name in slot_names {
            self.configure_slot(slot_name.as_ref(), render_as);
        }
    }

    pub fn slot_render_as(&self, slot_name: &str) -> Option<RenderElementType> {
        self.configuration
            .rules
            .iter()
            .find(|rule| rule.applies_to_slots.iter().any(|s| s == slot_name))
            .and_then(|rule| rule.render_as)
    }

    /// The first rule matching the slot by name or CURIE and limited to no
    /// format or to `format`.
    pub fn rule_for(
        &self,
        schema: &dyn SchemaView,
        slot: &SlotDefinition,
        format: OutputFormat,
    ) -> Option<&RenderRule> {
        let mut curie = None;
        self.configuration.rules.iter().find(|rule| {
            if !rule.applies_to_format(format) {
                return false;
            }
            if rule.applies_to_slots.iter().any(|s| *s == slot.name) {
                return true;
            }
            if rule.applies_to_curies.is_empty() {
                return false;
            }
            let curie: &str = curie.get_or_insert_with(|| schema.slot_uri(slot, false));
            rule.applies_to_curies.iter().any(|c| c.as_str() == curie)
        })
    }

    pub fn include_diagrams(&self) -> bool {
        self.configuration.include_diagrams
    }
}
