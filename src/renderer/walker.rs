use crate::error::{RenderError, Result};
use crate::instance::{EntryKey, InstanceView};
use crate::paths::{Context, PathArena, TargetMarker};
use crate::renderer::components::{AtomRenderer, SlotLayout};
use crate::renderer::mermaid::MermaidEmitter;
use crate::renderer::traits::*;
use crate::schema::{Element, SchemaView};
use crate::style::{RenderElementType, RenderRule, StyleEngine};
use std::collections::HashSet;
use tracing::{debug, info, warn};

/// Depth-first traversal of an instance, shared by every output format.
///
/// The walker classifies each node against the schema and the style rules
/// and hands the result to its [`Emitter`]. Ordering and grouping decisions
/// are made here only, so every format sees the same sequence of events.
pub struct Walker<'a, E: Emitter> {
    schema: &'a dyn SchemaView,
    style: &'a StyleEngine,
    emitter: E,
    /// Objects on the current descent chain.
    active: HashSet<usize>,
}

impl<'a, E: Emitter> Walker<'a, E> {
    pub fn new(schema: &'a dyn SchemaView, style: &'a StyleEngine, emitter: E) -> Self {
        Self {
            schema,
            style,
            emitter,
            active: HashSet::new(),
        }
    }

    /// Renders `instance` as a complete document.
    ///
    /// The root class is `root` when given, otherwise the instance's type tag,
    /// otherwise the schema's single tree root.
    pub fn render<V: InstanceView + ?Sized>(mut self, instance: &V, root: Option<&str>) -> Result<String> {
        let arena = PathArena::new();
        let mut ctx = Context::new(self.schema, &arena);
        let root = match root {
            Some(root) => {
                if self.schema.element(root).is_none() {
                    return Err(RenderError::SchemaResolution(root.to_string()));
                }
                root.to_string()
            }
            None => self.resolve_root(instance)?,
        };
        ctx.set_root(&root);
        self.generate(instance, &ctx)?;
        Ok(self.emitter.finish())
    }

    fn resolve_root<V: InstanceView + ?Sized>(&self, instance: &V) -> Result<String> {
        if let Some(tag) = instance.type_tag() {
            if self.schema.is_class(tag) {
                return Ok(tag.to_string());
            }
            return Err(RenderError::SchemaResolution(tag.to_string()));
        }
        let roots = self.schema.tree_roots();
        match roots.as_slice() {
            [root] => Ok(root.clone()),
            [] => Err(RenderError::AmbiguousRoot(
                "no class is marked tree_root".to_string(),
            )),
            _ => Err(RenderError::AmbiguousRoot(format!(
                "several classes are marked tree_root: {}",
                roots.join(", ")
            ))),
        }
    }

    fn rule(&self, ctx: &Context<'_>) -> Option<&'a RenderRule> {
        let slot = ctx.current_slot()?;
        self.style.rule_for(self.schema, &slot, self.emitter.format())
    }

    fn mismatch(ctx: &Context<'_>, message: &str) -> RenderError {
        RenderError::TypeMismatch {
            path: ctx.source_path().to_string(),
            message: message.to_string(),
        }
    }

    pub fn generate<V: InstanceView + ?Sized>(&mut self, value: &V, ctx: &Context<'_>) -> Result<()> {
        info!("Current context: {}", ctx);
        let rule = self.rule(ctx);
        let render_as = rule.and_then(|r| r.render_as);

        if ctx.target_depth() == 0 {
            return self.generate_document(value, ctx);
        }
        if value.is_null() {
            return Ok(());
        }
        if ctx.in_collection() {
            return self.generate_collection(value, ctx, render_as);
        }
        if ctx.in_object() {
            if value.as_fields().is_none() {
                return Err(Self::mismatch(ctx, "expected an object"));
            }
            let identity = value.identity();
            if !self.active.insert(identity) {
                warn!("Cycle detected at {}; not descending again", ctx);
                self.emitter.truncated(ctx);
                return Ok(());
            }
            let requested = if render_as == Some(RenderElementType::Tuple) {
                ObjectLayout::Tuple
            } else {
                ObjectLayout::Fields
            };
            let result = match self.emitter.object_layout(ctx, requested) {
                ObjectLayout::Tuple => self.generate_tuple(value, ctx),
                ObjectLayout::Fields => self.generate_object(value, ctx),
            };
            self.active.remove(&identity);
            return result;
        }
        if ctx.in_object_reference() {
            return self.generate_reference(value, ctx);
        }
        self.generate_atom(value, ctx, rule)
    }

    fn generate_document<V: InstanceView + ?Sized>(&mut self, value: &V, ctx: &Context<'_>) -> Result<()> {
        let class_name = ctx.current_element_type()?.name().to_string();

        let mut title = None;
        if self.schema.is_class(&class_name) {
            if let Some(title_slot) = self.style.title_slot(self.schema, &class_name)? {
                title = AtomRenderer::field_text(value, &title_slot);
            }
        }

        let diagram = if self.style.include_diagrams() && self.emitter.embeds_diagram() {
            let walker = Walker::new(self.schema, self.style, MermaidEmitter::new());
            Some(walker.render(value, Some(&class_name))?)
        } else {
            None
        };

        self.emitter.begin_document(&DocumentInfo {
            class_name,
            title,
            diagram,
        });
        self.generate(value, &ctx.extend(None, Some(TargetMarker::Body)))?;
        self.emitter.end_document();
        Ok(())
    }

    fn generate_collection<V: InstanceView + ?Sized>(
        &mut self,
        value: &V,
        ctx: &Context<'_>,
        render_as: Option<RenderElementType>,
    ) -> Result<()> {
        let entries = value
            .as_entries()
            .ok_or_else(|| Self::mismatch(ctx, "expected a list or mapping for a multivalued slot"))?;

        let objects = ctx.range_is_object();
        let requested = match render_as {
            Some(render_as) => Layout::try_from(render_as)?,
            None if objects => Layout::Table,
            None => Layout::SimpleList,
        };
        let layout = self.emitter.collection_layout(requested);
        let info = CollectionInfo {
            slot_name: ctx.current_slot().map(|s| s.name.clone()).unwrap_or_default(),
            element_type: ctx.current_element_name().unwrap_or_default(),
            objects,
            len: entries.len(),
        };
        debug!("Collection {} render_as={:?} ({} elements)", info.slot_name, layout, info.len);

        if entries.is_empty() {
            return Ok(());
        }

        match layout {
            Layout::Table => {
                if ctx.in_target(TargetMarker::Table) {
                    debug!("Will not nest table in table for {}", ctx);
                    self.emitter.truncated(ctx);
                    return Ok(());
                }
                self.elements_to_table(&entries, ctx)
            }
            Layout::SimpleList => self.elements_to_list(&entries, ctx, &info),
            Layout::DescriptionList => self.elements_to_description_list(&entries, ctx, &info),
            Layout::Tuple => self.elements_to_tuples(&entries, ctx, &info),
        }
    }

    fn elements_to_table<V: InstanceView + ?Sized>(
        &mut self,
        entries: &[(EntryKey, &V)],
        ctx: &Context<'_>,
    ) -> Result<()> {
        for (_, element) in entries {
            if element.as_fields().is_none() {
                return Err(Self::mismatch(ctx, "table rows must be objects"));
            }
        }

        // A column is kept if any row populates it.
        let columns: Vec<_> = SlotLayout::ordered_slots(ctx)?
            .into_iter()
            .filter(|slot| {
                entries
                    .iter()
                    .any(|(_, e)| e.field(&slot.name).map(|v| !v.is_empty()).unwrap_or(false))
            })
            .collect();
        let infos: Vec<FieldInfo> = columns
            .iter()
            .map(|slot| SlotLayout::field_info(ctx, slot))
            .collect();

        self.emitter.begin_table(ctx, &infos);
        for (key, element) in entries {
            let row_ctx = ctx.index_extend(key.clone(), None);
            self.emitter.begin_row();
            for slot in &columns {
                self.emitter.begin_cell();
                if let Some(v) = element.field(&slot.name) {
                    self.generate(v, &row_ctx.extend(Some(slot), Some(TargetMarker::Table)))?;
                }
                self.emitter.end_cell();
            }
            self.emitter.end_row();
        }
        self.emitter.end_table();
        Ok(())
    }

    fn elements_to_list<V: InstanceView + ?Sized>(
        &mut self,
        entries: &[(EntryKey, &V)],
        ctx: &Context<'_>,
        info: &CollectionInfo,
    ) -> Result<()> {
        self.emitter.begin_list(ctx, info);
        for (key, element) in entries {
            self.emitter.begin_item();
            self.generate(*element, &ctx.index_extend(key.clone(), Some(TargetMarker::ListItem)))?;
            self.emitter.end_item();
        }
        self.emitter.end_list();
        Ok(())
    }

    fn elements_to_description_list<V: InstanceView + ?Sized>(
        &mut self,
        entries: &[(EntryKey, &V)],
        ctx: &Context<'_>,
        info: &CollectionInfo,
    ) -> Result<()> {
        let keys: Vec<EntryKey> = entries.iter().map(|(k, _)| k.clone()).collect();
        self.emitter.begin_description_list(ctx, info, &keys);
        for (key, element) in entries {
            self.emitter.begin_entry(info, key);
            self.generate(*element, &ctx.index_extend(key.clone(), Some(TargetMarker::Heading)))?;
            self.emitter.end_entry();
        }
        self.emitter.end_description_list();
        Ok(())
    }

    fn elements_to_tuples<V: InstanceView + ?Sized>(
        &mut self,
        entries: &[(EntryKey, &V)],
        ctx: &Context<'_>,
        info: &CollectionInfo,
    ) -> Result<()> {
        self.emitter.begin_tuples(ctx, info);
        for (i, (key, element)) in entries.iter().enumerate() {
            if i > 0 {
                self.emitter.tuple_separator();
            }
            self.generate(*element, &ctx.index_extend(key.clone(), None))?;
        }
        self.emitter.end_tuples();
        Ok(())
    }

    /// Field block: heading, summary, then every populated slot in
    /// attribute-block order.
    fn generate_object<V: InstanceView + ?Sized>(&mut self, value: &V, ctx: &Context<'_>) -> Result<()> {
        let class_name = ctx.current_element_name().unwrap_or_default();

        let title = match self.style.title_slot(self.schema, &class_name)? {
            Some(slot) => AtomRenderer::field_text(value, &slot),
            None => None,
        };
        let description = match self.style.description_slot(self.schema, &class_name)? {
            Some(slot) => AtomRenderer::field_text(value, &slot),
            None => None,
        };
        let identifier = self
            .schema
            .identifier_slot(&class_name)
            .and_then(|slot| AtomRenderer::field_text(value, &slot.name));

        self.emitter.begin_object(
            ctx,
            &ObjectInfo {
                class_name,
                identifier,
                title,
                description,
            },
        );

        for block in SlotLayout::attribute_blocks(ctx)? {
            for slot in &block.attributes {
                let Some(v) = value.field(&slot.name) else {
                    continue;
                };
                if v.is_empty() || slot.is_readonly() {
                    continue;
                }
                let field = SlotLayout::field_info(ctx, slot);
                let marker = self.emitter.field_marker(&field);
                self.emitter.begin_field(ctx, &field);
                self.generate(v, &ctx.extend(Some(slot), marker))?;
                self.emitter.end_field(ctx, &field);
            }
        }

        self.emitter.end_object(ctx);
        Ok(())
    }

    /// Positional rendering: populated slot values in order, without labels.
    fn generate_tuple<V: InstanceView + ?Sized>(&mut self, value: &V, ctx: &Context<'_>) -> Result<()> {
        self.emitter.begin_tuple(ctx);
        let mut first = true;
        for slot in SlotLayout::ordered_slots(ctx)? {
            let Some(v) = value.field(&slot.name) else {
                continue;
            };
            if v.is_empty() {
                continue;
            }
            if !first {
                self.emitter.tuple_value_separator();
            }
            first = false;
            self.generate(v, &ctx.extend(Some(&slot), Some(TargetMarker::Span)))?;
        }
        self.emitter.end_tuple();
        Ok(())
    }

    fn generate_reference<V: InstanceView + ?Sized>(&mut self, value: &V, ctx: &Context<'_>) -> Result<()> {
        let id = value
            .as_scalar()
            .ok_or_else(|| Self::mismatch(ctx, "expected an identifier for a non-inlined reference"))?
            .to_string();
        let href = self.schema.expand_curie(&id);
        self.emitter.reference(ctx, &id, &href);
        Ok(())
    }

    fn generate_atom<V: InstanceView + ?Sized>(
        &mut self,
        value: &V,
        ctx: &Context<'_>,
        rule: Option<&RenderRule>,
    ) -> Result<()> {
        let raw = value
            .as_scalar()
            .ok_or_else(|| Self::mismatch(ctx, "expected an atomic value"))?
            .to_string();

        if let Some(template) = rule.and_then(|r| r.template.as_ref()) {
            debug!("Ignoring template {:?} at {}", template, ctx);
        }
        let text = rule
            .and_then(|r| r.format_value(&raw))
            .unwrap_or_else(|| raw.clone());

        let url = match ctx.current_element_type()? {
            Element::Type(type_def) => AtomRenderer::url(self.schema, &type_def.name, &raw),
            Element::Enum(_) => None,
            other => {
                return Err(RenderError::TypeConsistency {
                    name: other.name().to_string(),
                    expected: "type or enum".to_string(),
                })
            }
        };

        self.emitter.atom(ctx, &text, url.as_deref());
        Ok(())
    }
}
