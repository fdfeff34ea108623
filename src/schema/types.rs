use crate::error::{RenderError, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer};
use std::path::Path;

/// Elements that learn their name from the key they are declared under.
pub trait Named {
    fn set_name(&mut self, name: &str);
}

/// Deserializes a `name -> definition` map where the definition may be
/// omitted (`id:` with no body) and fills in each definition's name.
fn named_map<'de, D, T>(deserializer: D) -> std::result::Result<IndexMap<String, T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default + Named,
{
    let raw: Option<IndexMap<String, Option<T>>> = Option::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .map(|(name, def)| {
            let mut def = def.unwrap_or_default();
            def.set_name(&name);
            (name, def)
        })
        .collect())
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum PrefixDefinition {
    Reference(String),
    Expanded {
        #[serde(default)]
        prefix_prefix: Option<String>,
        prefix_reference: String,
    },
}

impl PrefixDefinition {
    pub fn reference(&self) -> &str {
        match self {
            PrefixDefinition::Reference(reference) => reference,
            PrefixDefinition::Expanded {
                prefix_reference, ..
            } => prefix_reference,
        }
    }
}

/// `readonly` is a free-text note in most schemas, but hand-written ones
/// often use a plain flag.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Readonly {
    Flag(bool),
    Note(String),
}

/// A slot (attribute) declaration.
///
/// Flags are optional so that `slot_usage` refinements can be layered over a
/// base definition; use the `is_*` accessors to read them.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct SlotDefinition {
    pub name: String,
    pub range: Option<String>,
    pub multivalued: Option<bool>,
    pub inlined: Option<bool>,
    pub inlined_as_list: Option<bool>,
    pub identifier: Option<bool>,
    pub key: Option<bool>,
    pub readonly: Option<Readonly>,
    pub required: Option<bool>,
    pub rank: Option<i64>,
    pub slot_group: Option<String>,
    pub description: Option<String>,
    pub slot_uri: Option<String>,
    pub alias: Option<String>,
}

impl Named for SlotDefinition {
    fn set_name(&mut self, name: &str) {
        self.name = name.to_string();
    }
}

impl SlotDefinition {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    pub fn range(&self) -> &str {
        self.range.as_deref().unwrap_or("string")
    }

    pub fn is_multivalued(&self) -> bool {
        self.multivalued.unwrap_or(false)
    }

    pub fn is_inlined(&self) -> bool {
        self.inlined.unwrap_or(false)
    }

    pub fn is_inlined_as_list(&self) -> bool {
        self.inlined_as_list.unwrap_or(false)
    }

    pub fn is_identifier(&self) -> bool {
        self.identifier.unwrap_or(false)
    }

    pub fn is_key(&self) -> bool {
        self.key.unwrap_or(false)
    }

    /// True for identifier or key slots.
    pub fn is_identifying(&self) -> bool {
        self.is_identifier() || self.is_key()
    }

    /// Any note marks the slot; a flag marks it only when true.
    pub fn is_readonly(&self) -> bool {
        match &self.readonly {
            Some(Readonly::Flag(flag)) => *flag,
            Some(Readonly::Note(_)) => true,
            None => false,
        }
    }

    /// Display label: the alias if declared, otherwise the name.
    pub fn label(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }

    /// Layers every field set on `refinement` over this definition.
    pub fn refine(&mut self, refinement: &SlotDefinition) {
        macro_rules! overlay {
            ($($field:ident),*) => {
                $(if refinement.$field.is_some() {
                    self.$field = refinement.$field.clone();
                })*
            };
        }
        overlay!(
            range,
            multivalued,
            inlined,
            inlined_as_list,
            identifier,
            key,
            readonly,
            required,
            rank,
            slot_group,
            description,
            slot_uri,
            alias
        );
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ClassDefinition {
    pub name: String,
    pub is_a: Option<String>,
    pub mixins: Vec<String>,
    pub tree_root: bool,
    pub slots: Vec<String>,
    #[serde(deserialize_with = "named_map")]
    pub attributes: IndexMap<String, SlotDefinition>,
    #[serde(deserialize_with = "named_map")]
    pub slot_usage: IndexMap<String, SlotDefinition>,
    pub description: Option<String>,
    pub class_uri: Option<String>,
}

impl Named for ClassDefinition {
    fn set_name(&mut self, name: &str) {
        self.name = name.to_string();
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PermissibleValue {
    pub text: String,
    pub description: Option<String>,
    pub meaning: Option<String>,
}

impl Named for PermissibleValue {
    fn set_name(&mut self, name: &str) {
        self.text = name.to_string();
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EnumDefinition {
    pub name: String,
    #[serde(deserialize_with = "named_map")]
    pub permissible_values: IndexMap<String, PermissibleValue>,
    pub description: Option<String>,
}

impl Named for EnumDefinition {
    fn set_name(&mut self, name: &str) {
        self.name = name.to_string();
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TypeDefinition {
    pub name: String,
    #[serde(rename = "typeof")]
    pub type_of: Option<String>,
    pub uri: Option<String>,
    pub base: Option<String>,
    pub description: Option<String>,
}

impl Named for TypeDefinition {
    fn set_name(&mut self, name: &str) {
        self.name = name.to_string();
    }
}

impl TypeDefinition {
    fn builtin(name: &str, type_of: Option<&str>, uri: &str, base: &str) -> Self {
        Self {
            name: name.to_string(),
            type_of: type_of.map(str::to_string),
            uri: Some(uri.to_string()),
            base: Some(base.to_string()),
            description: None,
        }
    }

    /// Primitive types every schema can use without declaring them.
    pub fn builtins() -> Vec<TypeDefinition> {
        vec![
            Self::builtin("string", None, "xsd:string", "str"),
            Self::builtin("integer", None, "xsd:integer", "int"),
            Self::builtin("float", None, "xsd:float", "float"),
            Self::builtin("double", None, "xsd:double", "float"),
            Self::builtin("decimal", None, "xsd:decimal", "Decimal"),
            Self::builtin("boolean", None, "xsd:boolean", "Bool"),
            Self::builtin("date", None, "xsd:date", "XSDDate"),
            Self::builtin("datetime", None, "xsd:dateTime", "XSDDateTime"),
            Self::builtin("uriorcurie", None, "xsd:anyURI", "URIorCURIE"),
            Self::builtin("uri", Some("uriorcurie"), "xsd:anyURI", "URI"),
            Self::builtin("curie", Some("string"), "xsd:string", "Curie"),
            Self::builtin("ncname", Some("string"), "xsd:string", "NCName"),
        ]
    }
}

/// The root of a schema document.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SchemaDefinition {
    pub id: Option<String>,
    pub name: String,
    pub default_prefix: Option<String>,
    pub default_range: Option<String>,
    pub prefixes: IndexMap<String, PrefixDefinition>,
    #[serde(deserialize_with = "named_map")]
    pub classes: IndexMap<String, ClassDefinition>,
    #[serde(deserialize_with = "named_map")]
    pub slots: IndexMap<String, SlotDefinition>,
    #[serde(deserialize_with = "named_map")]
    pub enums: IndexMap<String, EnumDefinition>,
    #[serde(deserialize_with = "named_map")]
    pub types: IndexMap<String, TypeDefinition>,
}

impl SchemaDefinition {
    pub fn from_yaml_str(input: &str) -> Result<Self> {
        serde_yaml::from_str(input).map_err(|e| RenderError::Schema(e.to_string()))
    }

    pub fn from_json_str(input: &str) -> Result<Self> {
        serde_json::from_str(input).map_err(|e| RenderError::Schema(e.to_string()))
    }

    /// Loads a schema, choosing JSON for `.json` files and YAML otherwise.
    pub fn from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::from_json_str(&content),
            _ => Self::from_yaml_str(&content),
        }
    }
}
