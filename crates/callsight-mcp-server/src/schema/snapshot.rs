use serde::Deserialize;
use std::fmt;

/// Type names with this prefix are introspection-internal and excluded
/// from browsable listings.
const RESERVED_PREFIX: &str = "__";

/// Placeholder used when a type ref chain is missing its name. Display
/// formatting never fails on malformed input.
const UNKNOWN_TYPE: &str = "<unknown>";

/// A full introspected schema. Replaced wholesale on refresh, never merged.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaSnapshot {
    #[serde(default)]
    pub types: Vec<TypeDescriptor>,
    #[serde(default, deserialize_with = "root_type_name")]
    pub query_type: Option<String>,
    #[serde(default, deserialize_with = "root_type_name")]
    pub mutation_type: Option<String>,
}

impl SchemaSnapshot {
    /// User-facing object types, in the order the downstream returned them.
    pub fn browsable_types(&self) -> impl Iterator<Item = &TypeDescriptor> {
        self.types.iter().filter(|descriptor| {
            descriptor.kind == TypeKind::Object
                && !descriptor.name.is_empty()
                && !descriptor.name.starts_with(RESERVED_PREFIX)
        })
    }

    /// Exact-name type lookup.
    pub fn find_type(&self, name: &str) -> Option<&TypeDescriptor> {
        self.types.iter().find(|descriptor| descriptor.name == name)
    }
}

/// One named type in the schema.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeDescriptor {
    #[serde(default)]
    pub name: String,
    pub kind: TypeKind,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    fields: Option<Vec<FieldDescriptor>>,
    #[serde(default)]
    input_fields: Option<Vec<FieldDescriptor>>,
    #[serde(default)]
    enum_values: Option<Vec<EnumValueDescriptor>>,
}

impl TypeDescriptor {
    pub fn fields(&self) -> &[FieldDescriptor] {
        self.fields.as_deref().unwrap_or_default()
    }

    pub fn input_fields(&self) -> &[FieldDescriptor] {
        self.input_fields.as_deref().unwrap_or_default()
    }

    pub fn enum_values(&self) -> &[EnumValueDescriptor] {
        self.enum_values.as_deref().unwrap_or_default()
    }

    /// Look up a declared (object or input) field by name.
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields()
            .iter()
            .chain(self.input_fields())
            .find(|field| field.name == name)
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.field(name).is_some()
    }

    /// All member names of this type: fields, input fields, and enum values.
    /// This is the uniform namespace used for existence checks and
    /// did-you-mean suggestions.
    pub fn member_names(&self) -> Vec<&str> {
        self.fields()
            .iter()
            .chain(self.input_fields())
            .map(|field| field.name.as_str())
            .chain(self.enum_values().iter().map(|value| value.name.as_str()))
            .collect()
    }

    /// The normalized field view described in the introspection contract:
    /// object fields, then input fields, then enum values reinterpreted as
    /// field-like entries.
    pub fn normalized_fields(&self) -> Vec<FieldDescriptor> {
        self.fields()
            .iter()
            .chain(self.input_fields())
            .cloned()
            .chain(self.enum_values().iter().map(|value| FieldDescriptor {
                name: value.name.clone(),
                description: value.description.clone(),
                type_ref: TypeRef {
                    kind: TypeKind::Enum,
                    name: Some(self.name.clone()),
                    of_type: None,
                },
            }))
            .collect()
    }
}

/// One field of a type.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDescriptor {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub type_ref: TypeRef,
}

/// One value of an enum type.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnumValueDescriptor {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// The kind of a type or type-ref wrapper.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TypeKind {
    Scalar,
    Object,
    Interface,
    Union,
    Enum,
    InputObject,
    List,
    NonNull,
}

/// A possibly-wrapped reference to a named type. `of_type` is present for
/// NON_NULL and LIST wrappers; unwrapping always terminates in a named kind.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeRef {
    pub kind: TypeKind,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub of_type: Option<Box<TypeRef>>,
}

impl TypeRef {
    /// Strip NON_NULL/LIST wrappers down to the named type ref.
    pub fn unwrapped(&self) -> &TypeRef {
        let mut current = self;
        while matches!(current.kind, TypeKind::NonNull | TypeKind::List) {
            match &current.of_type {
                Some(inner) => current = inner,
                None => break,
            }
        }
        current
    }

    /// The innermost named type, if the chain is well formed.
    pub fn named_type(&self) -> Option<&str> {
        self.unwrapped().name.as_deref()
    }

    /// Whether this ref ultimately names an enum type.
    pub fn is_enum(&self) -> bool {
        self.unwrapped().kind == TypeKind::Enum
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.kind, &self.of_type) {
            (TypeKind::NonNull, Some(inner)) => write!(f, "{inner}!"),
            (TypeKind::List, Some(inner)) => write!(f, "[{inner}]"),
            // A wrapper missing its inner type is malformed; render what we can.
            (TypeKind::NonNull, None) => write!(f, "{UNKNOWN_TYPE}!"),
            (TypeKind::List, None) => write!(f, "[{UNKNOWN_TYPE}]"),
            _ => write!(f, "{}", self.name.as_deref().unwrap_or(UNKNOWN_TYPE)),
        }
    }
}

fn root_type_name<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    struct RootType {
        name: Option<String>,
    }
    let root: Option<RootType> = Option::deserialize(deserializer)?;
    Ok(root.and_then(|root| root.name))
}
