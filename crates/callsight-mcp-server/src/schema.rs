//! Remote schema discovery: introspection client, snapshot data model, and
//! the TTL cache that owns the current snapshot.

mod cache;
mod introspection;
mod snapshot;

pub use cache::SchemaCache;
pub use introspection::{IntrospectionClient, SchemaFetcher};
pub use snapshot::{EnumValueDescriptor, FieldDescriptor, SchemaSnapshot, TypeDescriptor, TypeKind, TypeRef};

/// How long a schema snapshot is served before the next reader triggers a
/// refetch.
pub const SCHEMA_TTL: std::time::Duration = std::time::Duration::from_secs(30 * 60);
