//! Read-only introspection queries against the downstream endpoint.

use crate::errors::QueryError;
use crate::graphql::GraphqlClient;
use crate::schema::snapshot::{FieldDescriptor, SchemaSnapshot, TypeDescriptor};
use async_trait::async_trait;
use serde_json::{Value, json};

/// The standard full-schema introspection document. TypeRef is nested seven
/// levels, enough for any wrapper chain a real schema produces.
const INTROSPECTION_QUERY: &str = r#"
query IntrospectionQuery {
  __schema {
    queryType { name }
    mutationType { name }
    types {
      ...FullType
    }
  }
}

fragment FullType on __Type {
  kind
  name
  description
  fields(includeDeprecated: true) {
    name
    description
    type { ...TypeRef }
  }
  inputFields {
    name
    description
    type { ...TypeRef }
  }
  enumValues(includeDeprecated: true) {
    name
    description
  }
}

fragment TypeRef on __Type {
  kind
  name
  ofType {
    kind
    name
    ofType {
      kind
      name
      ofType {
        kind
        name
        ofType {
          kind
          name
          ofType {
            kind
            name
            ofType {
              kind
              name
            }
          }
        }
      }
    }
  }
}
"#;

/// Single-type introspection, used for per-type field lookups.
const TYPE_FIELDS_QUERY: &str = r#"
query TypeFields($name: String!) {
  __type(name: $name) {
    kind
    name
    description
    fields(includeDeprecated: true) {
      name
      description
      type { ...TypeRef }
    }
    inputFields {
      name
      description
      type { ...TypeRef }
    }
    enumValues(includeDeprecated: true) {
      name
      description
    }
  }
}

fragment TypeRef on __Type {
  kind
  name
  ofType {
    kind
    name
    ofType {
      kind
      name
      ofType {
        kind
        name
        ofType {
          kind
          name
        }
      }
    }
  }
}
"#;

/// Source of schema snapshots, abstracted so the cache can be tested with a
/// fake downstream.
#[async_trait]
pub trait SchemaFetcher: Send + Sync {
    async fn fetch_schema(&self) -> Result<SchemaSnapshot, QueryError>;
}

/// Introspection client over the shared GraphQL client.
#[derive(Clone)]
pub struct IntrospectionClient {
    client: GraphqlClient,
}

impl IntrospectionClient {
    pub fn new(client: GraphqlClient) -> Self {
        Self { client }
    }

    /// Fetch the normalized field view of one type: object fields, then
    /// input fields, then enum values as field-like entries. An unknown
    /// type is an empty result, not an error.
    pub async fn fetch_type_fields(
        &self,
        type_name: &str,
    ) -> Result<Vec<FieldDescriptor>, QueryError> {
        let response = self
            .client
            .execute(TYPE_FIELDS_QUERY, &json!({ "name": type_name }))
            .await?;
        fail_on_graphql_errors(&response)?;

        let type_value = response
            .get("data")
            .and_then(|data| data.get("__type"))
            .cloned()
            .unwrap_or(Value::Null);
        if type_value.is_null() {
            return Ok(Vec::new());
        }

        let descriptor: TypeDescriptor = serde_json::from_value(type_value)
            .map_err(|e| QueryError::MalformedIntrospection(e.to_string()))?;
        Ok(descriptor.normalized_fields())
    }
}

#[async_trait]
impl SchemaFetcher for IntrospectionClient {
    async fn fetch_schema(&self) -> Result<SchemaSnapshot, QueryError> {
        let response = self.client.execute(INTROSPECTION_QUERY, &Value::Null).await?;
        fail_on_graphql_errors(&response)?;

        let schema_value = response
            .get("data")
            .and_then(|data| data.get("__schema"))
            .cloned()
            .ok_or_else(|| {
                QueryError::MalformedIntrospection("response has no __schema".to_string())
            })?;
        serde_json::from_value(schema_value)
            .map_err(|e| QueryError::MalformedIntrospection(e.to_string()))
    }
}

/// Introspection is infrastructure: a GraphQL-level error here means the
/// downstream is not usable, so it surfaces as unavailability.
fn fail_on_graphql_errors(response: &Value) -> Result<(), QueryError> {
    match crate::graphql::first_error_message(response) {
        Some(message) => Err(QueryError::DownstreamUnavailable(message.to_string())),
        None => Ok(()),
    }
}
