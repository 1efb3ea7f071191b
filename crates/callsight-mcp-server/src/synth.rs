//! GraphQL query synthesis: condition composition, keyword search, named
//! templates, and the read-only guard applied to caller-supplied queries.

pub mod condition;
pub mod search;
pub mod templates;

use crate::errors::QueryError;

/// Reject caller-supplied operations that look like mutations, before any
/// network call. This is a textual guard, not a parse: it is deliberately
/// conservative and may reject a query that merely mentions the word
/// `mutation` in an unusual position. Known limitation.
pub fn reject_mutations(raw_query: &str) -> Result<(), QueryError> {
    let normalized = raw_query.trim().to_lowercase();
    if normalized.starts_with("mutation")
        || normalized.contains("mutation {")
        || normalized.contains("mutation{")
    {
        return Err(QueryError::MutationRejected);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::keyword_start("mutation { delete_extraction { affected_rows } }")]
    #[case::named("mutation RemoveAll { delete_extraction { affected_rows } }")]
    #[case::leading_whitespace("  \n MUTATION { x }")]
    #[case::inline("query A { x } mutation { y }")]
    fn mutations_are_rejected(#[case] raw: &str) {
        assert!(matches!(
            reject_mutations(raw),
            Err(QueryError::MutationRejected)
        ));
    }

    #[rstest]
    #[case::plain_query("query A { extraction { id } }")]
    #[case::anonymous("{ extraction { id } }")]
    fn queries_pass(#[case] raw: &str) {
        assert!(reject_mutations(raw).is_ok());
    }

    // Documented limitation of the textual guard: a query that merely
    // mentions the word in a matching position is rejected too.
    #[test]
    fn guard_is_conservative_about_mentions() {
        assert!(reject_mutations(r#"query A { log(note: "mutation { }") { id } }"#).is_err());
    }
}
