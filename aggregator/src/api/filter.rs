use async_trait::async_trait;

use crate::config::ParamRule;
use crate::envelope::Envelope;
use crate::errors::{AggregatorError, Result};
use crate::handler::{Handler, Query};
use crate::predicate::{FieldPath, FieldPredicate};
use crate::relation::Relation;

/// Returns the children of every parent whose `field` contains the requested
/// text.
pub struct FilterHandler {
    relation: Relation,
    field: FieldPath,
    value: ParamRule,
}

impl FilterHandler {
    pub fn new(relation: Relation, field: FieldPath, value: ParamRule) -> Self {
        Self {
            relation,
            field,
            value,
        }
    }

    fn predicate(&self, query: &Query) -> Result<FieldPredicate> {
        match self.value.resolve(query) {
            Some(needle) if !needle.is_empty() => {
                Ok(FieldPredicate::new(self.field.clone(), needle))
            }
            _ => {
                let param = self.value.query_param().unwrap_or("value");
                Err(AggregatorError::validation(format!(
                    "Need something like ?{param}=text, \
                     where text is looked up in the {} records.",
                    self.relation.parent().name
                )))
            }
        }
    }
}

#[async_trait]
impl Handler for FilterHandler {
    fn name(&self) -> &'static str {
        "filter"
    }

    async fn handle(&self, query: &Query) -> Result<Envelope> {
        let predicate = self.predicate(query)?;
        let data = self
            .relation
            .resolve_by_predicate(|record| predicate.matches(record))
            .await?;
        Ok(Envelope::Filter { data })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutils::{MockFetcher, mock_posts, mock_users, refused, source};
    use serde_json::json;
    use std::sync::Arc;

    fn handler(fetcher: Arc<MockFetcher>, value: ParamRule) -> FilterHandler {
        let relation = Relation::new(source("users"), source("posts"), "userId", fetcher);
        FilterHandler::new(relation, FieldPath::parse("company.name"), value)
    }

    fn healthy() -> Arc<MockFetcher> {
        Arc::new(
            MockFetcher::new()
                .with_response(&source("users"), mock_users())
                .with_response(&source("posts"), mock_posts()),
        )
    }

    fn by_query() -> ParamRule {
        ParamRule::Query {
            query: "companyName".to_string(),
        }
    }

    fn query(company: &str) -> Query {
        Query::from_pairs([("companyName".to_string(), company.to_string())])
    }

    #[tokio::test]
    async fn test_children_of_matching_parents() {
        let handler = handler(healthy(), by_query());

        let envelope = handler.handle(&query("Romaguera")).await.unwrap();
        let body = serde_json::to_value(envelope).unwrap();
        assert_eq!(body["type"], "FILTER");
        assert_eq!(
            body["data"],
            json!([
                {"userId": 1, "id": 8, "title": "dolorem dolore est ipsam", "body": "dignissimos aperiam"},
                {"userId": 1, "id": 9, "title": "nesciunt iure omnis", "body": "consectetur animi"}
            ])
        );
    }

    #[tokio::test]
    async fn test_fixed_value() {
        let handler = handler(
            healthy(),
            ParamRule::Fixed {
                fixed: "Deckow".to_string(),
            },
        );

        match handler.handle(&Query::default()).await.unwrap() {
            Envelope::Filter { data } => {
                let ids: Vec<_> = data.iter().map(|post| post["id"].clone()).collect();
                assert_eq!(ids, vec![json!(11), json!(12)]);
            }
            other => panic!("unexpected envelope {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_missing_or_empty_value_skips_fetch() {
        let fetcher = healthy();
        let handler = handler(fetcher.clone(), by_query());

        for query in [Query::default(), query("")] {
            let result = handler.handle(&query).await;
            match result {
                Err(AggregatorError::Validation { solution }) => {
                    assert!(solution.starts_with("Need something like ?companyName="));
                }
                other => panic!("unexpected result {other:?}"),
            }
        }
        assert_eq!(fetcher.calls(), 0);
    }

    #[tokio::test]
    async fn test_no_match_hides_child_failure() {
        let fetcher = Arc::new(
            MockFetcher::new()
                .with_response(&source("users"), mock_users())
                .with_failure(&source("posts"), refused()),
        );
        let handler = handler(fetcher, by_query());

        match handler.handle(&query("Initech")).await.unwrap() {
            Envelope::Filter { data } => assert!(data.is_empty()),
            other => panic!("unexpected envelope {other:?}"),
        }
    }
}
