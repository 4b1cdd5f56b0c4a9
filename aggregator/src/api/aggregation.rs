use async_trait::async_trait;

use crate::config::ParamRule;
use crate::envelope::Envelope;
use crate::errors::Result;
use crate::handler::{Handler, Query};
use crate::relation::Relation;

/// Returns a parent record with its children, keyed by an id taken from the
/// request or fixed in configuration.
pub struct AggregateHandler {
    relation: Relation,
    id: ParamRule,
}

impl AggregateHandler {
    pub fn new(relation: Relation, id: ParamRule) -> Self {
        Self { relation, id }
    }
}

#[async_trait]
impl Handler for AggregateHandler {
    fn name(&self) -> &'static str {
        "aggregate"
    }

    async fn handle(&self, query: &Query) -> Result<Envelope> {
        let aggregation = self.relation.resolve_one(self.id.resolve(query)).await?;
        Ok(Envelope::Aggregation(aggregation))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::AggregatorError;
    use crate::testutils::{MockFetcher, mock_posts, mock_users, source};
    use serde_json::json;
    use std::sync::Arc;

    fn handler(id: ParamRule) -> (AggregateHandler, Arc<MockFetcher>) {
        let fetcher = Arc::new(
            MockFetcher::new()
                .with_response(&source("users"), mock_users())
                .with_response(&source("posts"), mock_posts()),
        );
        let relation = Relation::new(source("users"), source("posts"), "userId", fetcher.clone());
        (AggregateHandler::new(relation, id), fetcher)
    }

    fn by_query() -> ParamRule {
        ParamRule::Query {
            query: "userId".to_string(),
        }
    }

    #[tokio::test]
    async fn test_id_from_query() {
        let (handler, _) = handler(by_query());
        let query = Query::from_pairs([("userId".to_string(), "2".to_string())]);

        let body = serde_json::to_value(handler.handle(&query).await.unwrap()).unwrap();
        assert_eq!(body["type"], "AGGREGATION");
        assert_eq!(body["parent"]["username"], "Antonette");
        assert_eq!(
            body["children"],
            json!([
                {"id": 11, "title": "et ea vero quia", "body": "delectus reiciendis"},
                {"id": 12, "title": "in quibusdam tempore", "body": "itaque id aut magnam"}
            ])
        );
    }

    #[tokio::test]
    async fn test_fixed_id_ignores_query() {
        let (handler, _) = handler(ParamRule::Fixed {
            fixed: "1".to_string(),
        });
        let query = Query::from_pairs([("userId".to_string(), "2".to_string())]);

        match handler.handle(&query).await.unwrap() {
            Envelope::Aggregation(aggregation) => {
                assert_eq!(aggregation.parent["id"], 1);
                assert_eq!(aggregation.children.len(), 2);
            }
            other => panic!("unexpected envelope {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_missing_id_skips_fetch() {
        let (handler, fetcher) = handler(by_query());

        let result = handler.handle(&Query::default()).await;
        assert!(matches!(result, Err(AggregatorError::Validation { .. })));
        assert_eq!(fetcher.calls(), 0);
    }
}
