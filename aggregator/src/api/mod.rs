//! Handlers for configured routes.

use std::sync::Arc;

use crate::config::{RouteAction, SourceConfig};
use crate::fetch::Fetch;
use crate::handler::Handler;
use crate::predicate::FieldPath;
use crate::relation::{Relation, Source};

pub mod aggregation;
pub mod filter;
pub mod pagination;

pub use aggregation::AggregateHandler;
pub use filter::FilterHandler;
pub use pagination::PaginateHandler;

/// Builds the handler for a configured route action.
pub fn build_handler(action: &RouteAction, fetcher: Arc<dyn Fetch>) -> Arc<dyn Handler> {
    match action {
        RouteAction::Paginate {
            source,
            default_size,
        } => Arc::new(PaginateHandler::new(
            to_source(source),
            *default_size,
            fetcher,
        )),
        RouteAction::Aggregate {
            parent,
            child,
            foreign_key,
            id,
        } => Arc::new(AggregateHandler::new(
            Relation::new(to_source(parent), to_source(child), foreign_key, fetcher),
            id.clone(),
        )),
        RouteAction::Filter {
            parent,
            child,
            foreign_key,
            field,
            value,
        } => Arc::new(FilterHandler::new(
            Relation::new(to_source(parent), to_source(child), foreign_key, fetcher),
            FieldPath::parse(field),
            value.clone(),
        )),
    }
}

fn to_source(config: &SourceConfig) -> Source {
    Source::new(config.name.clone(), config.url.clone())
}
