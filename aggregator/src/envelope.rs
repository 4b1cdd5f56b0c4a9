use serde::Serialize;
use serde_json::Value;

use crate::error_report::ErrorBody;
use crate::paginate::Page;
use crate::relation::Aggregation;

/// Body of every JSON response, discriminated by its `type` field.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "UPPERCASE")]
pub enum Envelope {
    Pagination(Page),
    Aggregation(Aggregation),
    Filter { data: Vec<Value> },
    Error(ErrorBody),
}
