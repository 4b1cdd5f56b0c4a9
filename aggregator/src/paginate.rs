//! Local pagination of a fully fetched collection.
//!
//! `offset` is a page index, not a record index: `size=2&offset=5` returns
//! records 10 and 11 (zero-based).

use serde::Serialize;
use serde_json::Value;

use crate::errors::{AggregatorError, Result};
use crate::handler::Query;
use crate::payload::Payload;

pub const DEFAULT_PAGE_SIZE: usize = 10;

const PAGINATION_SOLUTION: &str = "Need something like ?size=10&offset=0, \
     where offset is the page number and size is the number of items per page.";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageRequest {
    pub size: usize,
    pub offset: usize,
}

impl PageRequest {
    /// Reads `size` and `offset` from the query string.
    ///
    /// Missing parameters fall back to `default_size` and page 0. Anything that
    /// is not a non-negative integer, or a size of 0, is rejected.
    pub fn from_query(query: &Query, default_size: usize) -> Result<Self> {
        let size = parse_or(query.get("size"), default_size);
        let offset = parse_or(query.get("offset"), 0);

        match (size, offset) {
            (Some(size), Some(offset)) if size >= 1 => Ok(PageRequest { size, offset }),
            _ => Err(AggregatorError::validation(PAGINATION_SOLUTION)),
        }
    }
}

fn parse_or(raw: Option<&str>, default: usize) -> Option<usize> {
    match raw {
        None => Some(default),
        Some(value) => value.trim().parse().ok(),
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Page {
    pub data: Value,
    pub remaining: usize,
}

/// Cuts one page out of `payload`.
///
/// Opaque payloads are passed through unchanged with nothing remaining.
pub fn paginate(payload: Payload, page: PageRequest) -> Page {
    let items = match payload {
        Payload::Sequence(items) | Payload::Wrapped { items, .. } => items,
        Payload::Opaque(value) => {
            return Page {
                data: value,
                remaining: 0,
            };
        }
    };

    let start = page.offset.saturating_mul(page.size);
    let end = start.saturating_add(page.size);
    let remaining = items.len().saturating_sub(end);
    let data = items.into_iter().skip(start).take(page.size).collect();

    Page {
        data: Value::Array(data),
        remaining,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn numbers(n: usize) -> Payload {
        Payload::Sequence((1..=n).map(|i| json!(i)).collect())
    }

    fn query(pairs: &[(&str, &str)]) -> Query {
        Query::from_pairs(pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())))
    }

    #[test]
    fn test_offset_is_a_page_index() {
        let page = paginate(numbers(20), PageRequest { size: 2, offset: 5 });
        assert_eq!(page.data, json!([11, 12]));
        assert_eq!(page.remaining, 8);
    }

    #[test]
    fn test_page_length_and_remaining() {
        for n in 0..12usize {
            for size in 1..5usize {
                for offset in 0..6usize {
                    let page = paginate(numbers(n), PageRequest { size, offset });
                    let expected_len = size.min(n.saturating_sub(offset * size));
                    let expected_remaining = n.saturating_sub(offset * size + size);

                    assert_eq!(
                        page.data.as_array().unwrap().len(),
                        expected_len,
                        "n={n} size={size} offset={offset}"
                    );
                    assert_eq!(page.remaining, expected_remaining);
                }
            }
        }
    }

    #[test]
    fn test_wrapped_payload_is_unwrapped() {
        let payload = Payload::from(json!({"data": [1, 2, 3, 4, 5]}));
        let page = paginate(payload, PageRequest { size: 2, offset: 1 });
        assert_eq!(page.data, json!([3, 4]));
        assert_eq!(page.remaining, 1);
    }

    #[test]
    fn test_opaque_payload_passes_through() {
        let payload = Payload::from(json!({"foo": "bar"}));
        let page = paginate(payload, PageRequest { size: 10, offset: 3 });
        assert_eq!(page.data, json!({"foo": "bar"}));
        assert_eq!(page.remaining, 0);
    }

    #[test]
    fn test_huge_offset_does_not_overflow() {
        let page = paginate(
            numbers(3),
            PageRequest {
                size: usize::MAX,
                offset: usize::MAX,
            },
        );
        assert_eq!(page.data, json!([]));
        assert_eq!(page.remaining, 0);
    }

    #[test]
    fn test_page_request_defaults() {
        let page = PageRequest::from_query(&query(&[]), DEFAULT_PAGE_SIZE).unwrap();
        assert_eq!(page, PageRequest { size: 10, offset: 0 });

        let page = PageRequest::from_query(&query(&[("size", "2"), ("offset", "5")]), 10).unwrap();
        assert_eq!(page, PageRequest { size: 2, offset: 5 });
    }

    #[test]
    fn test_page_request_rejects_malformed_input() {
        for pairs in [
            vec![("size", "invalid")],
            vec![("offset", "invalid")],
            vec![("size", "0")],
            vec![("size", "-1")],
            vec![("offset", "-1")],
            vec![("size", "")],
            vec![("size", "2.5")],
        ] {
            let result = PageRequest::from_query(&query(&pairs), DEFAULT_PAGE_SIZE);
            assert!(
                matches!(result, Err(AggregatorError::Validation { .. })),
                "{pairs:?} should be rejected"
            );
        }
    }
}
