use serde::Deserialize;

/// How a shape's endpoint takes its id bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Bounds {
    /// `id.lt` / `id.ge` filters, `sort.desc=id`
    IdFilters,
    /// `lastId` paging with `sort=1`; the lower limit is applied client side
    LastId,
}

/// One of the disjoint queries a ledger page is assembled from.
#[derive(Debug, Clone)]
pub(crate) struct QueryShape {
    pub name: &'static str,
    pub path: String,
    filters: Vec<(&'static str, String)>,
    bounds: Bounds,
}

impl QueryShape {
    /// Every shape needed to cover the history of `account`: native
    /// transfers, FA1.2 and FA2 token receipts, and everything the account
    /// sent, delegated or originated.
    pub fn all(account: &str) -> Vec<Self> {
        vec![
            Self {
                name: "native",
                path: "operations/transactions".into(),
                filters: vec![
                    ("anyof.sender.target", account.into()),
                    ("amount.gt", "0".into()),
                ],
                bounds: Bounds::IdFilters,
            },
            Self {
                name: "fa12",
                path: "operations/transactions".into(),
                filters: vec![
                    ("entrypoint", "transfer".into()),
                    ("parameter.to", account.into()),
                ],
                bounds: Bounds::IdFilters,
            },
            Self {
                name: "fa2",
                path: "operations/transactions".into(),
                filters: vec![
                    ("entrypoint", "transfer".into()),
                    ("parameter.[*].txs.[*].to_", account.into()),
                ],
                bounds: Bounds::IdFilters,
            },
            Self {
                name: "other",
                path: format!("accounts/{account}/operations"),
                filters: vec![("type", "transaction,delegation,origination".into())],
                bounds: Bounds::LastId,
            },
        ]
    }

    /// Query params for the newest `limit` records with
    /// `lower <= id < upper`; a missing bound is unbounded.
    pub fn query(
        &self,
        upper: Option<u64>,
        lower: Option<u64>,
        limit: u32,
    ) -> Vec<(&'static str, String)> {
        let mut query = self.filters.clone();
        match self.bounds {
            Bounds::IdFilters => {
                if let Some(upper) = upper {
                    query.push(("id.lt", upper.to_string()));
                }
                if let Some(lower) = lower {
                    query.push(("id.ge", lower.to_string()));
                }
                query.push(("sort.desc", "id".into()));
            }
            Bounds::LastId => {
                if let Some(upper) = upper {
                    query.push(("lastId", upper.to_string()));
                }
                query.push(("sort", "1".into()));
            }
        }
        query.push(("limit", limit.to_string()));
        query
    }

}

/// The part of a listed operation needed to assemble a page
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub(crate) struct ShapeRecord {
    pub id: u64,
    pub hash: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds_follow_the_endpoint_style() {
        let shapes = QueryShape::all("tz1abc");

        let native = shapes[0].query(Some(900), Some(100), 10);
        assert!(native.contains(&("id.lt", "900".into())));
        assert!(native.contains(&("id.ge", "100".into())));
        assert!(native.contains(&("sort.desc", "id".into())));

        let other = shapes[3].query(Some(900), Some(100), 10);
        assert_eq!(shapes[3].path, "accounts/tz1abc/operations");
        assert!(other.contains(&("lastId", "900".into())));
        assert!(!other.iter().any(|(k, _)| *k == "id.ge"));

        let head = shapes[0].query(None, None, 10);
        assert!(!head.iter().any(|(k, _)| *k == "id.lt"));
    }
}
