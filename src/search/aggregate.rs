//! Aggregator
//! 結果ページに対するファセット集計

use serde::{Deserialize, Serialize};

use crate::models::Listing;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceRange {
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Aggregations {
    pub categories: Vec<String>,
    pub locations: Vec<String>,
    /// 空ページでは None（JSON では null）。空集合の min/max を数値にしない。
    pub price_range: Option<PriceRange>,
}

/// ページ内の listings からファセット集計を行う。
/// カテゴリ・ロケーションは空でない distinct 値をソートして返す。
pub fn aggregate(listings: &[Listing]) -> Aggregations {
    Aggregations {
        categories: distinct(listings.iter().map(|l| l.category.as_deref())),
        locations: distinct(listings.iter().map(|l| l.location.as_deref())),
        price_range: listings.iter().map(|l| l.price).fold(None, |acc, price| {
            Some(match acc {
                None => PriceRange {
                    min: price,
                    max: price,
                },
                Some(range) => PriceRange {
                    min: range.min.min(price),
                    max: range.max.max(price),
                },
            })
        }),
    }
}

fn distinct<'a>(values: impl Iterator<Item = Option<&'a str>>) -> Vec<String> {
    let mut out: Vec<String> = values
        .flatten()
        .filter(|v| !v.is_empty())
        .map(String::from)
        .collect();
    out.sort();
    out.dedup();
    out
}
