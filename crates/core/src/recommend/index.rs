//! Keyword → product lookup for festival and weather matching.

use std::collections::{BTreeSet, HashMap};

/// Inverted index from lower-cased keyword to the positions of the products
/// whose lower-cased name contains it. Built once per invocation over the
/// reference keywords, so each rule avoids a full product scan.
#[derive(Clone, Debug, Default)]
pub struct KeywordIndex {
    products: Vec<String>,
    lowered: Vec<String>,
    postings: HashMap<String, Vec<usize>>,
}

impl KeywordIndex {
    pub fn build<'a, P, K>(products: P, keywords: K) -> Self
    where
        P: IntoIterator<Item = &'a str>,
        K: IntoIterator<Item = &'a str>,
    {
        let products: Vec<String> = products.into_iter().map(str::to_owned).collect();
        let lowered: Vec<String> = products.iter().map(|product| product.to_lowercase()).collect();
        let mut postings = HashMap::new();

        for keyword in keywords {
            let needle = keyword.to_lowercase();
            if needle.is_empty() || postings.contains_key(&needle) {
                continue;
            }
            let hits = positions_containing(&lowered, &needle);
            postings.insert(needle, hits);
        }

        Self { products, lowered, postings }
    }

    /// Distinct products matching any keyword, in product order.
    pub fn matching<'k, K>(&self, keywords: K) -> Vec<&str>
    where
        K: IntoIterator<Item = &'k str>,
    {
        let mut hits = BTreeSet::new();
        for keyword in keywords {
            let needle = keyword.to_lowercase();
            if needle.is_empty() {
                continue;
            }
            match self.postings.get(&needle) {
                Some(positions) => hits.extend(positions.iter().copied()),
                None => hits.extend(positions_containing(&self.lowered, &needle)),
            }
        }
        hits.into_iter().map(|position| self.products[position].as_str()).collect()
    }
}

fn positions_containing(lowered: &[String], needle: &str) -> Vec<usize> {
    lowered
        .iter()
        .enumerate()
        .filter(|(_, product)| product.contains(needle))
        .map(|(position, _)| position)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::KeywordIndex;

    #[test]
    fn matches_case_insensitive_substrings_in_product_order() {
        let index = KeywordIndex::build(
            ["Clay Diya", "Umbrella", "Rangoli Colors", "diya oil"],
            ["diya", "rangoli"],
        );

        assert_eq!(index.matching(["DIYA", "Rangoli"]), vec!["Clay Diya", "Rangoli Colors", "diya oil"]);
    }

    #[test]
    fn unindexed_keywords_still_match() {
        let index = KeywordIndex::build(["Umbrella", "Raincoat"], ["sweater"]);

        assert_eq!(index.matching(["rain", "sweater"]), vec!["Raincoat"]);
        assert!(index.matching([""]).is_empty());
    }
}
