//! Related-product suggestions
//!
//! A static lookup table, independent of the query pipeline: the first key
//! contained in the lower-cased product name wins.

/// Related-product recommender
#[derive(Debug, Clone)]
pub struct Recommender {
    table: Vec<(String, Vec<String>)>,
}

impl Recommender {
    /// Recommender over a custom table, checked in order
    pub fn new(table: Vec<(String, Vec<String>)>) -> Self {
        let table = table
            .into_iter()
            .map(|(key, related)| (key.to_lowercase(), related))
            .collect();
        Self { table }
    }

    /// Products commonly bought together with `product`
    pub fn suggest(&self, product: &str) -> Vec<String> {
        let product = product.trim().to_lowercase();
        if product.is_empty() {
            return Vec::new();
        }

        self.table
            .iter()
            .find(|(key, _)| product.contains(key.as_str()))
            .map(|(_, related)| related.clone())
            .unwrap_or_default()
    }
}

impl Default for Recommender {
    fn default() -> Self {
        Self::new(vec![
            (
                "sữa".to_string(),
                vec!["bánh quy".to_string(), "socola".to_string()],
            ),
            (
                "trứng".to_string(),
                vec!["mì".to_string(), "dầu ăn".to_string()],
            ),
        ])
    }
}
