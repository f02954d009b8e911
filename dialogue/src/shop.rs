//! Product search for the shopper persona.

use std::collections::HashSet;
use std::sync::OnceLock;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{DialogueError, DialogueResult};

/// Maximum number of products shown in one reply
pub const MAX_PRODUCTS: usize = 6;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub rating: f64,
    pub image_url: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prime: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reviews: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShopData {
    pub query: String,
    pub products: Vec<Product>,
    pub total_results: usize,
    pub suggested_filters: Vec<String>,
}

/// Catalog the shopper persona searches
#[async_trait]
pub trait ProductSearch: Send + Sync {
    async fn search(&self, query: &str) -> DialogueResult<Vec<Product>>;
}

/// Searches a JSON endpoint answering `GET {url}?q=<query>` with a list of products
#[derive(Debug, Clone)]
pub struct HttpProductSearch {
    client: reqwest::Client,
    url: String,
}

impl HttpProductSearch {
    pub fn new(url: impl Into<String>, timeout: Option<Duration>) -> DialogueResult<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| DialogueError::ProductSearch(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl ProductSearch for HttpProductSearch {
    async fn search(&self, query: &str) -> DialogueResult<Vec<Product>> {
        debug!(url = %self.url, query = %query, "Searching products");

        let response = self
            .client
            .get(&self.url)
            .query(&[("q", query)])
            .send()
            .await
            .map_err(|e| DialogueError::ProductSearch(format!("Failed to send request: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DialogueError::ProductSearch(format!(
                "Search endpoint returned {}",
                status
            )));
        }

        response
            .json::<Vec<Product>>()
            .await
            .map_err(|e| DialogueError::ProductSearch(format!("Failed to parse products: {}", e)))
    }
}

fn filler_patterns() -> &'static [Regex] {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            r"can you (find|show|search for|look for|get)",
            r"i want to (buy|get|find)",
            r"what are some",
            r"recommend|suggest",
        ]
        .iter()
        .filter_map(|pattern| Regex::new(pattern).ok())
        .collect()
    })
}

/// Strip conversational filler from a shopping request
pub fn extract_query(message: &str) -> String {
    let mut query = message.to_lowercase();
    for pattern in filler_patterns() {
        query = pattern.replace_all(&query, "").into_owned();
    }
    query.trim().to_string()
}

/// Build the reply for a non-empty search result
pub fn summarize(query: &str, products: Vec<Product>) -> ShopData {
    let min_price = products.iter().map(|p| p.price).fold(f64::INFINITY, f64::min);
    let max_price = products.iter().map(|p| p.price).fold(f64::NEG_INFINITY, f64::max);

    let mut seen = HashSet::new();
    let categories: Vec<String> = products
        .iter()
        .filter_map(|p| p.name.split(' ').next())
        .filter(|word| seen.insert(word.to_string()))
        .take(3)
        .map(|word| format!("{} Products", word))
        .collect();

    let mut suggested_filters = vec![
        format!("Under ${}", (min_price + 50.0).floor()),
        format!("${}-{}", min_price.floor(), max_price.ceil()),
        "4.5+ Stars".to_string(),
        "Prime Shipping".to_string(),
    ];
    suggested_filters.extend(categories);

    let total_results = products.len();
    ShopData {
        query: query.to_string(),
        products: products.into_iter().take(MAX_PRODUCTS).collect(),
        total_results,
        suggested_filters,
    }
}

/// Canned catalog used when the search is unavailable
pub fn fallback(message: &str) -> ShopData {
    let products = fallback_products();
    ShopData {
        query: message.to_string(),
        total_results: products.len(),
        products,
        suggested_filters: [
            "Under $200",
            "4.5+ Stars",
            "Prime Shipping",
            "New Arrivals",
            "Apple Products",
            "Samsung Products",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect(),
    }
}

/// Search for the products a message asks for, falling back to the canned catalog
///
/// Never fails: an unconfigured search, an error or an empty result all
/// produce the fallback reply.
pub async fn search_products(search: Option<&dyn ProductSearch>, message: &str) -> ShopData {
    let query = extract_query(message);

    let Some(search) = search else {
        debug!("No product search configured, using fallback catalog");
        return fallback(message);
    };

    match search.search(&query).await {
        Ok(products) if !products.is_empty() => summarize(&query, products),
        Ok(_) => {
            warn!(query = %query, "Product search returned no results");
            fallback(message)
        }
        Err(e) => {
            warn!(error = %e, query = %query, "Product search failed");
            fallback(message)
        }
    }
}

fn fallback_products() -> Vec<Product> {
    let product = |id: &str, name: &str, description: &str, price: f64, rating: f64, reviews: u64, image: &str, url: &str| Product {
        id: id.to_string(),
        name: name.to_string(),
        description: description.to_string(),
        price,
        rating,
        image_url: image.to_string(),
        url: url.to_string(),
        prime: Some(true),
        reviews: Some(reviews),
    };

    vec![
        product(
            "1",
            "Apple AirPods Pro (2nd Generation)",
            "Active Noise Cancelling, Transparency Mode, Spatial Audio with Dynamic Head Tracking, MagSafe Charging Case",
            249.99,
            4.7,
            31250,
            "https://m.media-amazon.com/images/I/61SUj2aKoEL._AC_SL1500_.jpg",
            "https://www.amazon.com/Apple-Generation-Cancelling-Transparency-Personalized/dp/B0BDHWDR12/",
        ),
        product(
            "2",
            "Apple Watch Series 9 [GPS 41mm]",
            "Smart Watch w/Starlight Aluminum Case with Starlight Sport Band. Fitness Tracker, Blood Oxygen & ECG Apps, Always-On Retina Display",
            329.99,
            4.8,
            8420,
            "https://m.media-amazon.com/images/I/71XMTLtZd5L._AC_SL1500_.jpg",
            "https://www.amazon.com/Apple-Watch-Starlight-Aluminum-Starlight/dp/B0CHX5F9KC/",
        ),
        product(
            "3",
            "Anker Power Bank, 737 PowerCore 24K",
            "24,000mAh 140W Battery Pack with Digital Display, 3 Ports, 2-Way Fast Charging for MacBook, iPhone 15/14, Samsung, Dell XPS, Steam Deck",
            149.99,
            4.6,
            2850,
            "https://m.media-amazon.com/images/I/71NQ4Xib0eL._AC_SL1500_.jpg",
            "https://www.amazon.com/Anker-PowerCore-24K-Charger-Display/dp/B09VPHVT2Z/",
        ),
        product(
            "4",
            "JBL Charge 5 - Portable Bluetooth Speaker",
            "IP67 Waterproof and Dustproof, 20 Hours of Playtime, Built-in Powerbank, PartyBoost for Speaker Pairing, Black",
            179.95,
            4.8,
            12150,
            "https://m.media-amazon.com/images/I/71Saccp+fYL._AC_SL1500_.jpg",
            "https://www.amazon.com/JBL-Charge-5-Portable-Bluetooth/dp/B08VDNCZT9/",
        ),
        product(
            "5",
            "Sony WH-1000XM5 Wireless Headphones",
            "Industry Leading Noise Canceling, 30-Hour Battery, Built-in Alexa, Touch Control, Black",
            398.0,
            4.7,
            5823,
            "https://m.media-amazon.com/images/I/61+btxzpfDL._AC_SL1500_.jpg",
            "https://www.amazon.com/Sony-WH-1000XM5-Canceling-Headphones-Hands-Free/dp/B09XS7JWHH/",
        ),
        product(
            "6",
            "Samsung Galaxy Tab S9+ 12.4\"",
            "512GB Android Tablet, Large AMOLED Screen, S Pen, Wi-Fi 6E, Long-Lasting Battery, Graphite",
            1119.99,
            4.8,
            1243,
            "https://m.media-amazon.com/images/I/81TMK-24nkL._AC_SL1500_.jpg",
            "https://www.amazon.com/Samsung-Android-AMOLED-Screen-Graphite/dp/B0C6GDQVH5/",
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(name: &str, price: f64) -> Product {
        Product {
            id: name.to_lowercase(),
            name: name.to_string(),
            description: String::new(),
            price,
            rating: 4.5,
            image_url: String::new(),
            url: String::new(),
            prime: None,
            reviews: None,
        }
    }

    struct FixedSearch(DialogueResult<Vec<Product>>);

    #[async_trait]
    impl ProductSearch for FixedSearch {
        async fn search(&self, _query: &str) -> DialogueResult<Vec<Product>> {
            match &self.0 {
                Ok(products) => Ok(products.clone()),
                Err(e) => Err(DialogueError::ProductSearch(e.to_string())),
            }
        }
    }

    #[test]
    fn test_extract_query() {
        assert_eq!(extract_query("Can you find wireless headphones"), "wireless headphones");
        assert_eq!(extract_query("I want to buy a desk lamp"), "a desk lamp");
        assert_eq!(extract_query("What are some good running shoes?"), "good running shoes?");
        assert_eq!(extract_query("recommend a speaker"), "a speaker");
    }

    #[test]
    fn test_summarize_filters() {
        let products = vec![
            item("Sony Headphones", 99.5),
            item("Bose Headphones", 249.0),
            item("Sony Earbuds", 120.0),
            item("JBL Speaker", 80.25),
            item("Anker Cable", 15.0),
            item("Apple Charger", 19.0),
            item("Belkin Stand", 30.0),
        ];

        let data = summarize("headphones", products);
        assert_eq!(data.products.len(), 6);
        assert_eq!(data.total_results, 7);
        assert_eq!(
            data.suggested_filters,
            vec![
                "Under $65",
                "$15-249",
                "4.5+ Stars",
                "Prime Shipping",
                "Sony Products",
                "Bose Products",
                "JBL Products",
            ]
        );
    }

    #[test]
    fn test_fallback() {
        let data = fallback("Find me gadgets");
        assert_eq!(data.query, "Find me gadgets");
        assert_eq!(data.products.len(), 6);
        assert_eq!(data.total_results, 6);
        assert_eq!(data.suggested_filters[0], "Under $200");
        assert_eq!(data.suggested_filters.len(), 6);
    }

    #[tokio::test]
    async fn test_search_without_collaborator() {
        let data = search_products(None, "buy headphones").await;
        assert_eq!(data, fallback("buy headphones"));
    }

    #[tokio::test]
    async fn test_search_failure_and_empty_result_fall_back() {
        let failing = FixedSearch(Err(DialogueError::ProductSearch("down".to_string())));
        let data = search_products(Some(&failing), "buy a lamp").await;
        assert_eq!(data.query, "buy a lamp");
        assert_eq!(data.products[0].name, "Apple AirPods Pro (2nd Generation)");

        let empty = FixedSearch(Ok(vec![]));
        let data = search_products(Some(&empty), "buy a lamp").await;
        assert_eq!(data.total_results, 6);
    }

    #[tokio::test]
    async fn test_search_success() {
        let search = FixedSearch(Ok(vec![item("Lamp Deluxe", 40.0)]));
        let data = search_products(Some(&search), "Can you find a lamp").await;
        assert_eq!(data.query, "a lamp");
        assert_eq!(data.suggested_filters[0], "Under $90");
        assert_eq!(data.suggested_filters[1], "$40-40");
    }

    #[test]
    fn test_product_wire_format() {
        let json = serde_json::to_value(item("Lamp", 10.0)).unwrap();
        assert!(json.get("imageUrl").is_some());
        assert!(json.get("prime").is_none());
    }
}
