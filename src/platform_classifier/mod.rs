pub mod patterns;
pub mod classifier;

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

pub use classifier::classify;

/// E-commerce platforms the classifier knows how to recognise
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Platform {
    Gomag,
    MerchantPro,
    Shopify,
    WooCommerce,
    Magento,
    OpenCart,
    PrestaShop,
}

impl Platform {
    pub const ALL: [Platform; 7] = [
        Platform::Gomag,
        Platform::MerchantPro,
        Platform::Shopify,
        Platform::WooCommerce,
        Platform::Magento,
        Platform::OpenCart,
        Platform::PrestaShop,
    ];

    /// Canonical name, as used in JSON output and the CSV `platforms` column
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Gomag => "GOMAG",
            Platform::MerchantPro => "MERCHANTPRO",
            Platform::Shopify => "SHOPIFY",
            Platform::WooCommerce => "WOOCOMMERCE",
            Platform::Magento => "MAGENTO",
            Platform::OpenCart => "OPENCART",
            Platform::PrestaShop => "PRESTASHOP",
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Outcome of classifying one HTML document.
///
/// `evidence` only ever holds keys that are also in `platforms`; both are
/// empty when nothing matched. Built through [`classify`], read-only afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Classification {
    platforms: BTreeSet<Platform>,
    evidence: BTreeMap<Platform, Vec<String>>,
}

impl Classification {
    pub(crate) fn hit(&mut self, platform: Platform, why: impl Into<String>) {
        self.platforms.insert(platform);
        self.evidence.entry(platform).or_default().push(why.into());
    }

    pub fn platforms(&self) -> &BTreeSet<Platform> {
        &self.platforms
    }

    pub fn evidence(&self) -> &BTreeMap<Platform, Vec<String>> {
        &self.evidence
    }

    pub fn is_empty(&self) -> bool {
        self.platforms.is_empty()
    }

    pub fn into_parts(self) -> (BTreeSet<Platform>, BTreeMap<Platform, Vec<String>>) {
        (self.platforms, self.evidence)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_platform_serializes_to_canonical_name() {
        for platform in Platform::ALL {
            let json = serde_json::to_string(&platform).unwrap();
            assert_eq!(json, format!("\"{}\"", platform.as_str()));
        }
    }

    #[test]
    fn test_hit_keeps_evidence_keys_in_platform_set() {
        let mut classification = Classification::default();
        classification.hit(Platform::Shopify, "first");
        classification.hit(Platform::Shopify, "second");

        assert_eq!(classification.platforms().len(), 1);
        assert_eq!(classification.evidence()[&Platform::Shopify], vec!["first", "second"]);
        assert!(classification.evidence().keys().all(|p| classification.platforms().contains(p)));
    }
}
