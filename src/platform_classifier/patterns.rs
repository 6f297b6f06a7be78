//! Marker tables. Every marker is lower-case; documents are lower-cased
//! before matching.

use super::Platform;

/// A platform that is detected when any one of its markers is present
pub struct MarkerRule {
    pub platform: Platform,
    pub markers: &'static [&'static str],
    pub evidence: &'static str,
}

pub static MARKER_RULES: [MarkerRule; 6] = [
    MarkerRule {
        platform: Platform::Gomag,
        markers: &["gomag"],
        evidence: "Found substring: gomag",
    },
    MarkerRule {
        platform: Platform::MerchantPro,
        markers: &[
            "merchantpro",
            "merchant pro",
            "powered by merchant",
            "made with merchant",
        ],
        evidence: "MerchantPro footer text detected",
    },
    MarkerRule {
        platform: Platform::Shopify,
        markers: &[
            "cdn.shopify.com",
            "myshopify.com",
            "shopify-checkout",
            "shopify-pay",
            "shopify-features",
            "shopify.buy",
            "shopify.theme",
            "shopify.routes",
            "window.shopify",
            "shopifyanalytics",
            "shopifycdn",
            "shopify-section",
        ],
        evidence: "Shopify technical markers detected",
    },
    MarkerRule {
        platform: Platform::WooCommerce,
        markers: &[
            "wp-content/plugins/woocommerce",
            "wp-content/uploads/woocommerce",
            "woocommerce-no-js",
            "wc-ajax",
            "woocommerce_params",
            "wc_add_to_cart_params",
            "woocommerce-cart",
            "woocommerce-checkout",
            "woocommerce-product-gallery",
        ],
        evidence: "WooCommerce technical markers detected",
    },
    MarkerRule {
        platform: Platform::OpenCart,
        markers: &[
            "index.php?route=",
            "route=common/home",
            "route=product/product",
            "route=checkout/cart",
            "catalog/view/theme/",
            "catalog/view/javascript/",
        ],
        evidence: "OpenCart route/catalog markers detected",
    },
    MarkerRule {
        platform: Platform::PrestaShop,
        markers: &[
            "data-prestashop",
            "var prestashop =",
            "prestashop.emit",
            "prestashop-static",
            "/modules/ps_",
            "id=\"prestashop\"",
        ],
        evidence: "PrestaShop specific markers detected",
    },
];

/// Markers of which at least one must be present before Magento can be declared
pub const MAGENTO_EXCLUSIVE_MARKERS: &[&str] = &[
    "data-mage-init",
    "text/x-magento-init",
    "/static/version",
    "/static/frontend/",
    "/static/adminhtml/",
    "magento_",
    "mage-cache-sessid",
    "name=\"form_key\"",
    "form_key",
];

/// Scored Magento signals. Each group is worth one point when any of its
/// alternatives is present.
pub const MAGENTO_SCORED_MARKERS: &[&[&str]] = &[
    &["data-mage-init"],
    &["text/x-magento-init"],
    &["/static/version"],
    &["/static/frontend/"],
    &["/static/adminhtml/"],
    &["magento_"],
    &["mage-cache-sessid"],
    &["name=\"form_key\"", "form_key"],
];

/// Seen on Magento storefronts but also on plenty of other RequireJS sites.
/// Recognised, worth zero points.
// TODO: revisit once there is a labelled sample set to tune the Magento score against.
pub const MAGENTO_WEAK_MARKERS: &[&str] = &["requirejs/require"];

pub const MAGENTO_MIN_SCORE: usize = 2;
