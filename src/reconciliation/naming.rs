//! Name heuristics for receipt lines: stripping size/flavor/color suffixes,
//! guessing what kind of variant a line is, and loose name matching.

use crate::entities::product_variant::VariantType;
use once_cell::sync::Lazy;
use regex::Regex;

const COLORS: &str = "red|blue|green|black|white|yellow|pink|purple|brown|grey|gray|silver|gold|golden|maroon|navy|beige|violet";
const FLAVORS: &str = "vanilla|chocolate|strawberry|mango|orange|lemon|lime|mint|masala|butterscotch|coffee|pineapple|apple|guava|tomato|cardamom|elaichi|rose|kesar|saffron|caramel|honey|ginger|tulsi|jeera|spicy|salted|original|classic";

/// Trailing quantity with a unit: "250ml", "1.5 L", "500 g", "(2kg)", "x6".
static TRAILING_QUANTITY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)[\s\-,(/]*\b\d+(?:\.\d+)?\s*(?:ml|l|ltr|ltrs|litres?|liters?|g|gm|gms|grams?|kg|kgs|mg|oz|lbs?|pcs|pc|pieces|pack|packs|ct|count)\)?\s*$|[\s\-,(/]*\bx\s*\d+\)?\s*$|[\s\-,(/]*\bpack\s+of\s+\d+\)?\s*$",
    )
    .expect("valid quantity regex")
});

static TRAILING_WORD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?i)[\s\-,(/]+(?:{}|{}|small|medium|large|regular|xs|xl|xxl)\)?\s*$",
        COLORS, FLAVORS
    ))
    .expect("valid trailing word regex")
});

static VOLUME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b\d+(?:\.\d+)?\s*(?:ml|l|ltr|ltrs)\b|\b(?:litres?|liters?|millilitres?|milliliters?)\b|\b(?:small|medium|large|regular|xs|xl|xxl)\b",
    )
    .expect("valid volume regex")
});

static WEIGHT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:^|[^a-z])(?:\d+(?:\.\d+)?\s*)?(?:kg|kgs|g|gm|gms|grams?|mg|oz|lbs?)\b")
        .expect("valid weight regex")
});

static COLOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!(r"(?i)\b(?:{})\b", COLORS)).expect("valid color regex"));

static FLAVOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!(r"(?i)\b(?:{})\b", FLAVORS)).expect("valid flavor regex"));

static PACK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b\d+\s*(?:pcs|pc|pieces|packs?|ct|count)\b|\b(?:pack|packs|box|boxes|bottle|bottles|carton|cartons|dozen|sachet|sachets)\b|\bx\s*\d+\b",
    )
    .expect("valid pack regex")
});

static EDGE_PUNCTUATION: &[char] = &[' ', '-', ',', '(', ')', '/', '.', ':'];

const MAX_SUFFIX_PASSES: usize = 3;

/// Strips trailing size, weight, pack, color and flavor tokens.
///
/// "Coca Cola 250ml" and "Coca Cola (500 ml)" both become "Coca Cola". The
/// result is always a prefix of the trimmed input; when stripping would leave
/// nothing the trimmed input is returned unchanged.
pub fn base_name(name: &str) -> String {
    let original = name.trim();
    let mut current = original;

    for _ in 0..MAX_SUFFIX_PASSES {
        let stripped = TRAILING_QUANTITY
            .find(current)
            .or_else(|| TRAILING_WORD.find(current))
            .map(|m| current[..m.start()].trim_end_matches(EDGE_PUNCTUATION));

        match stripped {
            Some(rest) if !rest.is_empty() && rest.len() < current.len() => current = rest,
            _ => break,
        }
    }

    if current.is_empty() {
        original.to_string()
    } else {
        current.to_string()
    }
}

/// Guesses the variant dimension from keywords, falling back to `Size`.
pub fn infer_variant_type(name: &str) -> VariantType {
    if VOLUME.is_match(name) {
        VariantType::Size
    } else if WEIGHT.is_match(name) {
        VariantType::Weight
    } else if COLOR.is_match(name) {
        VariantType::Color
    } else if FLAVOR.is_match(name) {
        VariantType::Flavor
    } else if PACK.is_match(name) {
        VariantType::Pack
    } else {
        VariantType::Size
    }
}

/// The part of `name` that distinguishes it from `base`, or a synthetic
/// "Variant N" label when that part is empty or a single character.
pub fn extract_variant_value(name: &str, base: &str, index: usize) -> String {
    let name = name.trim();
    let base = base.trim();

    let remainder = match name.get(..base.len()) {
        Some(prefix) if !base.is_empty() && prefix.eq_ignore_ascii_case(base) => &name[base.len()..],
        _ => TRAILING_QUANTITY
            .find(name)
            .or_else(|| TRAILING_WORD.find(name))
            .map(|m| m.as_str())
            .unwrap_or(""),
    };

    let value = remainder.trim_matches(EDGE_PUNCTUATION);
    if value.chars().count() < 2 {
        format!("Variant {}", index + 1)
    } else {
        value.to_string()
    }
}

/// Lowercased first word with surrounding punctuation removed.
pub fn first_word(name: &str) -> Option<String> {
    name.split_whitespace()
        .next()
        .map(|w| {
            w.trim_matches(|c: char| !c.is_alphanumeric())
                .to_lowercase()
        })
        .filter(|w| !w.is_empty())
}

/// Loose product-name match: case-insensitive containment either way, or the
/// same first word.
pub fn fuzzy_matches(left: &str, right: &str) -> bool {
    let l = left.trim().to_lowercase();
    let r = right.trim().to_lowercase();
    if l.is_empty() || r.is_empty() {
        return false;
    }
    if l.contains(&r) || r.contains(&l) {
        return true;
    }
    matches!((first_word(&l), first_word(&r)), (Some(a), Some(b)) if a == b)
}

fn sku_segment(text: &str, max_len: usize) -> String {
    text.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_uppercase())
        .take(max_len)
        .collect()
}

/// Builds a SKU such as `COCACOLA-250ML-3F2A`.
pub fn variant_sku(base: &str, value: &str, discriminator: &str) -> String {
    let mut parts = Vec::with_capacity(3);
    for segment in [sku_segment(base, 10), sku_segment(value, 8), sku_segment(discriminator, 4)] {
        if !segment.is_empty() {
            parts.push(segment);
        }
    }
    if parts.is_empty() {
        "SKU".to_string()
    } else {
        parts.join("-")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use test_case::test_case;

    #[test_case("Coca Cola 250ml", "Coca Cola" ; "volume suffix")]
    #[test_case("Coca Cola (500 ml)", "Coca Cola" ; "parenthesised volume")]
    #[test_case("Aashirvaad Atta 5kg", "Aashirvaad Atta" ; "weight suffix")]
    #[test_case("Parle-G Biscuit - Pack of 12", "Parle-G Biscuit" ; "pack of n")]
    #[test_case("Dettol Soap x4", "Dettol Soap" ; "multiplier")]
    #[test_case("Lux Soap Pink", "Lux Soap" ; "color word")]
    #[test_case("Amul Lassi Mango", "Amul Lassi" ; "flavor word")]
    #[test_case("Maggi Masala 70g", "Maggi" ; "flavor then weight")]
    #[test_case("Sugar", "Sugar" ; "nothing to strip")]
    #[test_case("  Red  ", "Red" ; "never strips to empty")]
    fn base_name_strips_variant_suffix(input: &str, expected: &str) {
        assert_eq!(base_name(input), expected);
    }

    #[test_case("250ml", VariantType::Size ; "millilitres")]
    #[test_case("Pepsi 1.5 L", VariantType::Size ; "litres")]
    #[test_case("T-Shirt Large", VariantType::Size ; "size word")]
    #[test_case("kg", VariantType::Weight ; "bare kilogram")]
    #[test_case("Toor Dal 500g", VariantType::Weight ; "grams")]
    #[test_case("Lux Soap Pink", VariantType::Color ; "color")]
    #[test_case("Frooti Mango", VariantType::Flavor ; "flavor")]
    #[test_case("Tropicana Orange", VariantType::Flavor ; "orange is a flavor")]
    #[test_case("Eggs Box", VariantType::Pack ; "box")]
    #[test_case("Bisleri 12 pcs", VariantType::Pack ; "pieces")]
    #[test_case("Something Else", VariantType::Size ; "fallback")]
    fn variant_type_is_inferred(input: &str, expected: VariantType) {
        assert_eq!(infer_variant_type(input), expected);
    }

    #[test]
    fn gold_is_not_grams() {
        assert_eq!(infer_variant_type("Taj Mahal Gold"), VariantType::Color);
    }

    #[test]
    fn variant_value_is_remainder_after_base() {
        assert_eq!(extract_variant_value("Coca Cola 250ml", "Coca Cola", 0), "250ml");
        assert_eq!(extract_variant_value("Coca Cola (500 ml)", "coca cola", 1), "500 ml");
    }

    #[test]
    fn short_variant_value_falls_back_to_synthetic_label() {
        assert_eq!(extract_variant_value("Coca Cola", "Coca Cola", 0), "Variant 1");
        assert_eq!(extract_variant_value("Coca Cola X", "Coca Cola", 2), "Variant 3");
    }

    #[test]
    fn variant_value_uses_suffix_when_base_is_not_a_prefix() {
        assert_eq!(extract_variant_value("Thums Up 750ml", "Coca Cola", 0), "750ml");
    }

    #[test]
    fn fuzzy_match_rules() {
        assert!(fuzzy_matches("Coca Cola", "coca cola 250ml"));
        assert!(fuzzy_matches("Coca Cola Zero", "Coca"));
        assert!(fuzzy_matches("Amul Butter", "Amul Cheese"));
        assert!(!fuzzy_matches("Amul Butter", "Britannia Butter"));
        assert!(!fuzzy_matches("", "Anything"));
    }

    #[test]
    fn sku_is_uppercase_alphanumeric() {
        assert_eq!(variant_sku("Coca Cola", "250ml", "3f2a9c"), "COCACOLA-250ML-3F2A");
        assert_eq!(variant_sku("!!", "", ""), "SKU");
    }

    proptest! {
        #[test]
        fn base_name_is_a_prefix_of_the_trimmed_name(name in "[A-Za-z ]{1,20}( [0-9]{1,4}(ml|g|kg|L))?") {
            let base = base_name(&name);
            prop_assert!(name.trim().starts_with(&base));
            prop_assert!(!base.is_empty() || name.trim().is_empty());
        }

        #[test]
        fn fuzzy_match_is_symmetric(a in "[a-z]{1,8}( [a-z]{1,8})?", b in "[a-z]{1,8}( [a-z]{1,8})?") {
            prop_assert_eq!(fuzzy_matches(&a, &b), fuzzy_matches(&b, &a));
        }

        #[test]
        fn variant_value_is_never_shorter_than_two_chars(name in "[A-Za-z0-9 ]{0,24}", index in 0usize..50) {
            let base = base_name(&name);
            prop_assert!(extract_variant_value(&name, &base, index).chars().count() >= 2);
        }
    }
}
