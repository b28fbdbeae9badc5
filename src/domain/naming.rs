// Derives the catalog's string identifiers (variant SKU, picture name) from raw field values.

/// Color segment used for component-level pictures.
pub const MAIN_PICTURE_TOKEN: &str = "main";

const SEGMENT_SEPARATOR: char = '_';

/// Trims, lowercases and collapses every whitespace run into a single underscore.
pub fn normalize_segment(raw: &str) -> String {
    raw.split_whitespace()
        .map(|word| word.to_lowercase())
        .collect::<Vec<_>>()
        .join("_")
}

/// Normalized supplier prefix, or `None` when the code is absent or blank.
fn supplier_prefix(supplier_code: Option<&str>) -> Option<String> {
    supplier_code
        .map(normalize_segment)
        .filter(|code| !code.is_empty())
}

fn join_segments(prefix: Option<String>, rest: &[&str]) -> String {
    let mut out = prefix.unwrap_or_default();
    for segment in rest {
        if !out.is_empty() {
            out.push(SEGMENT_SEPARATOR);
        }
        out.push_str(segment);
    }
    out
}

/// `[supplier_]product_color`, every segment normalized.
///
/// `None`, `""` and whitespace-only supplier codes all mean "no prefix".
pub fn compute_variant_sku(
    supplier_code: Option<&str>,
    product_number: &str,
    color_name: &str,
) -> String {
    let product = normalize_segment(product_number);
    let color = normalize_segment(color_name);
    join_segments(supplier_prefix(supplier_code), &[&product, &color])
}

/// `[supplier_]product_color_order`, where a component-level picture (`color_name == None`)
/// uses [`MAIN_PICTURE_TOKEN`] as its color segment.
pub fn compute_picture_name(
    supplier_code: Option<&str>,
    product_number: &str,
    color_name: Option<&str>,
    picture_order: i32,
) -> String {
    let product = normalize_segment(product_number);
    let color = color_name
        .map(normalize_segment)
        .unwrap_or_else(|| MAIN_PICTURE_TOKEN.to_string());
    let order = picture_order.to_string();
    join_segments(supplier_prefix(supplier_code), &[&product, &color, &order])
}
