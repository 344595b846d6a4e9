//! Identifier and doc-comment helpers for generated code.

const RUST_KEYWORDS: &[&str] = &[
    "as", "async", "await", "break", "const", "continue", "crate", "dyn", "else", "enum",
    "extern", "false", "fn", "for", "if", "impl", "in", "let", "loop", "match", "mod", "move",
    "mut", "pub", "ref", "return", "static", "struct", "trait", "true", "type", "unsafe", "use",
    "where", "while", "abstract", "become", "box", "do", "final", "gen", "macro", "override",
    "priv", "try", "typeof", "unsized", "virtual", "yield",
];

/// `osm_water_polygon` -> `OsmWaterPolygon`
pub fn upper_camel(name: &str) -> String {
    name.split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => {
                    first.to_ascii_uppercase().to_string() + &chars.as_str().to_ascii_lowercase()
                }
                None => String::new(),
            }
        })
        .collect()
}

/// `name:en` -> `NAME_EN`
pub fn constant_case(name: &str) -> String {
    let ident = sanitize(name).to_ascii_uppercase();
    prefix_digit(ident)
}

/// `class` -> `class`, `type` -> `r#type`, `name:en` -> `name_en`
pub fn snake_ident(name: &str) -> String {
    let ident = prefix_digit(sanitize(name).to_ascii_lowercase());
    if matches!(ident.as_str(), "self" | "super" | "crate") {
        // cannot be raw identifiers
        format!("{ident}_")
    } else if RUST_KEYWORDS.contains(&ident.as_str()) {
        format!("r#{ident}")
    } else {
        ident
    }
}

fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

fn prefix_digit(ident: String) -> String {
    if ident.is_empty() || ident.starts_with(|c: char| c.is_ascii_digit()) {
        format!("_{ident}")
    } else {
        ident
    }
}

/// A documented allowed value with the trailing annotation dropped:
/// `"motorway (and links)"` -> `"motorway"`.
///
/// Only used for listing documented values; matching always uses the full
/// literal.
pub fn documented_value(value: &str) -> &str {
    value.split(' ').next().unwrap_or(value)
}

/// Collapse whitespace so `text` fits on one doc-comment line.
pub fn doc_line(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
