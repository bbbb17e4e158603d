//! Header and caption normalization helpers shared by the loader.

/// Common UTF-8-read-as-Latin-1 sequences seen in the source exports,
/// longest first so compound sequences win over their prefixes.
const MOJIBAKE_FIXES: &[(&str, &str)] = &[
    ("Ã£o", "ão"),
    ("Ã§Ã£", "çã"),
    ("Ã£", "ã"),
    ("Ã¡", "á"),
    ("Ã¢", "â"),
    ("Ã©", "é"),
    ("Ãª", "ê"),
    ("Ã­", "í"),
    ("Ã³", "ó"),
    ("Ã´", "ô"),
    ("Ãµ", "õ"),
    ("Ãº", "ú"),
    ("Ã§", "ç"),
    ("Ã‰", "É"),
    ("Ã‡", "Ç"),
];

/// Normalize a column header: trim surrounding whitespace and strip a
/// leading byte-order-mark left behind by some export tools.
pub fn normalize_header(raw: &str) -> String {
    raw.trim().trim_start_matches('\u{feff}').trim().to_string()
}

/// Repair common mojibake in free-text captions.
///
/// Only captions that actually contain a suspect `Ã` pay for the scan;
/// clean text passes through untouched.
pub fn clean_text(raw: &str) -> String {
    if !raw.contains('Ã') {
        return raw.to_string();
    }
    let mut text = raw.to_string();
    for (broken, fixed) in MOJIBAKE_FIXES {
        if text.contains(broken) {
            text = text.replace(broken, fixed);
        }
    }
    text
}
