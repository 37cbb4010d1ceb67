/// Target languages offered for translation: (code, label).
pub const TARGET_LANGUAGES: &[(&str, &str)] = &[
    ("Japanese", "🇯🇵 Japanese"),
    ("Russian", "🇷🇺 Russian"),
    ("Arabic", "🇸🇦 Arabic"),
    ("Hindi", "🇮🇳 Hindi"),
    ("French", "🇫🇷 French"),
    ("Spanish", "🇪🇸 Spanish"),
    ("German", "🇩🇪 German"),
];

pub const DEFAULT_LANGUAGE: &str = "Japanese";

/// Display label for a language code; unknown codes are shown as-is.
pub fn language_label(code: &str) -> String {
    TARGET_LANGUAGES
        .iter()
        .find(|(known, _)| *known == code)
        .map(|(_, label)| (*label).to_string())
        .unwrap_or_else(|| code.to_string())
}

pub fn is_known_language(code: &str) -> bool {
    TARGET_LANGUAGES.iter().any(|(known, _)| *known == code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_known_codes_and_passes_unknown_through() {
        assert_eq!(language_label("Russian"), "🇷🇺 Russian");
        assert_eq!(language_label("Klingon"), "Klingon");
        assert!(is_known_language(DEFAULT_LANGUAGE));
    }
}
