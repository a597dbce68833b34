/// Language
///
/// One entry of the fixed catalogue offered in the snippet form. `key` is what gets
/// stored and submitted; `label` is what the user sees.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Language {
    pub key: &'static str,
    pub label: &'static str,
}

const fn lang(key: &'static str, label: &'static str) -> Language {
    Language { key, label }
}

/// The default key, also used as the fallback label for unknown keys.
pub const DEFAULT_LANGUAGE: &str = "plaintext";

pub static LANGUAGES: &[Language] = &[
    lang("plaintext", "Plain Text"),
    lang("html", "HTML"),
    lang("css", "CSS"),
    lang("scss", "SCSS"),
    lang("javascript", "JavaScript"),
    lang("typescript", "TypeScript"),
    lang("json", "JSON"),
    lang("php", "PHP"),
    lang("python", "Python"),
    lang("go", "Go"),
    lang("sql", "SQL"),
    lang("bash", "Bash"),
    lang("xml", "XML"),
    lang("c", "C"),
    lang("cpp", "C++"),
    lang("csharp", "C#"),
    lang("java", "Java"),
    lang("swift", "Swift"),
    lang("rust", "Rust"),
    lang("ruby", "Ruby"),
    lang("perl", "Perl"),
    lang("lua", "Lua"),
    lang("shell", "Shell"),
];

pub fn all() -> Vec<Language> {
    LANGUAGES.to_vec()
}

pub fn is_known(key: &str) -> bool {
    LANGUAGES.iter().any(|l| l.key == key)
}

/// Display label for `key`, "Plain Text" when the key is not in the catalogue.
pub fn label(key: &str) -> &'static str {
    LANGUAGES
        .iter()
        .find(|l| l.key == key)
        .map(|l| l.label)
        .unwrap_or(LANGUAGES[0].label)
}
