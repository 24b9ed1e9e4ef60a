//! Fixed bidirectional language table.
//!
//! UI-facing labels map to the language codes the engines understand. The
//! lookup is bidirectional: a known label resolves to its code, an input that
//! already is a known code passes through unchanged, and anything else falls
//! back to a fixed pair (source "auto", target "zh").

use once_cell::sync::Lazy;
use std::collections::HashMap;

use crate::defaults::{FALLBACK_SOURCE_LANG, FALLBACK_TARGET_LANG};

/// Display label → language code, in UI order.
pub static LANGUAGES: &[(&str, &str)] = &[
    ("English", "en"),
    ("Simplified Chinese", "zh-CN"),
    ("Traditional Chinese - Hong Kong", "zh-HK"),
    ("Traditional Chinese - Taiwan", "zh-TW"),
    ("Japanese", "ja"),
    ("Korean", "ko"),
    ("Polish", "pl"),
    ("Russian", "ru"),
    ("Spanish", "es"),
    ("Portuguese", "pt"),
    ("Brazilian Portuguese", "pt-BR"),
    ("French", "fr"),
    ("Malay", "ms"),
    ("Indonesian", "id"),
    ("Turkmen", "tk"),
    ("Filipino (Tagalog)", "tl"),
    ("Vietnamese", "vi"),
    ("Kazakh (Latin)", "kk"),
    ("German", "de"),
    ("Dutch", "nl"),
    ("Irish", "ga"),
    ("Italian", "it"),
    ("Greek", "el"),
    ("Swedish", "sv"),
    ("Danish", "da"),
    ("Norwegian", "no"),
    ("Icelandic", "is"),
    ("Finnish", "fi"),
    ("Ukrainian", "uk"),
    ("Czech", "cs"),
    ("Romanian", "ro"),
    ("Hungarian", "hu"),
    ("Slovak", "sk"),
    ("Croatian", "hr"),
    ("Estonian", "et"),
    ("Latvian", "lv"),
    ("Lithuanian", "lt"),
    ("Belarusian", "be"),
    ("Macedonian", "mk"),
    ("Albanian", "sq"),
    ("Serbian (Cyrillic)", "sr"),
    ("Slovenian", "sl"),
    ("Catalan", "ca"),
    ("Bulgarian", "bg"),
    ("Maltese", "mt"),
    ("Swahili", "sw"),
    ("Amharic", "am"),
    ("Oromo", "om"),
    ("Tigrinya", "ti"),
    ("Haitian Creole", "ht"),
    ("Latin", "la"),
    ("Lao", "lo"),
    ("Malayalam", "ml"),
    ("Gujarati", "gu"),
    ("Thai", "th"),
    ("Burmese", "my"),
    ("Tamil", "ta"),
    ("Telugu", "te"),
    ("Oriya", "or"),
    ("Armenian", "hy"),
    ("Mongolian (Cyrillic)", "mn"),
    ("Georgian", "ka"),
    ("Khmer", "km"),
    ("Bosnian", "bs"),
    ("Luxembourgish", "lb"),
    ("Romansh", "rm"),
    ("Turkish", "tr"),
    ("Sinhala", "si"),
    ("Uzbek", "uz"),
    ("Kyrgyz", "ky"),
    ("Tajik", "tg"),
    ("Abkhazian", "ab"),
    ("Afar", "aa"),
    ("Afrikaans", "af"),
    ("Akan", "ak"),
    ("Aragonese", "an"),
    ("Avaric", "av"),
    ("Ewe", "ee"),
    ("Aymara", "ay"),
    ("Ojibwa", "oj"),
    ("Occitan", "oc"),
    ("Ossetian", "os"),
    ("Pali", "pi"),
    ("Bashkir", "ba"),
    ("Basque", "eu"),
    ("Breton", "br"),
    ("Chamorro", "ch"),
    ("Chechen", "ce"),
    ("Chuvash", "cv"),
    ("Tswana", "tn"),
    ("Ndebele, South", "nr"),
    ("Ndonga", "ng"),
    ("Faroese", "fo"),
    ("Fijian", "fj"),
    ("Frisian, Western", "fy"),
    ("Ganda", "lg"),
    ("Kongo", "kg"),
    ("Kalaallisut", "kl"),
    ("Church Slavic", "cu"),
    ("Guarani", "gn"),
    ("Interlingua", "ia"),
    ("Herero", "hz"),
    ("Kikuyu", "ki"),
    ("Rundi", "rn"),
    ("Kinyarwanda", "rw"),
    ("Galician", "gl"),
    ("Kanuri", "kr"),
    ("Cornish", "kw"),
    ("Komi", "kv"),
    ("Xhosa", "xh"),
    ("Corsican", "co"),
    ("Cree", "cr"),
    ("Quechua", "qu"),
    ("Kurdish (Latin)", "ku"),
    ("Kuanyama", "kj"),
    ("Limburgan", "li"),
    ("Lingala", "ln"),
    ("Manx", "gv"),
    ("Malagasy", "mg"),
    ("Marshallese", "mh"),
    ("Maori", "mi"),
    ("Navajo", "nv"),
    ("Nauru", "na"),
    ("Nyanja", "ny"),
    ("Norwegian Nynorsk", "nn"),
    ("Sardinian", "sc"),
    ("Northern Sami", "se"),
    ("Samoan", "sm"),
    ("Sango", "sg"),
    ("Shona", "sn"),
    ("Esperanto", "eo"),
    ("Scottish Gaelic", "gd"),
    ("Somali", "so"),
    ("Southern Sotho", "st"),
    ("Tatar", "tt"),
    ("Tahitian", "ty"),
    ("Tongan", "to"),
    ("Twi", "tw"),
    ("Walloon", "wa"),
    ("Welsh", "cy"),
    ("Venda", "ve"),
    ("Volapük", "vo"),
    ("Interlingue", "ie"),
    ("Hiri Motu", "ho"),
    ("Igbo", "ig"),
    ("Ido", "io"),
    ("Inuktitut", "iu"),
    ("Inupiaq", "ik"),
    ("Sichuan Yi", "ii"),
    ("Yoruba", "yo"),
    ("Zhuang", "za"),
    ("Tsonga", "ts"),
    ("Zulu", "zu"),
];

static LABEL_TO_CODE: Lazy<HashMap<&'static str, &'static str>> =
    Lazy::new(|| LANGUAGES.iter().copied().collect());

static CODE_TO_LABEL: Lazy<HashMap<&'static str, &'static str>> =
    Lazy::new(|| LANGUAGES.iter().map(|(label, code)| (*code, *label)).collect());

/// Resolve a label or code to a language code; None if unknown either way.
pub fn code_for(input: &str) -> Option<&'static str> {
    if let Some(code) = LABEL_TO_CODE.get(input) {
        return Some(code);
    }
    CODE_TO_LABEL.get_key_value(input).map(|(code, _)| *code)
}

/// Reverse lookup: display label for a language code.
pub fn label_for(code: &str) -> Option<&'static str> {
    CODE_TO_LABEL.get(code).copied()
}

/// Source-language resolution with the "auto" fallback.
pub fn source_code(input: &str) -> &'static str {
    code_for(input).unwrap_or(FALLBACK_SOURCE_LANG)
}

/// Target-language resolution with the primary-output-language fallback.
pub fn target_code(input: &str) -> &'static str {
    code_for(input).unwrap_or(FALLBACK_TARGET_LANG)
}
