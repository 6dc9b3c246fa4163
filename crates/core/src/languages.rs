//! Response-language directives injected into the system prompt.

/// A supported response language: the display name returned to callers
/// and the instruction appended to the system prompt. Non-English
/// entries lead with the instruction in the target script so the model
/// sees it even when it weighs English text poorly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LanguageDirective {
    pub code: &'static str,
    pub name: &'static str,
    pub instruction: &'static str,
}

const LANGUAGES: &[LanguageDirective] = &[
    LanguageDirective {
        code: "en",
        name: "English",
        instruction: "Respond in English.",
    },
    LanguageDirective {
        code: "hi",
        name: "Hindi",
        instruction: "कृपया हिंदी में जवाब दें। Respond in Hindi.",
    },
    LanguageDirective {
        code: "ta",
        name: "Tamil",
        instruction: "தமிழில் பதிலளிக்கவும். Respond in Tamil.",
    },
    LanguageDirective {
        code: "te",
        name: "Telugu",
        instruction: "తెలుగులో సమాధానం ఇవ్వండి. Respond in Telugu.",
    },
    LanguageDirective {
        code: "bn",
        name: "Bengali",
        instruction: "বাংলায় উত্তর দিন. Respond in Bengali.",
    },
    LanguageDirective {
        code: "mr",
        name: "Marathi",
        instruction: "मराठीत उत्तर द्या. Respond in Marathi.",
    },
    LanguageDirective {
        code: "gu",
        name: "Gujarati",
        instruction: "ગુજરાતીમાં જવાબ આપો. Respond in Gujarati.",
    },
    LanguageDirective {
        code: "kn",
        name: "Kannada",
        instruction: "ಕನ್ನಡದಲ್ಲಿ ಉತ್ತರಿಸಿ. Respond in Kannada.",
    },
    LanguageDirective {
        code: "ml",
        name: "Malayalam",
        instruction: "മലയാളത്തിൽ മറുപടി നൽകുക. Respond in Malayalam.",
    },
    LanguageDirective {
        code: "pa",
        name: "Punjabi",
        instruction: "ਪੰਜਾਬੀ ਵਿੱਚ ਜਵਾਬ ਦਿਓ. Respond in Punjabi.",
    },
];

/// Resolves a language code to its directive. Unknown or empty codes
/// fall back to English rather than erroring: a bad language preference
/// must never block a query.
pub fn resolve(code: &str) -> LanguageDirective {
    LANGUAGES
        .iter()
        .find(|directive| directive.code == code)
        .copied()
        .unwrap_or(LANGUAGES[0])
}

pub fn supported_codes() -> impl Iterator<Item = &'static str> {
    LANGUAGES.iter().map(|directive| directive.code)
}
