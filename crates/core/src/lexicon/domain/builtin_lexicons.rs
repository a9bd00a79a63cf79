use super::lexicon::Lexicon;
use crate::shared::language::Language;

const ITALIAN_FILLERS: &[&str] = &[
    "eh", "ehm", "ehh", "mmm", "mh", "uhm", "cioè", "allora", "dunque", "tipo", "insomma",
];

const ITALIAN_COHESION: &[&str] = &[
    "inoltre",
    "per quanto riguarda",
    "tuttavia",
    "ciò nonostante",
    "in definitiva",
    "da un lato",
    "dall’altro",
    "dall'altro",
    "a mio avviso",
    "tenuto conto di",
    "a quanto pare",
    "presumibilmente",
    "parrebbe che",
    "pertanto",
    "quindi",
    "invece",
    "comunque",
];

// Relative-clause and conditional markers.
const ITALIAN_COMPLEXITY: &[&str] = &[
    "che",
    "cui",
    "il quale",
    "la quale",
    "i quali",
    "le quali",
    "nella quale",
    "nei quali",
    "se",
    "qualora",
];

const ENGLISH_FILLERS: &[&str] = &["um", "uh", "uhm", "er", "erm", "hmm", "mm"];

const ENGLISH_COHESION: &[&str] = &[
    "however",
    "moreover",
    "furthermore",
    "therefore",
    "consequently",
    "nevertheless",
    "in addition",
    "on the other hand",
    "in my opinion",
    "as a result",
    "for example",
    "for instance",
    "in conclusion",
    "whereas",
    "although",
];

const ENGLISH_COMPLEXITY: &[&str] = &[
    "which",
    "who",
    "whom",
    "whose",
    "if",
    "unless",
    "provided that",
    "as long as",
];

pub fn builtin_lexicon(language: Language) -> Lexicon {
    match language {
        Language::Italian => {
            Lexicon::from_static(ITALIAN_FILLERS, ITALIAN_COHESION, ITALIAN_COMPLEXITY)
        }
        Language::English => {
            Lexicon::from_static(ENGLISH_FILLERS, ENGLISH_COHESION, ENGLISH_COMPLEXITY)
        }
    }
}
