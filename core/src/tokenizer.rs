use lazy_static::lazy_static;
use regex::Regex;
use rust_stemmers::{Algorithm, Stemmer};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use unicode_normalization::UnicodeNormalization;

/// Ordered normalized tokens of one document or query.
pub type TokenSequence = Vec<String>;

lazy_static! {
    static ref MARKUP: Regex = Regex::new(r"</?[a-zA-Z][^<>]*>").expect("valid regex");
    static ref WORD: Regex = Regex::new(r"(?u)[\p{L}\p{N}]+").expect("valid regex");
    static ref STEMMER: Stemmer = Stemmer::create(Algorithm::English);
    static ref STOPWORDS: HashSet<&'static str> = {
        let words: &[&str] = &[
            "a","about","above","after","again","against","all","am","an","and","any","are","as","at",
            "be","because","been","before","being","below","between","both","but","by",
            "can","cannot","could",
            "did","do","does","doing","down","during",
            "each","few","for","from","further",
            "had","has","have","having","he","her","here","hers","herself","him","himself","his","how",
            "i","if","in","into","is","it","its","itself",
            "me","more","most","my","myself",
            "no","nor","not","of","off","on","once","only","or","other","ought","our","ours","ourselves","out","over","own",
            "same","she","should","so","some","such",
            "than","that","the","their","theirs","them","themselves","then","there","these","they","this","those","through","to","too",
            "under","until","up","very",
            "was","we","were","what","when","where","which","while","who","whom","why","with","would",
            "you","your","yours","yourself","yourselves"
        ];
        words.iter().copied().collect()
    };
}

fn is_stopword(token: &str) -> bool { STOPWORDS.contains(token) }

/// Optional normalization steps applied after the base tokenization.
///
/// The policy is recorded in the index snapshot; queries are always
/// tokenized with the policy the index was built with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenizerPolicy {
    pub remove_stopwords: bool,
    pub stem: bool,
}

impl TokenizerPolicy {
    pub fn tokenize(&self, text: &str) -> TokenSequence {
        let base = preprocess(text);
        if !self.remove_stopwords && !self.stem {
            return base;
        }
        base.into_iter()
            .filter(|t| !(self.remove_stopwords && is_stopword(t)))
            .map(|t| if self.stem { STEMMER.stem(&t).into_owned() } else { t })
            .collect()
    }
}

/// Tokenize text using NFKC normalization, lowercasing, markup removal and
/// splitting on every character that is not a letter or digit.
pub fn preprocess(text: &str) -> TokenSequence {
    if text.trim().is_empty() {
        return Vec::new();
    }
    let normalized = text.nfkc().collect::<String>().to_lowercase();
    let stripped = MARKUP.replace_all(&normalized, " ");
    WORD.find_iter(&stripped).map(|m| m.as_str().to_string()).collect()
}
