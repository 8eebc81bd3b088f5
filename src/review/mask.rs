use rand::seq::SliceRandom;
use rand::Rng;
use regex::Regex;

use super::Word;

/// Examples shorter than this many tokens are not used for fill-in prompts.
const MIN_SENTENCE_TOKENS: usize = 6;
const MASK_PROBABILITY: f64 = 0.5;

/// What to show for one word presentation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Prompt {
    Word(String),
    /// An example with every form of the word blanked out.
    Masked { sentence: String, original: String },
}

impl Prompt {
    pub fn text(&self) -> &str {
        match self {
            Prompt::Word(w) => w,
            Prompt::Masked { sentence, .. } => sentence,
        }
    }
}

fn is_vowel(c: char) -> bool {
    matches!(c.to_ascii_lowercase(), 'a' | 'e' | 'i' | 'o' | 'u')
}

/// Base form plus the regular inflections: -s/-es, past tense and -ing.
pub fn word_forms(word: &str) -> Vec<String> {
    let base = word.trim().to_lowercase();
    if base.is_empty() {
        return Vec::new();
    }
    let mut forms = vec![base.clone(), format!("{base}s"), format!("{base}es")];

    let consonant_y = base.ends_with('y')
        && base
            .chars()
            .rev()
            .nth(1)
            .is_some_and(|c| c.is_alphabetic() && !is_vowel(c));
    let stem = &base[..base.len() - base.chars().last().map_or(0, char::len_utf8)];

    if base.ends_with('e') {
        forms.push(format!("{base}d"));
        forms.push(format!("{stem}ing"));
    } else if consonant_y {
        forms.push(format!("{stem}ies"));
        forms.push(format!("{stem}ied"));
        forms.push(format!("{base}ing"));
    } else {
        forms.push(format!("{base}ed"));
        forms.push(format!("{base}ing"));
    }

    forms.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
    forms.dedup();
    forms
}

fn forms_regex(word: &str) -> Option<Regex> {
    let forms = word_forms(word);
    if forms.is_empty() {
        return None;
    }
    let alternation = forms
        .iter()
        .map(|f| regex::escape(f))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(r"(?i)\b(?:{alternation})\b")).ok()
}

/// Blank out whole-word occurrences of `word` and its inflections, one `_` per
/// character. Everything else is kept byte for byte.
pub fn mask_sentence(sentence: &str, word: &str) -> String {
    match forms_regex(word) {
        Some(re) => re
            .replace_all(sentence, |caps: &regex::Captures| "_".repeat(caps[0].chars().count()))
            .into_owned(),
        None => sentence.to_string(),
    }
}

pub fn is_sentence(example: &str) -> bool {
    example.split_whitespace().count() >= MIN_SENTENCE_TOKENS
}

/// Examples that can stand in for the word: long enough, and actually containing it.
fn maskable_examples(word: &Word) -> Vec<&str> {
    if !word.is_single_token() {
        return Vec::new();
    }
    let Some(re) = forms_regex(&word.word) else {
        return Vec::new();
    };
    word.examples
        .iter()
        .map(String::as_str)
        .filter(|ex| is_sentence(ex) && re.is_match(ex))
        .collect()
}

/// Pick the bare word or, half of the time when possible, a masked example.
pub fn choose_prompt<R: Rng + ?Sized>(word: &Word, rng: &mut R) -> Prompt {
    let candidates = maskable_examples(word);
    if !candidates.is_empty() && rng.gen_bool(MASK_PROBABILITY) {
        if let Some(original) = candidates.choose(rng) {
            return Prompt::Masked {
                sentence: mask_sentence(original, &word.word),
                original: original.to_string(),
            };
        }
    }
    Prompt::Word(word.word.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::review::word;
    use assert_matches::assert_matches;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn forms_of_consonant_y_words() {
        let forms = word_forms("study");
        for f in ["study", "studies", "studied", "studying", "studys"] {
            assert!(forms.contains(&f.to_string()), "missing {f}");
        }
    }

    #[test]
    fn forms_of_e_words() {
        let forms = word_forms("Bake");
        for f in ["bake", "bakes", "baked", "baking"] {
            assert!(forms.contains(&f.to_string()), "missing {f}");
        }
    }

    #[test]
    fn forms_of_vowel_y_words() {
        let forms = word_forms("play");
        assert!(forms.contains(&"played".to_string()));
        assert!(!forms.contains(&"plaied".to_string()));
    }

    #[test]
    fn masks_inflection_preserving_text() {
        assert_eq!(
            mask_sentence("She studies every night", "study"),
            "She _______ every night"
        );
    }

    #[test]
    fn masking_is_case_insensitive_and_whole_word() {
        assert_eq!(
            mask_sentence("Walking, he walked past the sidewalk.", "walk"),
            "_______, he ______ past the sidewalk."
        );
    }

    #[test]
    fn sentence_needs_more_than_five_tokens() {
        assert!(!is_sentence("one two three four five"));
        assert!(is_sentence("one two three four five six"));
    }

    #[test]
    fn multi_word_entries_always_show_the_word() {
        let mut w = word(1, "give up", 0, None);
        w.examples = vec!["You should never give up on your dreams at all".into()];
        let mut rng = StdRng::seed_from_u64(0);
        for _ in 0..20 {
            assert_eq!(choose_prompt(&w, &mut rng), Prompt::Word("give up".into()));
        }
    }

    #[test]
    fn short_examples_never_masked() {
        let mut w = word(1, "run", 0, None);
        w.examples = vec!["I run daily.".into()];
        let mut rng = StdRng::seed_from_u64(0);
        for _ in 0..20 {
            assert_matches!(choose_prompt(&w, &mut rng), Prompt::Word(_));
        }
    }

    #[test]
    fn long_examples_are_sometimes_masked() {
        let mut w = word(1, "run", 0, None);
        w.examples = vec!["Every morning I run around the old park.".into()];
        let mut rng = StdRng::seed_from_u64(11);
        let prompts: Vec<Prompt> = (0..50).map(|_| choose_prompt(&w, &mut rng)).collect();

        assert!(prompts.iter().any(|p| matches!(p, Prompt::Word(_))));
        let masked = prompts
            .iter()
            .find(|p| matches!(p, Prompt::Masked { .. }))
            .expect("no masked prompt in 50 draws");
        assert_eq!(masked.text(), "Every morning I ___ around the old park.");
    }
}
