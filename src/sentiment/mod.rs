use std::collections::HashMap;

/// Compound-polarity scoring for review text.
///
/// The pipeline only needs a single scalar in [-1, 1] per review; everything
/// behind that seam is replaceable, and tests substitute a canned model.
pub trait SentimentModel {
    fn compound(&self, text: &str) -> f64;
}

/// Valence-lexicon model. Token valences are summed (a preceding negation
/// flips and dampens the hit) and the sum is squashed into [-1, 1].
pub struct LexiconModel {
    valences: HashMap<&'static str, f64>,
}

const NEGATION_SCALAR: f64 = -0.74;
const NORMALIZATION_ALPHA: f64 = 15.0;
const NEGATION_REACH: usize = 2;

const NEGATIONS: &[&str] = &[
    "not", "no", "never", "cannot", "cant", "dont", "doesnt", "didnt", "isnt", "wasnt", "wont",
    "wouldnt", "shouldnt", "couldnt", "aint", "hardly",
];

const VALENCES: &[(&str, f64)] = &[
    ("amazing", 2.8),
    ("awesome", 3.1),
    ("beautiful", 2.9),
    ("best", 3.2),
    ("better", 1.9),
    ("brilliant", 2.8),
    ("cool", 1.3),
    ("easy", 1.9),
    ("enjoy", 2.2),
    ("excellent", 2.7),
    ("fantastic", 2.6),
    ("fun", 2.3),
    ("good", 1.9),
    ("great", 3.1),
    ("happy", 2.7),
    ("helpful", 1.9),
    ("like", 1.5),
    ("likes", 1.6),
    ("love", 3.2),
    ("loved", 2.9),
    ("loves", 2.7),
    ("nice", 1.8),
    ("perfect", 2.7),
    ("recommend", 1.5),
    ("recommended", 1.6),
    ("smooth", 1.3),
    ("superb", 3.0),
    ("thank", 1.7),
    ("thanks", 1.9),
    ("useful", 1.9),
    ("wonderful", 2.7),
    ("annoying", -1.8),
    ("awful", -2.9),
    ("bad", -2.5),
    ("boring", -1.3),
    ("broken", -1.6),
    ("bug", -1.4),
    ("buggy", -1.9),
    ("bugs", -1.5),
    ("crash", -1.6),
    ("crashes", -1.6),
    ("crashing", -1.7),
    ("disappointing", -2.1),
    ("error", -1.7),
    ("errors", -1.7),
    ("fail", -2.3),
    ("fails", -2.1),
    ("hate", -2.7),
    ("hated", -2.6),
    ("horrible", -2.5),
    ("poor", -2.1),
    ("problem", -1.4),
    ("problems", -1.5),
    ("scam", -2.2),
    ("slow", -1.2),
    ("stupid", -2.4),
    ("sucks", -2.2),
    ("terrible", -3.1),
    ("useless", -1.8),
    ("waste", -1.8),
    ("worst", -3.1),
    ("wrong", -1.4),
];

impl LexiconModel {
    pub fn new() -> Self {
        Self {
            valences: VALENCES.iter().copied().collect(),
        }
    }
}

impl Default for LexiconModel {
    fn default() -> Self {
        Self::new()
    }
}

impl SentimentModel for LexiconModel {
    fn compound(&self, text: &str) -> f64 {
        let tokens = tokenize(text);
        let mut sum = 0.0;

        for (index, token) in tokens.iter().enumerate() {
            let Some(valence) = self.valences.get(token.as_str()).copied() else {
                continue;
            };

            let negated = tokens[index.saturating_sub(NEGATION_REACH)..index]
                .iter()
                .any(|previous| NEGATIONS.contains(&previous.as_str()));

            sum += if negated {
                valence * NEGATION_SCALAR
            } else {
                valence
            };
        }

        if sum == 0.0 {
            return 0.0;
        }

        let normalized = sum / (sum * sum + NORMALIZATION_ALPHA).sqrt();
        normalized.clamp(-1.0, 1.0)
    }
}

fn tokenize(text: &str) -> Vec<String> {
    text.split_whitespace()
        .map(|word| {
            word.chars()
                .filter(|c| c.is_alphanumeric())
                .collect::<String>()
                .to_lowercase()
        })
        .filter(|token| !token.is_empty())
        .collect()
}
