//! Ready-made context generators.

use crate::{error::Result, model::ContextGenerator};

const BOS: &str = "BOS";
const EOS: &str = "EOS";

fn transition_features(index: usize, prior: &[String], out: &mut Vec<String>) {
    let prev = index.checked_sub(1).and_then(|i| prior.get(i)).map_or(BOS, String::as_str);
    let prev2 = index.checked_sub(2).and_then(|i| prior.get(i)).map_or(BOS, String::as_str);
    out.push(format!("prev={prev}"));
    out.push(format!("prev2={prev2}|{prev}"));
}

/// Context for pre-featurised items: the item's attributes plus the previous
/// one and two outcomes.
#[derive(Debug, Default, Clone, Copy)]
pub struct ItemContextGenerator;

impl<S: AsRef<str>> ContextGenerator<Vec<S>> for ItemContextGenerator {
    fn context(
        &self,
        index: usize,
        sequence: &[Vec<S>],
        prior: &[String],
        additional: &[String],
    ) -> Result<Vec<String>> {
        let item = &sequence[index];
        let mut features = Vec::with_capacity(item.len() + additional.len() + 2);
        features.extend(item.iter().map(|a| a.as_ref().to_string()));
        transition_features(index, prior, &mut features);
        features.extend(additional.iter().map(|a| format!("extra={a}")));
        Ok(features)
    }
}

/// Word-window context for raw tokens: the current word, its neighbours,
/// a short suffix and the previous outcomes.
#[derive(Debug, Clone, Copy)]
pub struct WordContextGenerator {
    pub suffix_len: usize,
}

impl Default for WordContextGenerator {
    fn default() -> Self {
        Self { suffix_len: 3 }
    }
}

impl<S: AsRef<str>> ContextGenerator<S> for WordContextGenerator {
    fn context(
        &self,
        index: usize,
        sequence: &[S],
        prior: &[String],
        additional: &[String],
    ) -> Result<Vec<String>> {
        let word = sequence[index].as_ref();
        let lower = |w: &S| w.as_ref().to_lowercase();
        let before =
            index.checked_sub(1).and_then(|i| sequence.get(i)).map_or(BOS.to_string(), lower);
        let after = sequence.get(index + 1).map_or(EOS.to_string(), lower);
        let mut features = vec![
            "bias".to_string(),
            format!("w={}", word.to_lowercase()),
            format!("w-1={before}"),
            format!("w+1={after}"),
        ];
        let chars: Vec<char> = word.chars().collect();
        if self.suffix_len > 0 && chars.len() > self.suffix_len {
            let suffix: String = chars[chars.len() - self.suffix_len..].iter().collect();
            features.push(format!("suf={}", suffix.to_lowercase()));
        }
        if chars.first().is_some_and(|c| c.is_uppercase()) {
            features.push("cap".to_string());
        }
        if !chars.is_empty() && chars.iter().all(|c| c.is_ascii_digit()) {
            features.push("num".to_string());
        }
        transition_features(index, prior, &mut features);
        features.extend(additional.iter().map(|a| format!("extra={a}")));
        Ok(features)
    }
}
