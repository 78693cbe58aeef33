use crate::model::SequenceValidator;

/// BIO (IOB2) chunk tag constraint: `I-X` must continue a `B-X` or `I-X`.
///
/// Bare `B`/`I` tags are treated as a single untyped chunk class. Tags that
/// are neither begin nor inside tags are always valid.
#[derive(Debug, Default, Clone, Copy)]
pub struct BioValidator;

fn split(tag: &str) -> Option<(char, &str)> {
    let mut chars = tag.chars();
    let prefix = chars.next()?;
    if prefix != 'B' && prefix != 'I' {
        return None;
    }
    match chars.as_str() {
        "" => Some((prefix, "")),
        rest => rest.strip_prefix('-').map(|kind| (prefix, kind)),
    }
}

impl<T> SequenceValidator<T> for BioValidator {
    fn valid(&self, _index: usize, _sequence: &[T], prior: &[String], outcome: &str) -> bool {
        match split(outcome) {
            Some(('I', kind)) => match prior.last().and_then(|p| split(p)) {
                Some((_, prev_kind)) => prev_kind == kind,
                None => false,
            },
            _ => true,
        }
    }
}
