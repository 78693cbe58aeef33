use std::{collections::HashMap, fmt::Display};

/// Label-wise performance values.
#[derive(Debug, Default)]
struct LabelMeasure {
    /// Number of correct predictions.
    num_correct: usize,
    /// Number of occurrences of the label in the reference data.
    num_observation: usize,
    /// Number of predictions.
    num_prediction: usize,
    precision: f64,
    recall: f64,
    fmeasure: f64,
}

/// Accumulated tagging performance against reference labels.
#[derive(Debug, Default)]
pub struct Evaluation {
    tbl: HashMap<String, LabelMeasure>,

    /// Number of correctly predicted items.
    item_total_correct: usize,
    /// Total number of items.
    item_total_num: usize,
    item_accuracy: f64,

    /// Number of correctly predicted sequences.
    inst_total_correct: usize,
    /// Total number of sequences.
    inst_total_num: usize,
    inst_accuracy: f64,

    macro_precision: f64,
    macro_recall: f64,
    macro_fmeasure: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Estimation {
    pub precision: f64,
    pub recall: f64,
    pub fmeasure: f64,
}

impl Evaluation {
    /// Tallies one predicted sequence against its reference.
    ///
    /// Sequences of different lengths are compared over the shorter prefix
    /// and never count as correct.
    pub fn accumulate<R: AsRef<str>, P: AsRef<str>>(&mut self, reference: &[R], prediction: &[P]) {
        let mut matched = 0;
        for (r, p) in reference.iter().zip(prediction) {
            let (r, p) = (r.as_ref(), p.as_ref());
            self.tbl.entry(r.to_string()).or_default().num_observation += 1;
            self.tbl.entry(p.to_string()).or_default().num_prediction += 1;
            if r == p {
                self.tbl.entry(r.to_string()).or_default().num_correct += 1;
                self.item_total_correct += 1;
                matched += 1;
            }
            self.item_total_num += 1;
        }

        if reference.len() == prediction.len() && matched == reference.len() {
            self.inst_total_correct += 1;
        }
        self.inst_total_num += 1;
    }

    /// Computes label-wise and macro-averaged scores over labels seen in the reference.
    pub fn evaluate(&mut self) -> Estimation {
        self.macro_precision = 0.0;
        self.macro_recall = 0.0;
        self.macro_fmeasure = 0.0;
        let mut num_labels = 0;
        for lev in self.tbl.values_mut() {
            if lev.num_observation == 0 {
                continue;
            }
            num_labels += 1;

            lev.precision = 0.0;
            lev.recall = 0.0;
            lev.fmeasure = 0.0;

            if lev.num_prediction > 0 {
                lev.precision = lev.num_correct as f64 / lev.num_prediction as f64;
            }
            lev.recall = lev.num_correct as f64 / lev.num_observation as f64;
            if lev.precision + lev.recall > 0.0 {
                lev.fmeasure = lev.precision * lev.recall * 2.0 / (lev.precision + lev.recall);
            }
            self.macro_precision += lev.precision;
            self.macro_recall += lev.recall;
            self.macro_fmeasure += lev.fmeasure;
        }

        if num_labels > 0 {
            self.macro_precision /= num_labels as f64;
            self.macro_recall /= num_labels as f64;
            self.macro_fmeasure /= num_labels as f64;
        }
        if self.item_total_num > 0 {
            self.item_accuracy = self.item_total_correct as f64 / self.item_total_num as f64;
        }
        if self.inst_total_num > 0 {
            self.inst_accuracy = self.inst_total_correct as f64 / self.inst_total_num as f64;
        }
        Estimation {
            precision: self.macro_precision,
            recall: self.macro_recall,
            fmeasure: self.macro_fmeasure,
        }
    }

    pub fn item_accuracy(&self) -> f64 {
        self.item_accuracy
    }

    pub fn sequence_accuracy(&self) -> f64 {
        self.inst_accuracy
    }
}

impl Display for Evaluation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Performance by label (#match, #model, #ref) (precision, recall, F1):")?;
        let mut labels: Vec<_> = self.tbl.iter().collect();
        labels.sort_by(|a, b| a.0.cmp(b.0));
        for (label, lev) in labels {
            if lev.num_observation == 0 {
                writeln!(
                    f,
                    "\t{}: ({}, {}, {}) (******, ******, ******)",
                    label, lev.num_correct, lev.num_prediction, lev.num_observation
                )?;
            } else {
                writeln!(
                    f,
                    "\t{}: ({}, {}, {}) ({:.4}, {:.4}, {:.4})",
                    label,
                    lev.num_correct,
                    lev.num_prediction,
                    lev.num_observation,
                    lev.precision,
                    lev.recall,
                    lev.fmeasure
                )?;
            }
        }
        writeln!(
            f,
            "Macro-average precision, recall, F1: ({:.6}, {:.6}, {:.6})",
            self.macro_precision, self.macro_recall, self.macro_fmeasure
        )?;
        writeln!(
            f,
            "Item accuracy: {}/{} => {:.4}",
            self.item_total_correct, self.item_total_num, self.item_accuracy
        )?;
        writeln!(
            f,
            "Sequence accuracy: {}/{} => {:.4}",
            self.inst_total_correct, self.inst_total_num, self.inst_accuracy
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn perfect_prediction() {
        let mut ev = Evaluation::default();
        ev.accumulate(&["B-PER", "I-PER", "O"], &["B-PER", "I-PER", "O"]);
        let est = ev.evaluate();
        assert_eq!(est, Estimation { precision: 1.0, recall: 1.0, fmeasure: 1.0 });
        assert_eq!(ev.sequence_accuracy(), 1.0);
    }

    #[test]
    fn partial_prediction() {
        let mut ev = Evaluation::default();
        ev.accumulate(&["B-PER", "O", "O", "O"], &["O", "O", "O", "O"]);
        let est = ev.evaluate();
        // B-PER: p=0 r=0; O: p=3/4 r=1
        assert!((est.precision - 0.375).abs() < 1e-12);
        assert!((est.recall - 0.5).abs() < 1e-12);
        assert_eq!(ev.item_accuracy(), 0.75);
        assert_eq!(ev.sequence_accuracy(), 0.0);
        let report = ev.to_string();
        assert!(report.contains("Item accuracy: 3/4"));
        assert!(report.contains("Sequence accuracy: 0/1"));
    }

    #[test]
    fn length_mismatch_is_incorrect() {
        let mut ev = Evaluation::default();
        ev.accumulate(&["O", "O"], &["O"]);
        ev.evaluate();
        assert_eq!(ev.item_accuracy(), 1.0);
        assert_eq!(ev.sequence_accuracy(), 0.0);
    }
}
