use std::{
    convert::TryFrom,
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
};

use crate::error::{Error, Result};

/// One labelled sequence: item attributes and their reference labels.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Instance {
    pub items: Vec<Vec<String>>,
    pub labels: Vec<String>,
}

impl Instance {
    pub fn push(&mut self, item: Vec<String>, label: String) {
        self.items.push(item);
        self.labels.push(label);
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }
}

/// Sequences read from `label<TAB>attr<TAB>attr...` lines, separated by blank lines.
#[derive(Debug, Default)]
pub struct Dataset {
    pub instances: Vec<Instance>,
}

impl Dataset {
    pub fn read<R: BufRead>(reader: R) -> Result<Self> {
        let mut ds = Self::default();
        let mut seq = Instance::default();
        for line in reader.lines() {
            let line = line?;
            let line = line.trim_end_matches('\r');
            if line.is_empty() {
                if !seq.is_empty() {
                    ds.instances.push(std::mem::take(&mut seq));
                }
            } else if let Some((label, attrs)) = line.split_once('\t') {
                let item = attrs.split('\t').filter(|a| !a.is_empty()).map(String::from).collect();
                seq.push(item, label.to_string());
            } else {
                log::warn!("invalid line: {line}");
            }
        }
        if !seq.is_empty() {
            ds.instances.push(seq);
        }
        Ok(ds)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::try_from(File::open(path)?)
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    pub fn max_length(&self) -> usize {
        self.instances.iter().map(|x| x.len()).max().unwrap_or_default()
    }

    pub fn total_items(&self) -> usize {
        self.instances.iter().map(|x| x.len()).sum()
    }
}

impl TryFrom<File> for Dataset {
    type Error = Error;

    fn try_from(file: File) -> Result<Self> {
        Self::read(BufReader::new(file))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DATA: &str = "B-PER\tw=John\tcap\nI-PER\tw=Smith\tcap\nO\tw=walks\n\n\
                        O\tw=it\nbroken line\nO\tw=rains";

    #[test]
    fn reads_sequences() {
        let ds = Dataset::read(DATA.as_bytes()).unwrap();
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.max_length(), 3);
        assert_eq!(ds.total_items(), 5);
        assert_eq!(ds.instances[0].labels, ["B-PER", "I-PER", "O"]);
        assert_eq!(ds.instances[0].items[0], ["w=John", "cap"]);
        assert_eq!(ds.instances[1].items[1], ["w=rains"]);
    }

    #[test]
    fn blank_lines_do_not_create_empty_sequences() {
        let ds = Dataset::read("\n\nO\tx\n\n\n\n".as_bytes()).unwrap();
        assert_eq!(ds.len(), 1);
    }

    #[test]
    fn label_without_attributes() {
        let ds = Dataset::read("O\t\n".as_bytes()).unwrap();
        assert_eq!(ds.instances[0].items[0], Vec::<String>::new());
    }
}
