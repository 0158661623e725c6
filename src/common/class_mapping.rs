use anyhow::{bail, Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use crate::utils;

/// Fixed enumeration of the classifier's output slots.
///
/// Index `i` is class id `i`. The last slot is always the background class,
/// which the classifier reserves and the assembler never reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassMapping {
    names: Vec<String>,
}

impl ClassMapping {
    /// Builds a mapping from foreground class names. The background slot is appended.
    pub fn new(foreground: &[&str]) -> Result<Self> {
        if foreground.is_empty() {
            bail!("A class mapping needs at least one foreground class.");
        }
        let mut names: Vec<String> = foreground.iter().map(|x| x.to_string()).collect();
        names.push("bg".to_string());
        Ok(Self { names })
    }

    /// Builds a mapping from every classifier slot, background last.
    pub fn from_names(names: Vec<String>) -> Result<Self> {
        if names.len() < 2 {
            bail!(
                "A class mapping needs at least one foreground class and the background class, got {} names.",
                names.len()
            );
        }
        Ok(Self { names })
    }

    /// Reads one class name per line; the background class must be the last line.
    pub fn from_labels_file(path: &str) -> Result<Self> {
        let names = utils::file_to_vec(path.to_string())
            .with_context(|| format!("Failed to read labels file {path}"))?
            .into_iter()
            .map(|x| x.trim().to_string())
            .filter(|x| !x.is_empty())
            .collect();
        Self::from_names(names)
    }

    /// Parses a `{'name': id, ...}` dictionary string, the form in which
    /// training configurations record their class mapping.
    ///
    /// Ids must cover `0..n` exactly. The highest id is the background class.
    pub fn from_dict_str(dict: &str) -> Result<Self> {
        let re = Regex::new(r#"['"]([^'"]+)['"]\s*:\s*(\d+)"#)?;
        let mut pairs: Vec<(usize, String)> = Vec::new();
        for (_, [name, id]) in re.captures_iter(dict).map(|c| c.extract()) {
            pairs.push((id.parse()?, name.to_string()));
        }
        pairs.sort_by_key(|(id, _)| *id);

        for (expected, (id, name)) in pairs.iter().enumerate() {
            if *id != expected {
                bail!("Class ids are not contiguous: `{name}` has id {id}, expected {expected}.");
            }
        }
        Self::from_names(pairs.into_iter().map(|(_, name)| name).collect())
    }

    /// Number of classifier slots, background included.
    pub fn num_classes(&self) -> usize {
        self.names.len()
    }

    /// Number of reportable classes.
    pub fn num_foreground(&self) -> usize {
        self.names.len() - 1
    }

    pub fn background_id(&self) -> usize {
        self.names.len() - 1
    }

    pub fn is_background(&self, class_id: usize) -> bool {
        class_id == self.background_id()
    }

    pub fn name(&self, class_id: usize) -> Option<&str> {
        self.names.get(class_id).map(|x| x.as_str())
    }

    pub fn id_of(&self, name: &str) -> Option<usize> {
        self.foreground_names().iter().position(|x| x == name)
    }

    pub fn foreground_names(&self) -> &[String] {
        &self.names[..self.background_id()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dict_string_is_sorted_by_id() {
        let mapping = ClassMapping::from_dict_str(
            "{'bourdon_des_jardins': 1, 'abeille_mellifere': 0, 'bg': 2}",
        ).unwrap();
        assert_eq!(mapping.num_classes(), 3);
        assert_eq!(mapping.name(0), Some("abeille_mellifere"));
        assert_eq!(mapping.background_id(), 2);
        assert_eq!(mapping.id_of("bourdon_des_jardins"), Some(1));
        assert_eq!(mapping.id_of("bg"), None);
    }

    #[test]
    fn gaps_in_ids_are_rejected() {
        assert!(ClassMapping::from_dict_str("{'a': 0, 'bg': 2}").is_err());
    }

    #[test]
    fn background_is_appended() {
        let mapping = ClassMapping::new(&["a", "b"]).unwrap();
        assert_eq!(mapping.foreground_names(), &["a".to_string(), "b".to_string()]);
        assert!(mapping.is_background(2));
    }
}
