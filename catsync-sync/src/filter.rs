//! Include/exclude filtering of catalog full names.

/// Decides which full names are mirrored.
///
/// Entries match a name and everything beneath it: `cat` covers `cat`,
/// `cat.sch` and `cat.sch.t1`, but not `catalog`. A non-empty include list
/// takes precedence over the exclude list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameFilter {
    include: Vec<String>,
    exclude: Vec<String>,
}

fn covers(entry: &str, full_name: &str) -> bool {
    full_name == entry
        || full_name
            .strip_prefix(entry)
            .is_some_and(|rest| rest.starts_with('.'))
}

impl NameFilter {
    pub fn new(include: Vec<String>, exclude: Vec<String>) -> Self {
        let clean = |names: Vec<String>| -> Vec<String> {
            names
                .into_iter()
                .map(|n| n.trim().to_string())
                .filter(|n| !n.is_empty())
                .collect()
        };
        Self {
            include: clean(include),
            exclude: clean(exclude),
        }
    }

    /// A filter that catalogues everything.
    pub fn allow_all() -> Self {
        Self::default()
    }

    /// Whether `full_name`, or one of its ancestors, is selected.
    pub fn is_catalogued(&self, full_name: &str) -> bool {
        if !self.include.is_empty() {
            return self.include.iter().any(|entry| covers(entry, full_name));
        }
        !self.exclude.iter().any(|entry| covers(entry, full_name))
    }

    /// Whether a sweep should visit `full_name`: it is catalogued, or it is
    /// a container on the way to an included name.
    pub fn admits(&self, full_name: &str) -> bool {
        self.is_catalogued(full_name)
            || self
                .include
                .iter()
                .any(|entry| covers(full_name, entry) && entry != full_name)
    }
}
