//! The class histogram and its derived views.

use crate::criteria::Criteria;
use crate::entry::HistogramEntry;
use crate::ordered_map::{OrderedMap, Values};
use std::fmt;
use tracing::debug;

/// Header line of the CSV report form.
pub const CSV_HEADER: &str = "class,instances,size";

/// Per-class memory usage, keyed by canonical class name.
///
/// Iteration follows insertion order. Adding a class that is already present
/// replaces its counters in place. Derived histograms ([`diff`](Self::diff),
/// [`filter`](Self::filter)) are built from entries sorted by size, largest
/// first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryHistogram {
    entries: OrderedMap<String, HistogramEntry>,
}

impl MemoryHistogram {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entry, replacing any entry with the same class name.
    pub fn add(&mut self, entry: HistogramEntry) {
        self.entries.put(entry.class_name().to_string(), entry);
    }

    pub fn get(&self, class_name: &str) -> Option<&HistogramEntry> {
        self.entries.get(class_name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> Values<'_, String, HistogramEntry> {
        self.entries.values()
    }

    /// Sum of bytes over all entries.
    pub fn total_bytes(&self) -> i64 {
        self.iter().map(HistogramEntry::bytes).sum()
    }

    /// Sum of instances over all entries.
    pub fn total_instances(&self) -> i64 {
        self.iter().map(HistogramEntry::instances).sum()
    }

    /// Entries selected by any of the criteria, largest first.
    ///
    /// Each criterion contributes its own matches, so an entry selected by
    /// two criteria appears twice.
    pub fn matching(&self, criteria: &[Criteria]) -> Vec<HistogramEntry> {
        let mut selected = Vec::new();
        for criterion in criteria {
            match criterion {
                Criteria::Exact(name) => selected.extend(self.get(name).cloned()),
                Criteria::Type(type_ref) => {
                    selected.extend(self.get(type_ref.canonical_name()).cloned())
                }
                Criteria::Prefix(_) | Criteria::Pattern(_) => selected.extend(
                    self.iter()
                        .filter(|entry| criterion.matches(entry.class_name()))
                        .cloned(),
                ),
            }
        }
        selected.sort_by(HistogramEntry::cmp_by_bytes_desc);
        selected
    }

    /// A new histogram with the entries selected by any of the criteria,
    /// largest first.
    pub fn filter(&self, criteria: &[Criteria]) -> MemoryHistogram {
        self.matching(criteria).into_iter().collect()
    }

    /// Per-class change from `reference` to `self`, largest growth first.
    ///
    /// - classes in both: the difference, omitted when the byte count did not
    ///   change
    /// - classes only in `self`: the entry as is
    /// - classes only in `reference`: the entry negated
    pub fn diff(&self, reference: &MemoryHistogram) -> MemoryHistogram {
        let mut changes = Vec::with_capacity(self.len());

        for entry in self.iter() {
            match reference.get(entry.class_name()) {
                Some(before) => {
                    let bytes = entry.bytes() - before.bytes();
                    if bytes != 0 {
                        changes.push(HistogramEntry::new(
                            entry.class_name(),
                            entry.instances() - before.instances(),
                            bytes,
                        ));
                    }
                }
                None => changes.push(entry.clone()),
            }
        }

        changes.extend(
            reference
                .iter()
                .filter(|before| self.get(before.class_name()).is_none())
                .map(HistogramEntry::negated),
        );

        changes.sort_by(HistogramEntry::cmp_by_bytes_desc);

        debug!(
            current = self.len(),
            reference = reference.len(),
            changed = changes.len(),
            "computed histogram diff"
        );

        changes.into_iter().collect()
    }

    /// The first `n` entries in iteration order.
    pub fn top(&self, n: usize) -> MemoryHistogram {
        self.iter().take(n).cloned().collect()
    }

    /// A copy sorted by size, largest first.
    pub fn sorted(&self) -> MemoryHistogram {
        let mut entries: Vec<HistogramEntry> = self.iter().cloned().collect();
        entries.sort_by(HistogramEntry::cmp_by_bytes_desc);
        entries.into_iter().collect()
    }

    /// One `class,instances,size` row per entry.
    pub fn lines(&self) -> Vec<String> {
        self.iter().map(HistogramEntry::to_string).collect()
    }
}

impl FromIterator<HistogramEntry> for MemoryHistogram {
    fn from_iter<I: IntoIterator<Item = HistogramEntry>>(iter: I) -> Self {
        let mut histogram = MemoryHistogram::new();
        histogram.extend(iter);
        histogram
    }
}

impl Extend<HistogramEntry> for MemoryHistogram {
    fn extend<I: IntoIterator<Item = HistogramEntry>>(&mut self, iter: I) {
        for entry in iter {
            self.add(entry);
        }
    }
}

impl<'a> IntoIterator for &'a MemoryHistogram {
    type Item = &'a HistogramEntry;
    type IntoIter = Values<'a, String, HistogramEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// The header line, then the entry rows separated by newlines. An empty
/// histogram renders as the header followed by a newline.
impl fmt::Display for MemoryHistogram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{CSV_HEADER}")?;
        for (idx, entry) in self.iter().enumerate() {
            if idx > 0 {
                f.write_str("\n")?;
            }
            write!(f, "{entry}")?;
        }
        Ok(())
    }
}
