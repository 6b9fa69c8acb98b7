use crate::common::error::Result;
use crate::common::types::EventRecord;
use crate::normalize::normalize_string;
use std::collections::HashSet;
use std::io::Read;
use std::path::Path;
use tracing::info;

/// Deduplication key: the normalized (name, place) pair. Two records with
/// equal fingerprints are the same real-world event, whatever the source
/// page or phrasing.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint {
    pub name: String,
    pub place: String,
}

impl Fingerprint {
    pub fn of(name: &str, place: &str) -> Self {
        Self {
            name: normalize_string(name),
            place: normalize_string(place),
        }
    }
}

/// Fingerprints of previously captured events, loaded from a user-supplied
/// CSV. Immutable once loaded; used purely as an exclusion filter.
#[derive(Debug, Default)]
pub struct ExistingFingerprintSet {
    prints: HashSet<Fingerprint>,
    names: HashSet<String>,
}

fn is_name_header(header: &str) -> bool {
    let h = header.trim().to_lowercase();
    h == "name" || h == "title" || h.contains("イベント") || h.contains("名称") || h.contains("店名")
}

fn is_place_header(header: &str) -> bool {
    let h = header.trim().to_lowercase();
    h == "place" || h.contains("場所") || h.contains("会場") || h.contains("所在地")
}

impl ExistingFingerprintSet {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_csv_path(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let set = Self::from_reader(file)?;
        info!(count = set.len(), path = %path.display(), "loaded known-event fingerprints");
        Ok(set)
    }

    /// Loads fingerprints from any tabular source with a header row. Columns
    /// are located by fuzzy header matching, so 「イベント名」,「名称」,
    /// `name` and `title` all work; the place column is optional.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);

        let headers = csv_reader.headers()?.clone();
        let name_index = headers.iter().position(is_name_header);
        let place_index = headers.iter().position(is_place_header);

        let mut set = Self::default();
        let Some(name_index) = name_index else {
            // No recognizable name column means nothing to exclude on.
            return Ok(set);
        };

        for row in csv_reader.records() {
            let row = row?;
            let name = row.get(name_index).unwrap_or_default();
            if name.trim().is_empty() {
                continue;
            }
            let place = place_index.and_then(|i| row.get(i)).unwrap_or_default();
            let fingerprint = Fingerprint::of(name, place);
            set.names.insert(fingerprint.name.clone());
            set.prints.insert(fingerprint);
        }
        Ok(set)
    }

    pub fn contains(&self, fingerprint: &Fingerprint) -> bool {
        self.prints.contains(fingerprint)
    }

    /// Name-only membership, for candidates that carry no place at all.
    pub fn contains_name(&self, normalized_name: &str) -> bool {
        self.names.contains(normalized_name)
    }

    pub fn len(&self) -> usize {
        self.prints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prints.is_empty()
    }
}

/// Outcome of offering one record to the deduplicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Accepted,
    /// Empty name after trimming; discarded before any fingerprinting.
    Invalid,
    /// Fingerprint found in the user-supplied known-events set.
    KnownDuplicate,
    /// Fingerprint already accepted earlier in this run.
    RunDuplicate,
}

/// Owns the accepted output and both fingerprint sets for one run.
pub struct Deduplicator {
    existing: ExistingFingerprintSet,
    run_prints: HashSet<Fingerprint>,
    accepted: Vec<EventRecord>,
}

impl Deduplicator {
    pub fn new(existing: ExistingFingerprintSet) -> Self {
        Self {
            existing,
            run_prints: HashSet::new(),
            accepted: Vec::new(),
        }
    }

    /// Offers a record; on acceptance its fingerprint joins the run set and
    /// the record joins the output, in processing order.
    ///
    /// A candidate with no place still matches a known event by name alone —
    /// one source often names the venue while another omits it.
    pub fn offer(&mut self, record: EventRecord) -> Verdict {
        if !record.is_valid() {
            return Verdict::Invalid;
        }
        let fingerprint = Fingerprint::of(&record.name, &record.place);
        if self.existing.contains(&fingerprint) {
            return Verdict::KnownDuplicate;
        }
        if fingerprint.place.is_empty() && self.existing.contains_name(&fingerprint.name) {
            return Verdict::KnownDuplicate;
        }
        if !self.run_prints.insert(fingerprint) {
            return Verdict::RunDuplicate;
        }
        self.accepted.push(record);
        Verdict::Accepted
    }

    pub fn accepted(&self) -> &[EventRecord] {
        &self.accepted
    }

    pub fn into_records(self) -> Vec<EventRecord> {
        self.accepted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn record(name: &str, place: &str) -> EventRecord {
        EventRecord {
            name: name.to_string(),
            place: place.to_string(),
            ..EventRecord::default()
        }
    }

    #[test]
    fn equal_fingerprints_accept_only_the_first() {
        let mut dedup = Deduplicator::new(ExistingFingerprintSet::empty());
        assert_eq!(dedup.offer(record("秋祭り", "渋谷")), Verdict::Accepted);
        // Full-width trailing space and parens collapse to the same key.
        assert_eq!(dedup.offer(record("秋祭り", "渋谷　")), Verdict::RunDuplicate);
        assert_eq!(dedup.offer(record("秋祭り", "（渋谷）")), Verdict::RunDuplicate);
        assert_eq!(dedup.accepted().len(), 1);
    }

    #[test]
    fn empty_names_are_invalid() {
        let mut dedup = Deduplicator::new(ExistingFingerprintSet::empty());
        assert_eq!(dedup.offer(record("  ", "渋谷")), Verdict::Invalid);
        assert!(dedup.accepted().is_empty());
    }

    #[test]
    fn known_fingerprints_are_never_accepted() {
        let csv = "イベント名,場所\n秋祭り,渋谷\n";
        let existing = ExistingFingerprintSet::from_reader(Cursor::new(csv)).unwrap();
        let mut dedup = Deduplicator::new(existing);
        assert_eq!(dedup.offer(record("秋祭り", "渋谷")), Verdict::KnownDuplicate);
        assert_eq!(dedup.offer(record("秋 祭 り", "渋 谷")), Verdict::KnownDuplicate);
        assert_eq!(dedup.offer(record("冬祭り", "渋谷")), Verdict::Accepted);
    }

    #[test]
    fn placeless_candidate_matches_known_event_by_name() {
        let csv = "name,place\n秋祭り,渋谷\n";
        let existing = ExistingFingerprintSet::from_reader(Cursor::new(csv)).unwrap();
        let mut dedup = Deduplicator::new(existing);
        assert_eq!(dedup.offer(record("秋祭り", "")), Verdict::KnownDuplicate);
    }

    #[test]
    fn fuzzy_header_matching_finds_columns() {
        let csv = "公開日,イベント名称,開催場所,メモ\n2025/08/01,秋祭り,渋谷,何か\n";
        let existing = ExistingFingerprintSet::from_reader(Cursor::new(csv)).unwrap();
        assert_eq!(existing.len(), 1);
        assert!(existing.contains(&Fingerprint::of("秋祭り", "渋谷")));
    }

    #[test]
    fn missing_name_column_loads_nothing() {
        let csv = "日付,値段\n2025/08/01,500\n";
        let existing = ExistingFingerprintSet::from_reader(Cursor::new(csv)).unwrap();
        assert!(existing.is_empty());
    }
}
