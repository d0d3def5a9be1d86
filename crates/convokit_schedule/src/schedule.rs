//! Per-professor assignment output models.

use std::collections::HashMap;

use serde::Serialize;
use serde::ser::{SerializeMap, Serializer};

/// One resolved exam-duty assignment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct AssignmentRecord {
    /// Subject of the session.
    pub subject: String,
    /// Exam date (canonical text).
    pub date: String,
    /// Exam time (canonical text).
    pub time: String,
    /// Academic level.
    pub level: String,
    /// Room/location code, only under location-coded markers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

/// Professor name -> ordered assignments.
///
/// Professors iterate in first-encounter order; records in push order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScheduleIndex {
    l_entries: Vec<(String, Vec<AssignmentRecord>)>,
    dict_positions: HashMap<String, usize>,
}

impl ScheduleIndex {
    /// Empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `record` to `professor`'s list, creating it on first encounter.
    pub fn push(&mut self, professor: impl Into<String>, record: AssignmentRecord) {
        let c_professor = professor.into();
        if let Some(n_pos) = self.dict_positions.get(&c_professor) {
            self.l_entries[*n_pos].1.push(record);
            return;
        }
        self.dict_positions
            .insert(c_professor.clone(), self.l_entries.len());
        self.l_entries.push((c_professor, vec![record]));
    }

    /// Assignments of `professor`.
    pub fn get(&self, professor: &str) -> Option<&[AssignmentRecord]> {
        self.dict_positions
            .get(professor)
            .map(|n_pos| self.l_entries[*n_pos].1.as_slice())
    }

    /// Whether `professor` has at least one assignment.
    pub fn contains(&self, professor: &str) -> bool {
        self.dict_positions.contains_key(professor)
    }

    /// `(professor, assignments)` pairs in first-encounter order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[AssignmentRecord])> {
        self.l_entries
            .iter()
            .map(|(professor, records)| (professor.as_str(), records.as_slice()))
    }

    /// Professor names in first-encounter order.
    pub fn professors(&self) -> Vec<&str> {
        self.l_entries.iter().map(|(p, _)| p.as_str()).collect()
    }

    /// Number of professors.
    pub fn len(&self) -> usize {
        self.l_entries.len()
    }

    /// `true` when no assignment was found.
    pub fn is_empty(&self) -> bool {
        self.l_entries.is_empty()
    }

    /// Total number of records across professors.
    pub fn count_records(&self) -> usize {
        self.l_entries.iter().map(|(_, records)| records.len()).sum()
    }

    /// Whether any record carries a location.
    pub fn has_locations(&self) -> bool {
        self.l_entries
            .iter()
            .flat_map(|(_, records)| records.iter())
            .any(|record| record.location.is_some())
    }
}

impl Serialize for ScheduleIndex {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.l_entries.len()))?;
        for (professor, records) in &self.l_entries {
            map.serialize_entry(professor, records)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(subject: &str) -> AssignmentRecord {
        AssignmentRecord {
            subject: subject.to_string(),
            date: "2024-06-10".to_string(),
            time: "08:30".to_string(),
            level: "S2".to_string(),
            location: None,
        }
    }

    #[test]
    fn push_accumulates_repeated_names_in_order() {
        let mut schedule = ScheduleIndex::new();
        schedule.push("Dr. B", record("Algebra"));
        schedule.push("Dr. A", record("Physics"));
        schedule.push("Dr. B", record("Analysis"));

        assert_eq!(schedule.professors(), vec!["Dr. B", "Dr. A"]);
        let l_subjects: Vec<&str> = schedule
            .get("Dr. B")
            .expect("Dr. B")
            .iter()
            .map(|r| r.subject.as_str())
            .collect();
        assert_eq!(l_subjects, vec!["Algebra", "Analysis"]);
        assert_eq!(schedule.count_records(), 3);
        assert!(!schedule.has_locations());
    }

    #[test]
    fn serializes_as_ordered_object() {
        let mut schedule = ScheduleIndex::new();
        schedule.push("Zed", record("Chem"));
        schedule.push("Abe", record("Bio"));
        let txt = serde_json::to_string(&schedule).expect("json");
        assert!(txt.starts_with("{\"Zed\":[{\"subject\":\"Chem\""));
        assert!(!txt.contains("location"));
    }
}
