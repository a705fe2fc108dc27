//! Dispatch operations: create, complete, and query.
//!
//! Each mutation is saved before it returns. If the save fails the mutation
//! is undone, so the in-memory list never runs ahead of the data file.

use jiff::civil::DateTime;

use crate::model::{DispatchRecord, DispatchType, StatusFilter, now};

use super::{Result, Store, StoreError};

impl Store {
    /// Starts a new dispatch and saves.
    ///
    /// `id_override` is trimmed; when it is absent or blank an ID is generated.
    pub fn create(
        &mut self,
        kind: DispatchType,
        id_override: Option<&str>,
        notes: &str,
    ) -> Result<&DispatchRecord> {
        self.create_at(kind, id_override, notes, now())
    }

    fn create_at(
        &mut self,
        kind: DispatchType,
        id_override: Option<&str>,
        notes: &str,
        started_at: DateTime,
    ) -> Result<&DispatchRecord> {
        let counter = self.next_id;
        let id = match id_override.map(str::trim).filter(|id| !id.is_empty()) {
            Some(id) if self.contains_id(id) => {
                return Err(StoreError::DuplicateId(id.to_string()));
            }
            Some(id) => id.to_string(),
            None => self.generate_id()?,
        };

        self.records.push(DispatchRecord::start(
            id,
            kind,
            notes.trim().to_string(),
            started_at,
        ));
        if let Err(e) = self.save() {
            self.records.pop();
            self.next_id = counter;
            return Err(e);
        }

        let index = self.records.len() - 1;
        log::info!("started dispatch {}", self.records[index].id);
        Ok(&self.records[index])
    }

    /// Completes the dispatch at `position` among the in-progress ones and saves.
    ///
    /// `position` counts from 0 within [`StatusFilter::InProgress`], not within
    /// the full list. The selected dispatch is then looked up by ID.
    pub fn complete(&mut self, position: usize) -> Result<&DispatchRecord> {
        self.complete_at(position, now())
    }

    fn complete_at(&mut self, position: usize, at: DateTime) -> Result<&DispatchRecord> {
        let (selected, available) = {
            let in_progress = self.query(StatusFilter::InProgress);
            if in_progress.is_empty() {
                return Err(StoreError::NothingInProgress);
            }
            (
                in_progress.get(position).map(|r| r.id.clone()),
                in_progress.len(),
            )
        };
        let invalid = || StoreError::InvalidSelection {
            position,
            available,
        };
        let id = selected.ok_or_else(invalid)?;
        let index = self
            .records
            .iter()
            .position(|r| r.id == id)
            .ok_or_else(invalid)?;

        let previous = self.records[index].clone();
        self.records[index].complete(at);
        if let Err(e) = self.save() {
            self.records[index] = previous;
            return Err(e);
        }

        log::info!("completed dispatch {id}");
        Ok(&self.records[index])
    }

    /// Dispatches passing `filter`, in the order they were created.
    pub fn query(&self, filter: StatusFilter) -> Vec<&DispatchRecord> {
        self.records
            .iter()
            .filter(|r| filter.matches(r.status))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::HashSet;
    use std::fs;

    use jiff::civil::date;
    use tempfile::TempDir;

    use crate::model::DispatchStatus;
    use crate::storage::LoadOutcome;

    fn test_store() -> (TempDir, Store) {
        let dir = TempDir::new().unwrap();
        let (store, _) = Store::open(dir.path().join("data.json"), "INT").unwrap();
        (dir, store)
    }

    fn ids(store: &Store, filter: StatusFilter) -> Vec<String> {
        store.query(filter).iter().map(|r| r.id.clone()).collect()
    }

    #[test]
    fn create_on_empty_store_generates_first_id() {
        let (_dir, mut store) = test_store();

        let record = store.create(DispatchType::MercadoLibre, None, "").unwrap();

        assert_eq!(record.id, "INT-001");
        assert_eq!(record.kind, DispatchType::MercadoLibre);
        assert_eq!(record.status, DispatchStatus::InProgress);
        assert!(record.started_at.is_some());
        assert_eq!(record.finished_at, None);
    }

    #[test]
    fn create_saves_immediately() {
        let (dir, mut store) = test_store();

        store.create(DispatchType::Flex, None, "Urgent").unwrap();

        let (reloaded, report) = Store::open(dir.path().join("data.json"), "INT").unwrap();
        assert_eq!(report.outcome, LoadOutcome::Loaded { records: 1 });
        assert_eq!(reloaded.query(StatusFilter::All)[0].notes, "Urgent");
    }

    #[test]
    fn create_uses_trimmed_override() {
        let (_dir, mut store) = test_store();

        let record = store
            .create(DispatchType::Flex, Some("  ML-4455  "), " notes ")
            .unwrap();

        assert_eq!(record.id, "ML-4455");
        assert_eq!(record.notes, "notes");
        assert_eq!(store.next_id, 1);
    }

    #[test]
    fn blank_override_generates_id() {
        let (_dir, mut store) = test_store();

        let record = store.create(DispatchType::Flex, Some("   "), "").unwrap();

        assert_eq!(record.id, "INT-001");
    }

    #[test]
    fn duplicate_override_is_rejected_without_changes() {
        let (dir, mut store) = test_store();
        store.create(DispatchType::Flex, Some("ML-1"), "").unwrap();
        let saved = fs::read_to_string(dir.path().join("data.json")).unwrap();

        let err = store
            .create(DispatchType::Bluexpress, Some("ML-1"), "")
            .unwrap_err();

        assert!(matches!(err, StoreError::DuplicateId(ref id) if id == "ML-1"));
        assert_eq!(ids(&store, StatusFilter::All), vec!["ML-1"]);
        assert_eq!(
            fs::read_to_string(dir.path().join("data.json")).unwrap(),
            saved
        );
    }

    #[test]
    fn ids_stay_unique_across_overrides_and_generation() {
        let (_dir, mut store) = test_store();
        store.create(DispatchType::Flex, None, "").unwrap();
        store.create(DispatchType::Flex, Some("INT-002"), "").unwrap();
        store.create(DispatchType::Flex, None, "").unwrap();
        store.create(DispatchType::Flex, Some("INT-010"), "").unwrap();
        assert!(store.create(DispatchType::Flex, Some("INT-003"), "").is_err());
        for _ in 0..8 {
            store.create(DispatchType::Flex, None, "").unwrap();
        }

        let all = ids(&store, StatusFilter::All);
        let unique: HashSet<&String> = all.iter().collect();
        assert_eq!(all.len(), 12);
        assert_eq!(unique.len(), all.len());
        assert_eq!(all[2], "INT-003");
        assert_eq!(all[3], "INT-010");
        assert_eq!(all.last().unwrap(), "INT-012");
    }

    #[test]
    fn failed_create_save_is_rolled_back() {
        let (dir, mut store) = test_store();
        fs::create_dir(dir.path().join("data.json")).unwrap();

        let err = store.create(DispatchType::Flex, None, "").unwrap_err();

        assert!(matches!(err, StoreError::Write { .. }));
        assert!(store.query(StatusFilter::All).is_empty());
        assert_eq!(store.next_id, 1);
    }

    #[test]
    fn complete_single_in_progress_record() {
        let (_dir, mut store) = test_store();
        store.create(DispatchType::Flex, None, "").unwrap();

        let record = store.complete(0).unwrap();

        assert_eq!(record.status, DispatchStatus::Completed);
        let finished_at = record.finished_at.unwrap();
        assert!(finished_at >= record.started_at.unwrap());
    }

    #[test]
    fn complete_selects_within_in_progress_subset() {
        let (_dir, mut store) = test_store();
        for id in ["A", "B", "C", "D"] {
            store.create(DispatchType::Flex, Some(id), "").unwrap();
        }
        store.complete(1).unwrap(); // B

        // In progress is now [A, C, D]; position 1 is C, not the raw index 1 (B).
        let record = store.complete(1).unwrap();

        assert_eq!(record.id, "C");
        assert_eq!(ids(&store, StatusFilter::InProgress), vec!["A", "D"]);
        assert_eq!(ids(&store, StatusFilter::Completed), vec!["B", "C"]);
    }

    #[test]
    fn complete_clamps_finish_to_start() {
        let (_dir, mut store) = test_store();
        let started_at = date(2030, 1, 1).at(9, 0, 0, 0);
        store
            .create_at(DispatchType::Flex, None, "", started_at)
            .unwrap();

        let record = store
            .complete_at(0, date(2029, 12, 31).at(9, 0, 0, 0))
            .unwrap();

        assert_eq!(record.finished_at, Some(started_at));
    }

    #[test]
    fn complete_with_nothing_in_progress_fails() {
        let (_dir, mut store) = test_store();
        assert!(matches!(
            store.complete(0).unwrap_err(),
            StoreError::NothingInProgress
        ));

        store.create(DispatchType::Flex, None, "").unwrap();
        store.complete(0).unwrap();

        assert!(matches!(
            store.complete(0).unwrap_err(),
            StoreError::NothingInProgress
        ));
    }

    #[test]
    fn complete_out_of_range_fails_without_changes() {
        let (_dir, mut store) = test_store();
        store.create(DispatchType::Flex, None, "").unwrap();

        let err = store.complete(1).unwrap_err();

        assert!(matches!(
            err,
            StoreError::InvalidSelection {
                position: 1,
                available: 1
            }
        ));
        assert_eq!(err.to_string(), "selection 2 is out of range: 1 dispatch(es) in progress");
        assert_eq!(ids(&store, StatusFilter::InProgress), vec!["INT-001"]);
    }

    #[test]
    fn failed_complete_save_is_rolled_back() {
        let (dir, mut store) = test_store();
        store.create(DispatchType::Flex, None, "").unwrap();
        let path = dir.path().join("data.json");
        fs::remove_file(&path).unwrap();
        fs::create_dir(&path).unwrap();

        let err = store.complete(0).unwrap_err();

        assert!(matches!(err, StoreError::Write { .. }));
        let record = store.query(StatusFilter::All)[0];
        assert_eq!(record.status, DispatchStatus::InProgress);
        assert_eq!(record.finished_at, None);
    }

    #[test]
    fn finish_time_set_only_when_completed() {
        let (_dir, mut store) = test_store();
        for _ in 0..5 {
            store.create(DispatchType::Bluexpress, None, "").unwrap();
        }
        store.complete(0).unwrap();
        store.complete(2).unwrap();

        for record in store.query(StatusFilter::All) {
            assert_eq!(
                record.finished_at.is_some(),
                record.status == DispatchStatus::Completed
            );
        }
    }

    #[test]
    fn query_preserves_insertion_order_and_is_repeatable() {
        let (_dir, mut store) = test_store();
        for id in ["Z", "A", "M"] {
            store.create(DispatchType::Flex, Some(id), "").unwrap();
        }
        store.complete(1).unwrap();

        let first = ids(&store, StatusFilter::All);
        let second = ids(&store, StatusFilter::All);

        assert_eq!(first, vec!["Z", "A", "M"]);
        assert_eq!(first, second);
        assert_eq!(ids(&store, StatusFilter::InProgress), vec!["Z", "M"]);
        assert_eq!(ids(&store, StatusFilter::Completed), vec!["A"]);
    }
}
