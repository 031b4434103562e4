use std::collections::BTreeMap;

use super::filename::parse_storage_key;
use crate::models::{InstrumentKey, StorageObjectKey};

const COMBINED_MARKER: &str = "combined";

/// How keys are partitioned before picking the newest one per group
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupBy {
    Symbol,
    SymbolAndLeverage,
}

impl GroupBy {
    fn by_leverage(self) -> bool {
        matches!(self, GroupBy::SymbolAndLeverage)
    }
}

/// Drop keys that are not spreadsheets with the expected extension, and
/// combined multi-instrument exports. Runs on raw listing output, before selection.
pub fn filter_candidate_keys(keys: &[String], extension: &str) -> Vec<String> {
    let extension = extension.to_lowercase();
    keys.iter()
        .filter(|key| {
            let lower = key.to_lowercase();
            lower.ends_with(&extension) && !lower.contains(COMBINED_MARKER)
        })
        .cloned()
        .collect()
}

/// Keep one key per group: the one with the latest period.
///
/// Keys that do not decompose are skipped. On an exact period tie the key
/// appearing later in `keys` wins. Output is ordered by group key.
pub fn select_canonical(keys: &[String], group_by: GroupBy) -> Vec<StorageObjectKey> {
    let mut latest: BTreeMap<InstrumentKey, StorageObjectKey> = BTreeMap::new();

    for key in keys {
        let parsed = match parse_storage_key(key, group_by.by_leverage()) {
            Ok(parsed) => parsed,
            Err(reason) => {
                log::debug!("Skipping unselectable key {}: {}", key, reason);
                continue;
            }
        };

        let group = InstrumentKey::of(&parsed, group_by.by_leverage());
        match latest.get(&group) {
            Some(current) if parsed.period < current.period => {}
            _ => {
                latest.insert(group, parsed);
            }
        }
    }

    latest.into_values().collect()
}

/// Key-only form of [`select_canonical`]
pub fn select(keys: &[String], group_by: GroupBy) -> Vec<String> {
    select_canonical(keys, group_by)
        .into_iter()
        .map(|selected| selected.key)
        .collect()
}
