//! Targeted application of change events to the in-memory collection.
//!
//! Each entity remembers the timestamp of the last write applied to it
//! (`updated_at` for live rows, the commit time for deletions). Events older
//! than that are dropped, so a late echo can neither undo a newer local write
//! nor resurrect a deleted row.

use std::collections::HashMap;

use chrono::{
    DateTime,
    Duration,
    Utc,
};

use crate::core::{
    models::{
        CardRow,
        SetRow,
    },
    Card,
    ChangeEvent,
    ChangeKind,
    Row,
    Table,
    UserId,
    VocabSet,
};

/// How long a deletion keeps blocking late echoes once a fetch has
/// confirmed the row is gone.
pub const TOMBSTONE_TTL: Duration = Duration::minutes(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Version {
    Live(DateTime<Utc>),
    Deleted(DateTime<Utc>),
}

impl Version {
    fn at(&self) -> DateTime<Utc> {
        match self {
            Version::Live(at) | Version::Deleted(at) => *at,
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct VersionMap {
    entries: HashMap<(Table, String), Version>,
}

impl VersionMap {
    pub fn get(&self, table: Table, id: &str) -> Option<Version> {
        self.entries.get(&(table, id.to_string())).copied()
    }

    /// True when a write at `at` is older than what is already applied.
    pub fn is_stale(&self, table: Table, id: &str, at: DateTime<Utc>) -> bool {
        self.get(table, id).map_or(false, |known| known.at() > at)
    }

    pub fn record_live(&mut self, table: Table, id: &str, at: DateTime<Utc>) {
        self.record(table, id, Version::Live(at));
    }

    pub fn record_deleted(&mut self, table: Table, id: &str, at: DateTime<Utc>) {
        self.record(table, id, Version::Deleted(at));
    }

    fn record(&mut self, table: Table, id: &str, version: Version) {
        let key = (table, id.to_string());
        match self.entries.get(&key) {
            Some(known) if known.at() > version.at() => {}
            _ => {
                self.entries.insert(key, version);
            }
        }
    }

    /// Versions for a freshly fetched collection. Tombstones younger than
    /// [`TOMBSTONE_TTL`] are kept, older ones are dropped.
    pub fn rebuild(&mut self, rows: &[SetRow], now: DateTime<Utc>) {
        let mut entries: HashMap<(Table, String), Version> = self
            .entries
            .drain()
            .filter(|(_, version)| match version {
                Version::Deleted(at) => now - *at < TOMBSTONE_TTL,
                Version::Live(_) => false,
            })
            .collect();

        for set in rows {
            entries.insert((Table::Sets, set.id.clone()), Version::Live(set.updated_at));
            for card in set.cards.iter().flatten() {
                entries.insert((Table::Cards, card.id.clone()), Version::Live(card.updated_at));
            }
        }

        self.entries = entries;
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    Applied,
    /// Stale, duplicate, or out of scope. Nothing changed.
    Ignored,
    /// Not enough information to merge. Reload the collection.
    NeedsRefetch,
}

/// Inserts the set at the front or renames it in place. Cards already
/// mirrored locally are kept; embedded cards are used only for new sets.
pub fn upsert_set(sets: &mut Vec<VocabSet>, row: &SetRow) -> bool {
    match sets.iter_mut().find(|set| set.id == row.id) {
        Some(existing) => {
            let changed = existing.name != row.name;
            existing.name = row.name.clone();
            changed
        }
        None => {
            sets.insert(0, VocabSet::from(row.clone()));
            true
        }
    }
}

pub fn remove_set(sets: &mut Vec<VocabSet>, set_id: &str) -> bool {
    let before = sets.len();
    sets.retain(|set| set.id != set_id);
    sets.len() != before
}

/// Appends or replaces the card in its owning set, removing it from any
/// other set first. Returns `None` when the owner is not loaded.
pub fn upsert_card(sets: &mut [VocabSet], row: &CardRow) -> Option<bool> {
    if !sets.iter().any(|set| set.id == row.set_id) {
        return None;
    }

    for set in sets.iter_mut().filter(|set| set.id != row.set_id) {
        set.cards.retain(|card| card.id != row.id);
    }

    let owner = sets.iter_mut().find(|set| set.id == row.set_id)?;
    let card = Card::from(row.clone());
    match owner.cards.iter_mut().find(|existing| existing.id == card.id) {
        Some(existing) if *existing == card => Some(false),
        Some(existing) => {
            *existing = card;
            Some(true)
        }
        None => {
            owner.cards.push(card);
            Some(true)
        }
    }
}

pub fn remove_card(sets: &mut [VocabSet], card_id: &str) -> bool {
    let mut removed = false;
    for set in sets.iter_mut() {
        let before = set.cards.len();
        set.cards.retain(|card| card.id != card_id);
        removed |= set.cards.len() != before;
    }
    removed
}

pub fn apply_event(
    sets: &mut Vec<VocabSet>,
    versions: &mut VersionMap,
    scope: Option<&UserId>,
    event: &ChangeEvent,
) -> MergeOutcome {
    match (event.table, event.kind) {
        (Table::Sets, ChangeKind::Insert | ChangeKind::Update) => match &event.record {
            Some(Row::Set(row)) => apply_set_write(sets, versions, scope, row),
            _ => MergeOutcome::NeedsRefetch,
        },
        (Table::Cards, ChangeKind::Insert | ChangeKind::Update) => match &event.record {
            Some(Row::Card(row)) => apply_card_write(sets, versions, row),
            _ => MergeOutcome::NeedsRefetch,
        },
        (table, ChangeKind::Delete) => {
            let Some(id) = event.id() else {
                return MergeOutcome::NeedsRefetch;
            };
            if versions.is_stale(table, id, event.commit_timestamp) {
                return MergeOutcome::Ignored;
            }
            versions.record_deleted(table, id, event.commit_timestamp);
            let removed = match table {
                Table::Sets => remove_set(sets, id),
                Table::Cards => remove_card(sets, id),
            };
            if removed {
                MergeOutcome::Applied
            } else {
                MergeOutcome::Ignored
            }
        }
    }
}

fn apply_set_write(
    sets: &mut Vec<VocabSet>,
    versions: &mut VersionMap,
    scope: Option<&UserId>,
    row: &SetRow,
) -> MergeOutcome {
    if versions.is_stale(Table::Sets, &row.id, row.updated_at) {
        return MergeOutcome::Ignored;
    }

    let in_scope = row.user_id.as_deref() == scope.map(|user| user.0.as_str());
    if !in_scope {
        // Another user's set, or one that changed owner under us.
        return if remove_set(sets, &row.id) {
            MergeOutcome::Applied
        } else {
            MergeOutcome::Ignored
        };
    }

    versions.record_live(Table::Sets, &row.id, row.updated_at);
    if upsert_set(sets, row) {
        MergeOutcome::Applied
    } else {
        MergeOutcome::Ignored
    }
}

fn apply_card_write(sets: &mut [VocabSet], versions: &mut VersionMap, row: &CardRow) -> MergeOutcome {
    if versions.is_stale(Table::Cards, &row.id, row.updated_at) {
        return MergeOutcome::Ignored;
    }

    match upsert_card(sets, row) {
        Some(changed) => {
            versions.record_live(Table::Cards, &row.id, row.updated_at);
            if changed {
                MergeOutcome::Applied
            } else {
                MergeOutcome::Ignored
            }
        }
        None => MergeOutcome::NeedsRefetch,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(seconds: i64) -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp(1_700_000_000 + seconds, 0).unwrap()
    }

    fn set_row(id: &str, name: &str, updated: i64) -> SetRow {
        SetRow {
            id: id.to_string(),
            name: name.to_string(),
            user_id: None,
            created_at: at(0),
            updated_at: at(updated),
            cards: None,
        }
    }

    fn card_row(id: &str, set_id: &str, term: &str, updated: i64) -> CardRow {
        CardRow {
            id: id.to_string(),
            set_id: set_id.to_string(),
            term: term.to_string(),
            definition: format!("{term} def"),
            created_at: at(0),
            updated_at: at(updated),
        }
    }

    fn event(table: Table, kind: ChangeKind, record: Option<Row>, old_id: Option<&str>) -> ChangeEvent {
        ChangeEvent {
            table,
            kind,
            record,
            old_id: old_id.map(str::to_string),
            commit_timestamp: at(100),
        }
    }

    fn one_set() -> Vec<VocabSet> {
        vec![VocabSet { id: "s1".to_string(), name: "One".to_string(), cards: Vec::new() }]
    }

    #[test]
    fn set_insert_goes_to_front_and_is_idempotent() {
        let mut sets = one_set();
        let mut versions = VersionMap::default();
        let insert =
            event(Table::Sets, ChangeKind::Insert, Some(Row::Set(set_row("s2", "Two", 5))), None);

        assert_eq!(apply_event(&mut sets, &mut versions, None, &insert), MergeOutcome::Applied);
        assert_eq!(apply_event(&mut sets, &mut versions, None, &insert), MergeOutcome::Ignored);
        assert_eq!(sets.len(), 2);
        assert_eq!(sets[0].id, "s2");
    }

    #[test]
    fn set_update_keeps_cards() {
        let mut sets = one_set();
        sets[0].cards.push(Card::from(card_row("c1", "s1", "a", 1)));
        let mut versions = VersionMap::default();
        let update =
            event(Table::Sets, ChangeKind::Update, Some(Row::Set(set_row("s1", "Renamed", 5))), None);

        apply_event(&mut sets, &mut versions, None, &update);

        assert_eq!(sets[0].name, "Renamed");
        assert_eq!(sets[0].cards.len(), 1);
    }

    #[test]
    fn older_update_is_ignored() {
        let mut sets = one_set();
        let mut versions = VersionMap::default();
        versions.record_live(Table::Sets, "s1", at(10));
        let update =
            event(Table::Sets, ChangeKind::Update, Some(Row::Set(set_row("s1", "Stale", 5))), None);

        assert_eq!(apply_event(&mut sets, &mut versions, None, &update), MergeOutcome::Ignored);
        assert_eq!(sets[0].name, "One");
    }

    #[test]
    fn delete_tombstone_blocks_late_insert() {
        let mut sets = one_set();
        let mut versions = VersionMap::default();
        let delete = event(Table::Sets, ChangeKind::Delete, None, Some("s1"));

        assert_eq!(apply_event(&mut sets, &mut versions, None, &delete), MergeOutcome::Applied);
        assert!(sets.is_empty());

        let late =
            event(Table::Sets, ChangeKind::Insert, Some(Row::Set(set_row("s1", "One", 50))), None);
        assert_eq!(apply_event(&mut sets, &mut versions, None, &late), MergeOutcome::Ignored);
        assert!(sets.is_empty());
    }

    #[test]
    fn card_events_upsert_move_and_remove() {
        let mut sets = one_set();
        sets.insert(0, VocabSet { id: "s2".to_string(), name: "Two".to_string(), cards: Vec::new() });
        let mut versions = VersionMap::default();

        let insert = event(
            Table::Cards,
            ChangeKind::Insert,
            Some(Row::Card(card_row("c1", "s1", "perro", 1))),
            None,
        );
        assert_eq!(apply_event(&mut sets, &mut versions, None, &insert), MergeOutcome::Applied);
        assert_eq!(sets[1].cards.len(), 1);

        let moved = event(
            Table::Cards,
            ChangeKind::Update,
            Some(Row::Card(card_row("c1", "s2", "perro", 2))),
            None,
        );
        assert_eq!(apply_event(&mut sets, &mut versions, None, &moved), MergeOutcome::Applied);
        assert!(sets[1].cards.is_empty());
        assert_eq!(sets[0].cards[0].id, "c1");

        let delete = event(Table::Cards, ChangeKind::Delete, None, Some("c1"));
        assert_eq!(apply_event(&mut sets, &mut versions, None, &delete), MergeOutcome::Applied);
        assert!(sets.iter().all(|set| set.cards.is_empty()));
    }

    #[test]
    fn card_for_unloaded_set_needs_refetch() {
        let mut sets = one_set();
        let mut versions = VersionMap::default();
        let insert = event(
            Table::Cards,
            ChangeKind::Insert,
            Some(Row::Card(card_row("c1", "elsewhere", "x", 1))),
            None,
        );

        assert_eq!(apply_event(&mut sets, &mut versions, None, &insert), MergeOutcome::NeedsRefetch);
    }

    #[test]
    fn payloadless_events_need_refetch() {
        let mut sets = one_set();
        let mut versions = VersionMap::default();

        let update = event(Table::Sets, ChangeKind::Update, None, None);
        let delete = event(Table::Cards, ChangeKind::Delete, None, None);

        assert_eq!(apply_event(&mut sets, &mut versions, None, &update), MergeOutcome::NeedsRefetch);
        assert_eq!(apply_event(&mut sets, &mut versions, None, &delete), MergeOutcome::NeedsRefetch);
    }

    #[test]
    fn out_of_scope_sets_are_not_mirrored() {
        let mut sets = one_set();
        let mut versions = VersionMap::default();
        let mut foreign = set_row("s9", "Theirs", 1);
        foreign.user_id = Some("someone-else".to_string());

        let insert = event(Table::Sets, ChangeKind::Insert, Some(Row::Set(foreign)), None);

        assert_eq!(apply_event(&mut sets, &mut versions, None, &insert), MergeOutcome::Ignored);
        assert_eq!(sets.len(), 1);
    }

    #[test]
    fn rebuild_keeps_tombstones_only() {
        let mut versions = VersionMap::default();
        versions.record_live(Table::Sets, "gone-live", at(1));
        versions.record_deleted(Table::Cards, "dead", at(2));

        let mut row = set_row("s1", "One", 3);
        row.cards = Some(vec![card_row("c1", "s1", "a", 4)]);
        versions.rebuild(&[row], at(10));

        assert_eq!(versions.get(Table::Sets, "gone-live"), None);
        assert_eq!(versions.get(Table::Cards, "dead"), Some(Version::Deleted(at(2))));
        assert_eq!(versions.get(Table::Cards, "c1"), Some(Version::Live(at(4))));
        assert!(versions.is_stale(Table::Sets, "s1", at(3) - Duration::seconds(1)));
    }

    #[test]
    fn rebuild_drops_expired_tombstones() {
        let mut versions = VersionMap::default();
        let now = at(0) + TOMBSTONE_TTL + Duration::seconds(30);
        versions.record_deleted(Table::Cards, "old", at(0));
        versions.record_deleted(Table::Cards, "recent", now - Duration::seconds(60));

        versions.rebuild(&[], now);

        assert_eq!(versions.get(Table::Cards, "old"), None);
        assert_eq!(versions.get(Table::Cards, "recent"), Some(Version::Deleted(now - Duration::seconds(60))));
        assert_eq!(versions.len(), 1);
    }

    #[test]
    fn repeated_rebuilds_do_not_accumulate_tombstones() {
        let mut versions = VersionMap::default();
        for i in 0..50 {
            versions.record_deleted(Table::Cards, &format!("c{i}"), at(i));
        }

        let later = at(50) + TOMBSTONE_TTL;
        versions.rebuild(&[set_row("s1", "One", 60)], later);
        versions.rebuild(&[set_row("s1", "One", 60)], later + Duration::seconds(1));

        assert_eq!(versions.len(), 1);
    }
}
