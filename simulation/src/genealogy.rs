//! Lineage records: births, deaths and pruning of forgotten ancestors

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::debug;

use crate::components::PersonId;

#[derive(Debug, Clone, Serialize)]
pub struct LineageRecord {
    pub id: PersonId,
    pub name: String,
    pub birth_turn: i64,
    pub death_turn: Option<i64>,
    /// `None` for founders.
    pub mother: Option<PersonId>,
    /// In birth order.
    pub children: Vec<PersonId>,
}

impl LineageRecord {
    pub fn is_alive(&self) -> bool {
        self.death_turn.is_none()
    }

    pub fn age_at(&self, turn: i64) -> i64 {
        turn - self.birth_turn
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Genealogy {
    records: BTreeMap<PersonId, LineageRecord>,
}

impl Genealogy {
    pub fn new() -> Self {
        Self::default()
    }

    /// A person placed at world generation, backdated by their age.
    pub fn register_founder(&mut self, id: PersonId, name: String, age: u32, turn: i64) {
        self.records.insert(
            id,
            LineageRecord {
                id,
                name,
                birth_turn: turn - i64::from(age),
                death_turn: None,
                mother: None,
                children: Vec::new(),
            },
        );
    }

    pub fn record_birth(&mut self, child: PersonId, name: String, mother: PersonId, turn: i64) {
        if let Some(record) = self.records.get_mut(&mother) {
            record.children.push(child);
        }
        self.records.insert(
            child,
            LineageRecord {
                id: child,
                name,
                birth_turn: turn,
                death_turn: None,
                mother: Some(mother),
                children: Vec::new(),
            },
        );
    }

    pub fn record_death(&mut self, id: PersonId, turn: i64) {
        if let Some(record) = self.records.get_mut(&id) {
            record.death_turn = Some(turn);
        }
    }

    pub fn get(&self, id: PersonId) -> Option<&LineageRecord> {
        self.records.get(&id)
    }

    pub fn records(&self) -> impl Iterator<Item = &LineageRecord> + '_ {
        self.records.values()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn parent(&self, id: PersonId) -> Option<&LineageRecord> {
        let mother = self.records.get(&id)?.mother?;
        self.records.get(&mother)
    }

    /// Children still on record, pruned ones filtered out.
    pub fn children(&self, id: PersonId) -> Vec<&LineageRecord> {
        self.records
            .get(&id)
            .map(|record| {
                record
                    .children
                    .iter()
                    .filter_map(|c| self.records.get(c))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Every child of the same mother, including `id` itself.
    pub fn siblings(&self, id: PersonId) -> Vec<&LineageRecord> {
        match self.records.get(&id).and_then(|r| r.mother) {
            Some(mother) => self.children(mother),
            None => Vec::new(),
        }
    }

    /// Ages of living children at `turn`.
    pub fn child_ages(&self, id: PersonId, turn: i64) -> Vec<i64> {
        self.children(id)
            .into_iter()
            .filter(|c| c.is_alive())
            .map(|c| c.age_at(turn))
            .collect()
    }

    pub fn child_count(&self, id: PersonId) -> usize {
        self.records.get(&id).map_or(0, |r| r.children.len())
    }

    fn has_living_descendant(&self, id: PersonId) -> bool {
        let mut stack: Vec<PersonId> = self
            .records
            .get(&id)
            .map(|r| r.children.clone())
            .unwrap_or_default();
        while let Some(next) = stack.pop() {
            if let Some(record) = self.records.get(&next) {
                if record.is_alive() {
                    return true;
                }
                stack.extend(record.children.iter().copied());
            }
        }
        false
    }

    /// Drops dead records whose death is older than `grace_turns`, whose
    /// mother is already gone and who have no living descendants.
    ///
    /// Records are visited in id order, so a mother is always considered
    /// before her children and a whole dead branch can go in one pass.
    pub fn prune(&mut self, turn: i64, grace_turns: i64) -> usize {
        let ids: Vec<PersonId> = self.records.keys().copied().collect();
        let mut removed = 0;
        for id in ids {
            let Some(record) = self.records.get(&id) else {
                continue;
            };
            let expired = matches!(record.death_turn, Some(death) if turn - death > grace_turns);
            let orphaned = record.mother.map_or(true, |m| !self.records.contains_key(&m));
            if expired && orphaned && !self.has_living_descendant(id) {
                self.records.remove(&id);
                removed += 1;
            }
        }
        if removed > 0 {
            debug!(removed, remaining = self.records.len(), "Pruned lineage records");
        }
        removed
    }
}
