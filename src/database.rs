// The constraint database: every constraint introduced so far, addressed by a monotonically
// increasing id (0 is never issued, matching the proof format's own convention of using 0 as a
// sentinel/terminator), plus the level bookkeeping used by the `#`/`w` rules.
use fxhash::FxHashMap;

use crate::constraint::Constraint;
use crate::error::{CheckerError, Result};

pub type ConstraintId = u64;

#[derive(Debug, Default)]
pub struct ConstraintDatabase {
    constraints: FxHashMap<ConstraintId, Constraint>,
    next_id: ConstraintId,
    /// Ids introduced while each level was current, so `w` can drop everything from a level
    /// (and every level opened after it) in one go.
    levels: FxHashMap<i64, Vec<ConstraintId>>,
    current_level: Option<i64>,
}

impl ConstraintDatabase {
    pub fn new() -> ConstraintDatabase {
        ConstraintDatabase {
            constraints: FxHashMap::default(),
            next_id: 1,
            levels: FxHashMap::default(),
            current_level: None,
        }
    }

    pub fn insert(&mut self, constraint: Constraint) -> ConstraintId {
        let id = self.next_id;
        self.next_id += 1;
        if let Some(level) = self.current_level {
            self.levels.entry(level).or_default().push(id);
        }
        self.constraints.insert(id, constraint);
        id
    }

    pub fn get(&self, line: usize, id: ConstraintId) -> Result<&Constraint> {
        self.constraints
            .get(&id)
            .ok_or_else(|| CheckerError::verify(line, format!("no constraint with id {}", id)))
    }

    pub fn delete(&mut self, id: ConstraintId) {
        self.constraints.remove(&id);
    }

    pub fn set_level(&mut self, level: i64) {
        self.levels.entry(level).or_default();
        self.current_level = Some(level);
    }

    /// Deletes every constraint introduced at `level` or any later level.
    pub fn wipe_level(&mut self, level: i64) {
        let affected: Vec<i64> = self.levels.keys().copied().filter(|&l| l >= level).collect();
        for l in affected {
            if let Some(ids) = self.levels.remove(&l) {
                for id in ids {
                    self.delete(id);
                }
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Constraint> {
        self.constraints.values()
    }

    pub fn len(&self) -> usize {
        self.constraints.len()
    }
}
