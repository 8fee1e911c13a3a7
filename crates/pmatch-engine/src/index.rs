//! Keyed views over a [`RoleDataset`], built once per run.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use pmatch_core::{Aspect, Candidate, Criterion, RoleDataset};

use crate::error::EngineError;

/// A criterion the role targets, with its target value.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Requirement<'a> {
    pub criterion: &'a Criterion,
    pub target_value: f64,
}

#[derive(Debug)]
pub(crate) struct RunIndex<'a> {
    /// Every aspect, ordered by id.
    pub aspects: BTreeMap<i64, &'a Aspect>,
    /// Targeted criteria grouped by aspect id, each group ordered by criterion id.
    pub requirements: BTreeMap<i64, Vec<Requirement<'a>>>,
    pub candidates: HashMap<i64, &'a Candidate>,
    /// `(candidate_id, criterion_id)` to recorded value, restricted to
    /// targeted criteria.
    values: HashMap<(i64, i64), f64>,
}

impl<'a> RunIndex<'a> {
    /// Index the dataset and reject inputs no run can be based on.
    pub fn build(dataset: &'a RoleDataset) -> Result<Self, EngineError> {
        let role_id = dataset.role.id;

        if dataset.targets.is_empty() {
            return Err(EngineError::NoTargets(role_id));
        }

        let aspects: BTreeMap<i64, &Aspect> = dataset.aspects.iter().map(|a| (a.id, a)).collect();
        let criteria: HashMap<i64, &Criterion> =
            dataset.criteria.iter().map(|c| (c.id, c)).collect();

        let mut requirements: BTreeMap<i64, Vec<Requirement<'a>>> = BTreeMap::new();
        let mut targeted = BTreeSet::new();

        for target in dataset.targets.iter().filter(|t| t.role_id == role_id) {
            let criterion = criteria.get(&target.criterion_id).copied().ok_or(
                EngineError::UnknownCriterion {
                    role_id,
                    criterion_id: target.criterion_id,
                },
            )?;

            if !aspects.contains_key(&criterion.aspect_id) {
                return Err(EngineError::UnknownAspect {
                    code: criterion.code.clone(),
                    aspect_id: criterion.aspect_id,
                });
            }
            if !target.target_value.is_finite() {
                return Err(EngineError::NonFiniteTarget {
                    criterion_id: criterion.id,
                });
            }
            if !targeted.insert(criterion.id) {
                return Err(EngineError::DuplicateTarget {
                    role_id,
                    criterion_id: criterion.id,
                });
            }

            requirements
                .entry(criterion.aspect_id)
                .or_default()
                .push(Requirement {
                    criterion,
                    target_value: target.target_value,
                });
        }

        if targeted.is_empty() {
            return Err(EngineError::NoTargets(role_id));
        }

        for group in requirements.values_mut() {
            group.sort_by_key(|r| r.criterion.id);
        }

        let mut values = HashMap::new();
        for value in dataset
            .values
            .iter()
            .filter(|v| targeted.contains(&v.criterion_id))
        {
            if !value.value.is_finite() {
                return Err(EngineError::NonFiniteValue {
                    candidate_id: value.candidate_id,
                    criterion_id: value.criterion_id,
                });
            }
            if values
                .insert((value.candidate_id, value.criterion_id), value.value)
                .is_some()
            {
                return Err(EngineError::DuplicateValue {
                    candidate_id: value.candidate_id,
                    criterion_id: value.criterion_id,
                });
            }
        }

        let candidates = dataset.candidates.iter().map(|c| (c.id, c)).collect();

        Ok(Self {
            aspects,
            requirements,
            candidates,
            values,
        })
    }

    pub fn value(&self, candidate_id: i64, criterion_id: i64) -> Option<f64> {
        self.values.get(&(candidate_id, criterion_id)).copied()
    }

    /// Candidate ids holding at least one value against a targeted criterion,
    /// ascending.
    pub fn candidates_with_values(&self) -> BTreeSet<i64> {
        self.values.keys().map(|(candidate_id, _)| *candidate_id).collect()
    }
}
