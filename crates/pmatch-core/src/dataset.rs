use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::model::{ActualValue, Aspect, Candidate, Criterion, Role, Target};
use crate::ConfigError;

/// Every record the engine may need, as stored in a YAML dataset file or
/// loaded from the database.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Dataset {
    #[serde(default)]
    pub roles: Vec<Role>,
    #[serde(default)]
    pub aspects: Vec<Aspect>,
    #[serde(default)]
    pub criteria: Vec<Criterion>,
    #[serde(default)]
    pub targets: Vec<Target>,
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    #[serde(default)]
    pub values: Vec<ActualValue>,
}

/// The inputs of one calculation run: a role, its targets, and the shared
/// aspect, criterion, candidate and value records.
#[derive(Debug, Clone)]
pub struct RoleDataset {
    pub role: Role,
    pub aspects: Vec<Aspect>,
    pub criteria: Vec<Criterion>,
    /// Only the targets whose `role_id` is `role.id`.
    pub targets: Vec<Target>,
    pub candidates: Vec<Candidate>,
    pub values: Vec<ActualValue>,
}

impl Dataset {
    /// Slice out the records needed to calculate `role_id`.
    ///
    /// Returns `None` when the role does not exist.
    #[must_use]
    pub fn role_dataset(&self, role_id: i64) -> Option<RoleDataset> {
        let role = self.roles.iter().find(|r| r.id == role_id)?.clone();
        let targets = self
            .targets
            .iter()
            .filter(|t| t.role_id == role_id)
            .cloned()
            .collect();

        Some(RoleDataset {
            role,
            aspects: self.aspects.clone(),
            criteria: self.criteria.clone(),
            targets,
            candidates: self.candidates.clone(),
            values: self.values.clone(),
        })
    }
}

/// Load and validate a dataset from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_dataset(path: &Path) -> Result<Dataset, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::DatasetFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let dataset: Dataset =
        serde_yaml::from_str(&content).map_err(ConfigError::DatasetFileParse)?;

    validate_dataset(&dataset)?;

    Ok(dataset)
}

/// Structural checks a CRUD layer would normally enforce before records reach
/// the engine.
fn validate_dataset(dataset: &Dataset) -> Result<(), ConfigError> {
    let invalid =
        |msg: String| -> Result<(), ConfigError> { Err(ConfigError::Validation(msg)) };

    let mut role_ids = HashSet::new();
    for role in &dataset.roles {
        if role.name.trim().is_empty() {
            return invalid(format!("role {} name must be non-empty", role.id));
        }
        if !role_ids.insert(role.id) {
            return invalid(format!("duplicate role id: {}", role.id));
        }
    }

    let mut aspect_ids = HashSet::new();
    for aspect in &dataset.aspects {
        if aspect.name.trim().is_empty() {
            return invalid(format!("aspect {} name must be non-empty", aspect.id));
        }
        if !(0.0..=100.0).contains(&aspect.weight_percent) {
            return invalid(format!(
                "aspect '{}' has invalid weight_percent {}; must be within 0..=100",
                aspect.name, aspect.weight_percent
            ));
        }
        if !aspect_ids.insert(aspect.id) {
            return invalid(format!("duplicate aspect id: {}", aspect.id));
        }
    }

    let mut criterion_ids = HashSet::new();
    for criterion in &dataset.criteria {
        if criterion.code.trim().is_empty() || criterion.name.trim().is_empty() {
            return invalid(format!(
                "criterion {} code and name must be non-empty",
                criterion.id
            ));
        }
        if !(criterion.weight.is_finite() && criterion.weight > 0.0) {
            return invalid(format!(
                "criterion '{}' has invalid weight {}; must be positive",
                criterion.code, criterion.weight
            ));
        }
        if !aspect_ids.contains(&criterion.aspect_id) {
            return invalid(format!(
                "criterion '{}' references unknown aspect {}",
                criterion.code, criterion.aspect_id
            ));
        }
        if !criterion_ids.insert(criterion.id) {
            return invalid(format!("duplicate criterion id: {}", criterion.id));
        }
    }

    let mut target_keys = HashSet::new();
    for target in &dataset.targets {
        if !role_ids.contains(&target.role_id) {
            return invalid(format!("target references unknown role {}", target.role_id));
        }
        if !criterion_ids.contains(&target.criterion_id) {
            return invalid(format!(
                "target references unknown criterion {}",
                target.criterion_id
            ));
        }
        if !target.target_value.is_finite() {
            return invalid(format!(
                "target for role {} criterion {} is not a finite number",
                target.role_id, target.criterion_id
            ));
        }
        if !target_keys.insert((target.role_id, target.criterion_id)) {
            return invalid(format!(
                "duplicate target for role {} criterion {}",
                target.role_id, target.criterion_id
            ));
        }
    }

    let mut candidate_ids = HashSet::new();
    let mut niks = HashSet::new();
    for candidate in &dataset.candidates {
        if candidate.name.trim().is_empty() || candidate.nik.trim().is_empty() {
            return invalid(format!(
                "candidate {} nik and name must be non-empty",
                candidate.id
            ));
        }
        if !candidate_ids.insert(candidate.id) {
            return invalid(format!("duplicate candidate id: {}", candidate.id));
        }
        if !niks.insert(candidate.nik.as_str()) {
            return invalid(format!("duplicate candidate nik: '{}'", candidate.nik));
        }
    }

    let mut value_keys = HashSet::new();
    for value in &dataset.values {
        if !candidate_ids.contains(&value.candidate_id) {
            return invalid(format!(
                "value references unknown candidate {}",
                value.candidate_id
            ));
        }
        if !criterion_ids.contains(&value.criterion_id) {
            return invalid(format!(
                "value references unknown criterion {}",
                value.criterion_id
            ));
        }
        if !value.value.is_finite() {
            return invalid(format!(
                "value for candidate {} criterion {} is not a finite number",
                value.candidate_id, value.criterion_id
            ));
        }
        if !value_keys.insert((value.candidate_id, value.criterion_id)) {
            return invalid(format!(
                "duplicate value for candidate {} criterion {}",
                value.candidate_id, value.criterion_id
            ));
        }
    }

    let numbers = dataset
        .aspects
        .iter()
        .map(|a| (format!("aspect {} weight_percent", a.id), a.weight_percent))
        .chain(
            dataset
                .criteria
                .iter()
                .map(|c| (format!("criterion '{}' weight", c.code), c.weight)),
        )
        .chain(dataset.targets.iter().map(|t| {
            (
                format!("target for role {} criterion {}", t.role_id, t.criterion_id),
                t.target_value,
            )
        }))
        .chain(dataset.values.iter().map(|v| {
            (
                format!(
                    "value for candidate {} criterion {}",
                    v.candidate_id, v.criterion_id
                ),
                v.value,
            )
        }));
    for (what, number) in numbers {
        if !fits_stored_scale(number) {
            return invalid(format!(
                "{what} is {number}; at most {STORED_DECIMALS} decimal places are allowed"
            ));
        }
    }

    Ok(())
}

/// Decimal places kept by the database for weights, targets and values.
pub const STORED_DECIMALS: i32 = 2;

/// `true` when `value` survives storage at [`STORED_DECIMALS`] unchanged.
#[must_use]
pub fn fits_stored_scale(value: f64) -> bool {
    let scaled = value * 10_f64.powi(STORED_DECIMALS);
    (scaled - scaled.round()).abs() < 1e-6
}
