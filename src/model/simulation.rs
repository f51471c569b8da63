use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::usage::UsedVariables;
use crate::calendar::date::date_string;
use crate::errors::{FieldError, PlannerError, PlannerResult};
use crate::resolve::SimulationContext;
use crate::validation::ensure_variable_unused;

/// Name of the baseline simulation that always exists.
pub const DEFAULT_SIMULATION: &str = "Default";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum VariableType {
    Amount,
    Date,
}

/// A simulation variable, stored on the wire as `{ "type": ..., "value": ... }`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum Variable {
    Amount(f64),
    Date(#[serde(with = "date_string")] NaiveDate),
}

impl Variable {
    pub fn kind(&self) -> VariableType {
        match self {
            Variable::Amount(_) => VariableType::Amount,
            Variable::Date(_) => VariableType::Date,
        }
    }
}

fn enabled_by_default() -> bool {
    true
}

/// A named variable environment; exactly one is selected at a time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Simulation {
    pub name: String,
    #[serde(default)]
    pub variables: BTreeMap<String, Variable>,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
    #[serde(default)]
    pub selected: bool,
}

impl Simulation {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            variables: BTreeMap::new(),
            enabled: true,
            selected: false,
        }
    }

    pub fn with_variable(mut self, name: impl Into<String>, variable: Variable) -> Self {
        self.variables.insert(name.into(), variable);
        self
    }

    pub fn is_default(&self) -> bool {
        self.name == DEFAULT_SIMULATION
    }

    pub fn variable(&self, name: &str) -> Option<&Variable> {
        self.variables.get(name)
    }

    pub fn amount(&self, name: &str) -> Option<f64> {
        match self.variables.get(name) {
            Some(Variable::Amount(value)) => Some(*value),
            _ => None,
        }
    }

    pub fn date(&self, name: &str) -> Option<NaiveDate> {
        match self.variables.get(name) {
            Some(Variable::Date(value)) => Some(*value),
            _ => None,
        }
    }

    /// Creates the variable or replaces its value. Value edits never break references.
    pub fn set_variable(&mut self, name: impl Into<String>, variable: Variable) {
        self.variables.insert(name.into(), variable);
    }

    /// Renames a variable unless some record still refers to the old name.
    pub fn rename_variable(
        &mut self,
        old: &str,
        new: &str,
        used: &UsedVariables,
    ) -> PlannerResult<()> {
        if new.trim().is_empty() || self.variables.contains_key(new) {
            return Err(PlannerError::field("name", FieldError::InvalidName));
        }
        if !self.variables.contains_key(old) {
            return Err(PlannerError::field("name", FieldError::UnknownVariable));
        }
        ensure_variable_unused(old, used)?;
        if let Some(variable) = self.variables.remove(old) {
            self.variables.insert(new.to_string(), variable);
        }
        info!(simulation = %self.name, old, new, "renamed variable");
        Ok(())
    }

    /// Removes a variable unless some record still refers to it.
    pub fn remove_variable(&mut self, name: &str, used: &UsedVariables) -> PlannerResult<Variable> {
        ensure_variable_unused(name, used)?;
        let removed = self
            .variables
            .remove(name)
            .ok_or(PlannerError::field("name", FieldError::UnknownVariable))?;
        info!(simulation = %self.name, name, "removed variable");
        Ok(removed)
    }
}

/// All simulations known to the client, with the selection invariant enforced.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(from = "Vec<Simulation>", into = "Vec<Simulation>")]
pub struct SimulationSet {
    simulations: Vec<Simulation>,
}

impl Default for SimulationSet {
    fn default() -> Self {
        Self::from(Vec::new())
    }
}

impl From<Vec<Simulation>> for SimulationSet {
    /// Ensures `Default` exists and exactly one simulation is selected,
    /// keeping the first selected entry when the list flags several.
    fn from(mut simulations: Vec<Simulation>) -> Self {
        if !simulations.iter().any(Simulation::is_default) {
            simulations.insert(0, Simulation::new(DEFAULT_SIMULATION));
        }
        let chosen = simulations
            .iter()
            .position(|sim| sim.selected)
            .or_else(|| simulations.iter().position(Simulation::is_default))
            .unwrap_or(0);
        for (index, sim) in simulations.iter_mut().enumerate() {
            sim.selected = index == chosen;
        }
        Self { simulations }
    }
}

impl From<SimulationSet> for Vec<Simulation> {
    fn from(set: SimulationSet) -> Self {
        set.simulations
    }
}

impl SimulationSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Simulation> {
        self.simulations.iter()
    }

    pub fn get(&self, name: &str) -> Option<&Simulation> {
        self.simulations.iter().find(|sim| sim.name == name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Simulation> {
        self.simulations.iter_mut().find(|sim| sim.name == name)
    }

    pub fn selected(&self) -> &Simulation {
        self.simulations
            .iter()
            .find(|sim| sim.selected)
            .unwrap_or(&self.simulations[0])
    }

    pub fn selected_mut(&mut self) -> &mut Simulation {
        let index = self
            .simulations
            .iter()
            .position(|sim| sim.selected)
            .unwrap_or(0);
        &mut self.simulations[index]
    }

    /// Resolution context scoped to the selected simulation.
    pub fn context(&self) -> SimulationContext<'_> {
        SimulationContext::new(self.selected())
    }

    pub fn select(&mut self, name: &str) -> PlannerResult<()> {
        if self.get(name).is_none() {
            return Err(PlannerError::SimulationNotFound(name.to_string()));
        }
        for sim in &mut self.simulations {
            sim.selected = sim.name == name;
        }
        info!(simulation = name, "selected simulation");
        Ok(())
    }

    pub fn add(&mut self, mut simulation: Simulation) -> PlannerResult<()> {
        if simulation.name.trim().is_empty() || self.get(&simulation.name).is_some() {
            return Err(PlannerError::field("name", FieldError::InvalidName));
        }
        simulation.selected = false;
        self.simulations.push(simulation);
        Ok(())
    }

    pub fn rename(&mut self, old: &str, new: &str) -> PlannerResult<()> {
        if old == DEFAULT_SIMULATION {
            warn!("refused to rename the Default simulation");
            return Err(PlannerError::DefaultSimulation);
        }
        if new.trim().is_empty() || self.get(new).is_some() {
            return Err(PlannerError::field("name", FieldError::InvalidName));
        }
        let sim = self
            .get_mut(old)
            .ok_or_else(|| PlannerError::SimulationNotFound(old.to_string()))?;
        sim.name = new.to_string();
        Ok(())
    }

    /// Removes a simulation; the selection falls back to `Default` when the
    /// removed one was selected.
    pub fn remove(&mut self, name: &str) -> PlannerResult<Simulation> {
        if name == DEFAULT_SIMULATION {
            warn!("refused to remove the Default simulation");
            return Err(PlannerError::DefaultSimulation);
        }
        let index = self
            .simulations
            .iter()
            .position(|sim| sim.name == name)
            .ok_or_else(|| PlannerError::SimulationNotFound(name.to_string()))?;
        let removed = self.simulations.remove(index);
        if removed.selected {
            for sim in &mut self.simulations {
                sim.selected = sim.is_default();
            }
        }
        Ok(removed)
    }
}
