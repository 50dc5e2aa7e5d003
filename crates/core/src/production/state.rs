//! Per-machine production state, derived from the open records.

use serde::Serialize;

use crate::category::{CategoryCatalog, StoppageCategory};

/// Status label of a machine with nothing open.
pub const LABEL_IDLE: &str = "Parada";
/// Status label of a machine with an open run and no open stoppage.
pub const LABEL_RUNNING: &str = "Em produção";

/// What a machine is doing right now.
///
/// Never stored as-is: it is recomputed from the open run and the set of open
/// stoppages every time either changes, and the persisted status label is
/// derived from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum MachineState {
    Idle,
    Running,
    /// At least one stoppage is open. `categories` is ordered by catalog
    /// priority and contains no duplicates. A run may still be open.
    Stopped {
        categories: Vec<StoppageCategory>,
        run_open: bool,
    },
}

impl MachineState {
    pub fn derive<I>(run_open: bool, open_categories: I, catalog: &CategoryCatalog) -> Self
    where
        I: IntoIterator<Item = StoppageCategory>,
    {
        let mut categories: Vec<StoppageCategory> = open_categories.into_iter().collect();
        categories.sort_by(|a, b| {
            catalog
                .priority(a)
                .cmp(&catalog.priority(b))
                .then_with(|| a.cmp(b))
        });
        categories.dedup();

        match (categories.is_empty(), run_open) {
            (true, true) => Self::Running,
            (true, false) => Self::Idle,
            (false, _) => Self::Stopped {
                categories,
                run_open,
            },
        }
    }

    pub fn run_open(&self) -> bool {
        match self {
            Self::Idle => false,
            Self::Running => true,
            Self::Stopped { run_open, .. } => *run_open,
        }
    }

    /// Display label, also written to `maquinas.status`.
    ///
    /// Several open stoppages produce a composite label in priority order,
    /// e.g. `"Em Manutenção + Setup"`.
    pub fn label(&self) -> String {
        match self {
            Self::Idle => LABEL_IDLE.to_string(),
            Self::Running => LABEL_RUNNING.to_string(),
            Self::Stopped { categories, .. } => {
                let joined: Vec<&str> = categories.iter().map(StoppageCategory::as_str).collect();
                format!("Em {}", joined.join(" + "))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cat(catalog: &CategoryCatalog, raw: &str) -> StoppageCategory {
        catalog.parse(raw).unwrap()
    }

    #[test]
    fn nothing_open_is_idle() {
        let state = MachineState::derive(false, [], &CategoryCatalog::default());
        assert_eq!(state, MachineState::Idle);
        assert_eq!(state.label(), "Parada");
        assert!(!state.run_open());
    }

    #[test]
    fn open_run_only_is_running() {
        let state = MachineState::derive(true, [], &CategoryCatalog::default());
        assert_eq!(state, MachineState::Running);
        assert_eq!(state.label(), "Em produção");
    }

    #[test]
    fn single_stoppage_label() {
        let catalog = CategoryCatalog::default();
        let state = MachineState::derive(true, [cat(&catalog, "Manutenção")], &catalog);
        assert_eq!(state.label(), "Em Manutenção");
        assert!(state.run_open());
    }

    #[test]
    fn several_stoppages_ordered_by_priority() {
        let catalog = CategoryCatalog::default();
        let state = MachineState::derive(
            false,
            [cat(&catalog, "Setup"), cat(&catalog, "Manutenção")],
            &catalog,
        );
        assert_eq!(state.label(), "Em Manutenção + Setup");
        assert!(!state.run_open());
    }

    #[test]
    fn duplicate_categories_collapse() {
        let catalog = CategoryCatalog::default();
        let state = MachineState::derive(
            false,
            [cat(&catalog, "Setup"), cat(&catalog, "setup")],
            &catalog,
        );
        assert_eq!(state.label(), "Em Setup");
    }

    #[test]
    fn unknown_historical_category_sorts_last() {
        let catalog = CategoryCatalog::default();
        let state = MachineState::derive(
            false,
            [
                StoppageCategory::from_stored("Energia"),
                cat(&catalog, "Qualidade"),
            ],
            &catalog,
        );
        assert_eq!(state.label(), "Em Qualidade + Energia");
    }
}
