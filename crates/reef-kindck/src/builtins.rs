//! Builtin kind axioms.
//!
//! The kinds of the Reef prelude are fixed facts, seeded into every solve
//! session during initial-state construction:
//!
//! - primitive types (`Int`, `Float`, `String`, `Bool`) have kind `Type`
//! - unary constructors (`List`, `Option`, `Set`, `Pid`) have kind
//!   `Type -> Type`
//! - binary constructors (`Map`, `Result`) have kind
//!   `Type -> Type -> Type`
//! - builtin abilities (`IO`, `Net`, `Time`) have kind `Ability`

use crate::constraint::Constraint;
use crate::kind::Provenance;
use crate::solve::SolveState;

const BASE_TYPES: &[&str] = &["Int", "Float", "String", "Bool"];
const UNARY_CONSTRUCTORS: &[&str] = &["List", "Option", "Set", "Pid"];
const BINARY_CONSTRUCTORS: &[&str] = &["Map", "Result"];
const ABILITIES: &[&str] = &["IO", "Net", "Time"];

/// Generate the axiom constraints, registering one kind variable per
/// builtin in the state's builtin table.
pub fn axiom_constraints(state: &mut SolveState) -> Vec<Constraint> {
    let mut constraints = Vec::new();

    for &name in BASE_TYPES {
        let var = state.fresh_var(None);
        state.register_builtin(name, var);
        constraints.push(Constraint::IsType { var, prov: Provenance::Builtin });
    }

    for &name in ABILITIES {
        let var = state.fresh_var(None);
        state.register_builtin(name, var);
        constraints.push(Constraint::IsAbility { var, prov: Provenance::Builtin });
    }

    for &name in UNARY_CONSTRUCTORS {
        let var = state.fresh_var(None);
        let arg = state.fresh_var(None);
        let ret = state.fresh_var(None);
        state.register_builtin(name, var);
        constraints.push(Constraint::IsArr { var, prov: Provenance::Builtin, arg, ret });
        constraints.push(Constraint::IsType { var: arg, prov: Provenance::Builtin });
        constraints.push(Constraint::IsType { var: ret, prov: Provenance::Builtin });
    }

    for &name in BINARY_CONSTRUCTORS {
        // Curried: Type -> (Type -> Type).
        let var = state.fresh_var(None);
        let first = state.fresh_var(None);
        let rest = state.fresh_var(None);
        let second = state.fresh_var(None);
        let ret = state.fresh_var(None);
        state.register_builtin(name, var);
        constraints.push(Constraint::IsArr { var, prov: Provenance::Builtin, arg: first, ret: rest });
        constraints.push(Constraint::IsType { var: first, prov: Provenance::Builtin });
        constraints.push(Constraint::IsArr { var: rest, prov: Provenance::Builtin, arg: second, ret });
        constraints.push(Constraint::IsType { var: second, prov: Provenance::Builtin });
        constraints.push(Constraint::IsType { var: ret, prov: Provenance::Builtin });
    }

    constraints
}
