//! Solve driver: fixpoint constraint reduction, cycle checking, defaulting.
//!
//! A solve session threads one [`SolveState`] through a sequence of
//! [`step`] calls (one per batch of generated constraints), finishing with
//! [`verify`] and [`default_unconstrained_vars`]. Constraint generation is
//! external; this module only consumes the resulting constraint batches.

use rustc_hash::FxHashMap;

use crate::builtins;
use crate::constraint::Constraint;
use crate::error::KindError;
use crate::kind::{Descriptor, Kind, KindVar, VarSource};
use crate::unify::KindStore;

/// The full state of one kind-inference session.
///
/// Owns the equivalence-class store, the set of variables freshly
/// introduced since the last defaulting pass, and the kind variables of
/// the builtin type constructors and abilities.
#[derive(Debug)]
pub struct SolveState {
    store: KindStore,
    /// Variables created since the last defaulting pass. Only consulted by
    /// [`default_unconstrained_vars`].
    fresh: Vec<KindVar>,
    /// Kind variable of each builtin, keyed by name.
    builtins: FxHashMap<&'static str, KindVar>,
}

impl SolveState {
    /// Create an empty state with no axioms applied.
    pub fn new() -> Self {
        SolveState {
            store: KindStore::new(),
            fresh: Vec::new(),
            builtins: FxHashMap::default(),
        }
    }

    /// Construct the initial state from the builtin kind axioms.
    ///
    /// The axioms are library invariants, not user input: failing to solve
    /// them is a bug in the axiom table, so this panics instead of
    /// returning a kind error.
    pub fn initial() -> SolveState {
        let mut state = SolveState::new();
        let axioms = builtins::axiom_constraints(&mut state);
        let state = step(state, &axioms)
            .unwrap_or_else(|errors| panic!("builtin kind axioms do not solve: {errors:?}"));
        verify(state)
            .unwrap_or_else(|errors| panic!("builtin kind axioms contain a cycle: {errors:?}"))
    }

    /// Create a fresh kind variable, tracked for the next defaulting pass.
    pub fn fresh_var(&mut self, source: Option<VarSource>) -> KindVar {
        let var = self.store.fresh_var(source);
        self.fresh.push(var);
        var
    }

    /// The kind variable of a builtin type constructor or ability.
    pub fn builtin_var(&self, name: &str) -> Option<KindVar> {
        self.builtins.get(name).copied()
    }

    pub(crate) fn register_builtin(&mut self, name: &'static str, var: KindVar) {
        self.builtins.insert(name, var);
    }

    /// Resolve a variable's kind; unconstrained classes read as `Type`.
    pub fn kind_of(&mut self, var: KindVar) -> Kind {
        self.store.kind_of(var)
    }

    /// The solved fact for a variable's class, if any.
    pub fn descriptor(&mut self, var: KindVar) -> Option<Descriptor> {
        self.store.probe(var)
    }

    /// Whether two variables ended up in the same equivalence class.
    pub fn unioned(&mut self, a: KindVar, b: KindVar) -> bool {
        self.store.unioned(a, b)
    }
}

impl Default for SolveState {
    fn default() -> Self {
        Self::new()
    }
}

// ── Fixpoint reduction ─────────────────────────────────────────────────

/// Apply a batch of constraints until no further progress is possible.
///
/// Generation order is not dependency order: a constraint that fails may
/// be unblocked by a later one unifying the right variables. Failures are
/// therefore deferred, and the deferred set is re-run as long as a pass
/// applies at least one constraint. Each pass either shrinks the pending
/// set or ends the loop, so at most O(n) passes run.
pub(crate) fn reduce(store: &mut KindStore, constraints: &[Constraint]) -> Vec<KindError> {
    let mut pending: Vec<Constraint> = constraints.to_vec();
    loop {
        let mut deferred = Vec::new();
        let mut progressed = false;
        for constraint in pending {
            match store.apply(&constraint) {
                Ok(()) => progressed = true,
                Err(_) => deferred.push(constraint),
            }
        }
        if deferred.is_empty() {
            return Vec::new();
        }
        if !progressed {
            return capture_conflicts(store, &deferred);
        }
        pending = deferred;
    }
}

/// Re-attempt constraints that can no longer succeed, purely to collect a
/// concrete conflict for each one.
///
/// Zero progress means none of these can apply, so the attempts only exist
/// for their error objects; the store is rolled back wholesale afterwards.
fn capture_conflicts(store: &mut KindStore, deferred: &[Constraint]) -> Vec<KindError> {
    let snapshot = store.snapshot();
    let mut errors = Vec::new();
    for constraint in deferred {
        if let Err(error) = store.apply(constraint) {
            errors.push(error);
        }
    }
    store.rollback_to(snapshot);
    errors
}

// ── Driver entry points ────────────────────────────────────────────────

/// Run one solver step over a batch of generated constraints.
///
/// On reduction failure the partially-mutated store is first checked for
/// cycles: an infinite kind explains the conflicts better than they
/// explain themselves, so cycle errors take precedence. Otherwise the
/// reduction errors are returned, enriched with the conflicted variable's
/// syntactic source where one is known.
pub fn step(
    mut state: SolveState,
    constraints: &[Constraint],
) -> Result<SolveState, Vec<KindError>> {
    let errors = reduce(&mut state.store, constraints);
    if errors.is_empty() {
        return Ok(state);
    }
    let cycles = state.store.occurs_check();
    if !cycles.is_empty() {
        return Err(cycles);
    }
    Err(errors
        .into_iter()
        .map(|error| improve_error(error, &mut state.store))
        .collect())
}

/// Occurs-check only: the final consistency guarantee after a sequence of
/// steps, without re-running reduction.
pub fn verify(mut state: SolveState) -> Result<SolveState, Vec<KindError>> {
    let errors = state.store.occurs_check();
    if errors.is_empty() {
        Ok(state)
    } else {
        Err(errors)
    }
}

/// Assign the base kind `Type` to every freshly-introduced variable whose
/// class is still unconstrained. Never fails; variables that already have
/// a descriptor are untouched.
pub fn default_unconstrained_vars(mut state: SolveState) -> SolveState {
    let fresh = std::mem::take(&mut state.fresh);
    for var in fresh {
        state.store.default_to_type(var);
    }
    state
}

/// Attach the conflicted variable's program-level source, when the side
/// table knows one anywhere in its class.
fn improve_error(error: KindError, store: &mut KindStore) -> KindError {
    match error {
        KindError::ConstraintConflict {
            applied,
            existing,
            snapshot,
            var_source: None,
        } => {
            let var_source = store.source_of_class(applied.subject());
            KindError::ConstraintConflict {
                applied,
                existing,
                snapshot,
                var_source,
            }
        }
        other => other,
    }
}

// ── Tests ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use reef_common::Span;

    use crate::kind::{Descriptor, Provenance};

    use super::*;

    fn explicit() -> Provenance {
        Provenance::Explicit(Span::new(0, 1))
    }

    #[test]
    fn initial_state_solves_the_axioms() {
        let mut state = SolveState::initial();

        let int = state.builtin_var("Int").expect("Int is builtin");
        assert_eq!(state.kind_of(int), Kind::Type);

        let list = state.builtin_var("List").expect("List is builtin");
        assert_eq!(state.kind_of(list), Kind::arr(Kind::Type, Kind::Type));

        let map = state.builtin_var("Map").expect("Map is builtin");
        assert_eq!(
            state.kind_of(map),
            Kind::arr(Kind::Type, Kind::arr(Kind::Type, Kind::Type))
        );

        let io = state.builtin_var("IO").expect("IO is builtin");
        assert_eq!(state.kind_of(io), Kind::Ability);
    }

    #[test]
    fn reduce_defers_then_reports_each_stuck_constraint() {
        let mut state = SolveState::new();
        let v = state.fresh_var(None);
        let constraints = vec![
            Constraint::IsType { var: v, prov: explicit() },
            Constraint::IsAbility { var: v, prov: explicit() },
            Constraint::IsAbility { var: v, prov: explicit() },
        ];
        let errors = reduce(&mut state.store, &constraints);
        // One conflict per still-failing constraint after zero progress.
        assert_eq!(errors.len(), 2);
        // The diagnostic pass left the store as reduction ended it.
        assert!(matches!(
            state.store.probe(v),
            Some(Descriptor::Type { .. })
        ));
    }

    #[test]
    fn step_reports_cycles_over_conflicts() {
        let mut state = SolveState::new();
        let v = state.fresh_var(None);
        let a = state.fresh_var(None);
        let b = state.fresh_var(None);
        let constraints = vec![
            Constraint::IsArr { var: v, prov: explicit(), arg: a, ret: b },
            Constraint::Unify { prov: explicit(), left: v, right: a },
            // Unsatisfiable alongside the arrow above.
            Constraint::IsType { var: v, prov: explicit() },
        ];
        let errors = step(state, &constraints).unwrap_err();
        assert!(
            errors
                .iter()
                .all(|e| matches!(e, KindError::CycleDetected { .. })),
            "expected only cycle errors, got {:?}",
            errors
        );
    }

    #[test]
    fn improve_error_attaches_var_source() {
        let mut state = SolveState::new();
        let source = VarSource::new("a", Span::new(4, 5));
        let v = state.fresh_var(Some(source));
        let constraints = vec![
            Constraint::IsType { var: v, prov: explicit() },
            Constraint::IsAbility { var: v, prov: explicit() },
        ];
        let errors = step(state, &constraints).unwrap_err();
        assert_eq!(errors.len(), 1);
        match &errors[0] {
            KindError::ConstraintConflict { var_source, .. } => {
                assert_eq!(var_source.as_ref().map(|s| s.name.as_str()), Some("a"));
            }
            other => panic!("expected ConstraintConflict, got {:?}", other),
        }
    }

    #[test]
    fn defaulting_is_idempotent_and_non_destructive() {
        let mut state = SolveState::new();
        let x = state.fresh_var(None);
        let y = state.fresh_var(None);
        let state = step(
            state,
            &[Constraint::IsAbility { var: y, prov: explicit() }],
        )
        .unwrap();

        let mut state = default_unconstrained_vars(state);
        assert!(matches!(
            state.descriptor(x),
            Some(Descriptor::Type { prov: Provenance::Default })
        ));
        assert!(matches!(state.descriptor(y), Some(Descriptor::Ability { .. })));

        // A second pass changes nothing.
        let mut state = default_unconstrained_vars(state);
        assert!(matches!(
            state.descriptor(x),
            Some(Descriptor::Type { prov: Provenance::Default })
        ));
        assert!(matches!(state.descriptor(y), Some(Descriptor::Ability { .. })));
    }
}
