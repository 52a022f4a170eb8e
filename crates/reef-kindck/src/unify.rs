//! Equivalence-class store and constraint application for kind inference.
//!
//! Implements the solver's union-find store using `ena`'s unification
//! table, with an `Option<Descriptor>` per class. Constraint application is
//! transactional: every top-level constraint runs inside an `ena` snapshot
//! and is committed only if it, and every constraint it implies, succeeds.
//! The occurs check lives here too, as a three-color depth-first search
//! over the solved store's arrow edges.

use ena::unify::{InPlace, InPlaceUnificationTable, Snapshot};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::constraint::Constraint;
use crate::error::{ClassSnapshot, KindError, StoreSnapshot};
use crate::kind::{Descriptor, Kind, KindVar, Provenance, VarSource};

/// The solver's equivalence-class store.
///
/// Owns the union-find table and the display-only side table mapping each
/// kind variable back to the program-level type variable it was created
/// for. Every mutation of kind facts goes through [`KindStore::apply`].
#[derive(Debug)]
pub struct KindStore {
    /// The union-find unification table (ena).
    table: InPlaceUnificationTable<KindVar>,
    /// Syntactic source of each variable, indexed by `KindVar.0`.
    /// Display-only; never consulted for identity.
    sources: Vec<Option<VarSource>>,
}

impl KindStore {
    /// Create a new, empty store.
    pub fn new() -> Self {
        KindStore {
            table: InPlaceUnificationTable::new(),
            sources: Vec::new(),
        }
    }

    /// Create a fresh kind variable.
    pub fn fresh_var(&mut self, source: Option<VarSource>) -> KindVar {
        let var = self.table.new_key(None);
        // Ensure the side table is large enough.
        while self.sources.len() <= var.0 as usize {
            self.sources.push(None);
        }
        self.sources[var.0 as usize] = source;
        var
    }

    /// The syntactic source of a variable, if it has one.
    pub fn source(&self, var: KindVar) -> Option<&VarSource> {
        self.sources.get(var.0 as usize).and_then(|s| s.as_ref())
    }

    /// The source of any variable in `var`'s class, preferring `var` itself.
    pub(crate) fn source_of_class(&mut self, var: KindVar) -> Option<VarSource> {
        if let Some(source) = self.source(var) {
            return Some(source.clone());
        }
        let root = self.table.find(var);
        for i in 0..self.table.len() as u32 {
            let candidate = KindVar(i);
            if self.table.find(candidate) == root {
                if let Some(source) = self.source(candidate) {
                    return Some(source.clone());
                }
            }
        }
        None
    }

    /// Canonical representative of `var`'s class.
    pub fn find(&mut self, var: KindVar) -> KindVar {
        self.table.find(var)
    }

    /// The solved fact for `var`'s class, if any.
    pub fn probe(&mut self, var: KindVar) -> Option<Descriptor> {
        self.table.probe_value(var)
    }

    /// Whether two variables are in the same class.
    pub fn unioned(&mut self, a: KindVar, b: KindVar) -> bool {
        self.table.unioned(a, b)
    }

    /// Number of variables ever created.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Whether the store has no variables.
    pub fn is_empty(&self) -> bool {
        self.table.len() == 0
    }

    pub(crate) fn snapshot(&mut self) -> Snapshot<InPlace<KindVar>> {
        self.table.snapshot()
    }

    pub(crate) fn rollback_to(&mut self, snapshot: Snapshot<InPlace<KindVar>>) {
        self.table.rollback_to(snapshot);
    }

    // ── Constraint application ──────────────────────────────────────────

    /// Apply one top-level constraint, transactionally.
    ///
    /// Reconciling descriptors may imply further constraints (unifying the
    /// argument and result variables of two arrows); these are processed
    /// recursively before the application is considered complete. If any
    /// implied constraint fails, the whole application is rolled back to
    /// the state before this call and the first failure is returned.
    pub fn apply(&mut self, constraint: &Constraint) -> Result<(), KindError> {
        let snapshot = self.table.snapshot();
        match self.apply_inner(constraint) {
            Ok(()) => {
                self.table.commit(snapshot);
                Ok(())
            }
            Err(error) => {
                self.table.rollback_to(snapshot);
                Err(error)
            }
        }
    }

    fn apply_inner(&mut self, constraint: &Constraint) -> Result<(), KindError> {
        match constraint {
            Constraint::IsType { var, prov } => {
                self.apply_descriptor(constraint, *var, Descriptor::Type { prov: prov.clone() })
            }
            Constraint::IsAbility { var, prov } => {
                self.apply_descriptor(constraint, *var, Descriptor::Ability { prov: prov.clone() })
            }
            Constraint::IsArr { var, prov, arg, ret } => match self.probe(*var) {
                None => {
                    let descriptor = Descriptor::Arr {
                        prov: prov.clone(),
                        arg: *arg,
                        ret: *ret,
                    };
                    self.table
                        .unify_var_value(*var, Some(descriptor))
                        .expect("attaching a descriptor to an unsolved class should not fail");
                    Ok(())
                }
                Some(Descriptor::Arr {
                    arg: existing_arg,
                    ret: existing_ret,
                    ..
                }) => {
                    // A second arrow occurrence pins nothing new; its
                    // argument and result must line up with the existing ones.
                    self.apply_inner(&Constraint::Unify {
                        prov: prov.clone(),
                        left: *arg,
                        right: existing_arg,
                    })?;
                    self.apply_inner(&Constraint::Unify {
                        prov: prov.clone(),
                        left: *ret,
                        right: existing_ret,
                    })
                }
                Some(existing) => Err(self.conflict(constraint.clone(), existing)),
            },
            Constraint::Unify { prov, left, right } => self.unify(*left, *right, prov),
        }
    }

    /// Attach a base-kind descriptor to `var`'s class.
    fn apply_descriptor(
        &mut self,
        constraint: &Constraint,
        var: KindVar,
        descriptor: Descriptor,
    ) -> Result<(), KindError> {
        match self.probe(var) {
            Some(existing) if !existing.same_shape(&descriptor) => {
                Err(self.conflict(constraint.clone(), existing))
            }
            // Unsolved, or the same fact again. Re-attaching an equal shape
            // lets an explicit occurrence upgrade a default-inserted note.
            _ => {
                self.table
                    .unify_var_value(var, Some(descriptor))
                    .expect("attaching an equal or first descriptor should not fail");
                Ok(())
            }
        }
    }

    /// Merge two classes, reconciling their descriptors.
    fn unify(&mut self, left: KindVar, right: KindVar, prov: &Provenance) -> Result<(), KindError> {
        if self.table.unioned(left, right) {
            return Ok(());
        }

        // Two arrow classes reconcile by unifying their sub-variables
        // pairwise; derive the implied constraints from the pre-union
        // descriptors.
        let left_desc = self.probe(left);
        let right_desc = self.probe(right);
        let implied = match (&left_desc, &right_desc) {
            (
                Some(Descriptor::Arr { arg: left_arg, ret: left_ret, .. }),
                Some(Descriptor::Arr { arg: right_arg, ret: right_ret, .. }),
            ) => vec![
                Constraint::Unify {
                    prov: prov.clone(),
                    left: *left_arg,
                    right: *right_arg,
                },
                Constraint::Unify {
                    prov: prov.clone(),
                    left: *left_ret,
                    right: *right_ret,
                },
            ],
            _ => Vec::new(),
        };

        if let Err((colliding, existing)) = self.table.unify_var_var(left, right) {
            // Report the merge as if the left class's fact had been applied
            // to the right variable.
            let applied = Constraint::from_descriptor(right, &colliding);
            return Err(self.conflict(applied, existing));
        }
        for constraint in &implied {
            self.apply_inner(constraint)?;
        }
        Ok(())
    }

    fn conflict(&mut self, applied: Constraint, existing: Descriptor) -> KindError {
        KindError::ConstraintConflict {
            applied,
            existing,
            snapshot: self.class_snapshot(),
            var_source: None,
        }
    }

    // ── Occurs check ────────────────────────────────────────────────────

    /// Find circular kind definitions in the solved store.
    ///
    /// A store can be locally consistent pairwise yet encode an infinite
    /// kind, e.g. `v ~ v -> Type`. Classic three-color DFS: nodes are
    /// canonical representatives, edges the argument/result variables of
    /// arrow descriptors. Classes without a descriptor are defaulted to
    /// `Type` in place as the traversal reaches them. Every root is
    /// explored, so independent cycles are all reported in one pass.
    pub fn occurs_check(&mut self) -> Vec<KindError> {
        let mut errors = Vec::new();
        let mut visiting = FxHashSet::default();
        let mut done = FxHashSet::default();
        for i in 0..self.table.len() as u32 {
            let root = self.table.find(KindVar(i));
            if done.contains(&root) {
                continue;
            }
            self.visit(root, &mut visiting, &mut done, &mut errors);
            debug_assert!(visiting.is_empty(), "DFS path must unwind completely");
        }
        errors
    }

    fn visit(
        &mut self,
        root: KindVar,
        visiting: &mut FxHashSet<KindVar>,
        done: &mut FxHashSet<KindVar>,
        errors: &mut Vec<KindError>,
    ) {
        if done.contains(&root) {
            return;
        }
        visiting.insert(root);
        let descriptor = match self.probe(root) {
            Some(descriptor) => descriptor,
            None => {
                // A class nothing constrains is just the base kind.
                self.default_to_type(root);
                Descriptor::Type { prov: Provenance::Default }
            }
        };
        if let Descriptor::Arr { prov, arg, ret } = descriptor {
            for child in [arg, ret] {
                let child_root = self.table.find(child);
                if visiting.contains(&child_root) {
                    // The edge closes back onto the current DFS path. Record
                    // it and skip the edge; siblings and other roots are
                    // still explored.
                    errors.push(KindError::CycleDetected {
                        span: prov.span(),
                        var: child_root,
                        snapshot: self.class_snapshot(),
                        var_source: self.source_of_class(child_root),
                    });
                } else {
                    self.visit(child_root, visiting, done, errors);
                }
            }
        }
        visiting.remove(&root);
        done.insert(root);
    }

    /// Attach a default `Type` descriptor if the class is still unsolved.
    pub(crate) fn default_to_type(&mut self, var: KindVar) {
        if self.probe(var).is_none() {
            self.table
                .unify_var_value(var, Some(Descriptor::Type { prov: Provenance::Default }))
                .expect("defaulting an unsolved class should not fail");
        }
    }

    // ── Resolution ──────────────────────────────────────────────────────

    /// Resolve a variable's kind through the store.
    ///
    /// Descriptor-less classes read as `Type` without being mutated. Only
    /// meaningful on a store that has passed the occurs check; a cyclic
    /// store would not terminate.
    pub fn kind_of(&mut self, var: KindVar) -> Kind {
        match self.probe(var) {
            None | Some(Descriptor::Type { .. }) => Kind::Type,
            Some(Descriptor::Ability { .. }) => Kind::Ability,
            Some(Descriptor::Arr { arg, ret, .. }) => {
                Kind::Arr(Box::new(self.kind_of(arg)), Box::new(self.kind_of(ret)))
            }
        }
    }

    /// Dump every equivalence class for diagnostics.
    pub fn class_snapshot(&mut self) -> StoreSnapshot {
        let mut classes: Vec<ClassSnapshot> = Vec::new();
        let mut index: FxHashMap<KindVar, usize> = FxHashMap::default();
        for i in 0..self.table.len() as u32 {
            let var = KindVar(i);
            let root = self.table.find(var);
            let slot = *index.entry(root).or_insert_with(|| {
                classes.push(ClassSnapshot {
                    repr: root,
                    members: Vec::new(),
                    descriptor: None,
                });
                classes.len() - 1
            });
            classes[slot].members.push(var);
        }
        for (root, slot) in index {
            classes[slot].descriptor = self.table.probe_value(root);
        }
        classes.sort_by_key(|c| c.repr.0);
        StoreSnapshot { classes }
    }
}

impl Default for KindStore {
    fn default() -> Self {
        Self::new()
    }
}

// ── Tests ──────────────────────────────────────────────────────────────
