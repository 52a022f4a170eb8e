//! Kind errors with provenance and store snapshots.
//!
//! Both error kinds are fatal to the solve session: the program does not
//! kind-check and the caller must not extend the failed state further. Each
//! error carries a [`StoreSnapshot`] taken at the moment of failure so the
//! diagnostic renderer can show the chain of unifications that led two
//! incompatible facts to collide.

use std::fmt;

use reef_common::Span;

use crate::constraint::Constraint;
use crate::kind::{Descriptor, KindVar, VarSource};

/// A dump of the equivalence-class store, taken when an error is recorded.
#[derive(Clone, Debug)]
pub struct StoreSnapshot {
    /// One entry per equivalence class, ordered by representative index.
    pub classes: Vec<ClassSnapshot>,
}

/// One equivalence class as it stood at snapshot time.
#[derive(Clone, Debug)]
pub struct ClassSnapshot {
    /// The canonical representative.
    pub repr: KindVar,
    /// Every variable in the class, the representative included.
    pub members: Vec<KindVar>,
    /// The solved fact, if any.
    pub descriptor: Option<Descriptor>,
}

impl StoreSnapshot {
    /// The class containing `var`, if the snapshot covers it.
    pub fn class_of(&self, var: KindVar) -> Option<&ClassSnapshot> {
        self.classes.iter().find(|c| c.members.contains(&var))
    }
}

impl fmt::Display for StoreSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for class in &self.classes {
            write!(f, "{} {{", class.repr)?;
            for (i, member) in class.members.iter().enumerate() {
                if i > 0 {
                    write!(f, " ")?;
                }
                write!(f, "{}", member)?;
            }
            match &class.descriptor {
                Some(descriptor) => writeln!(f, "}} = {}", descriptor)?,
                None => writeln!(f, "}} unsolved")?,
            }
        }
        Ok(())
    }
}

/// A kind error encountered during constraint solving.
#[derive(Clone, Debug)]
pub enum KindError {
    /// Two incompatible kind facts were demanded of the same variable.
    ConstraintConflict {
        /// The constraint that was being added. For a collision between two
        /// already-solved classes this is one class's fact re-expressed as a
        /// constraint on the other's variable.
        applied: Constraint,
        /// The pre-existing solved fact it contradicts.
        existing: Descriptor,
        /// The store at the moment of conflict.
        snapshot: StoreSnapshot,
        /// The program-level type variable involved, when known.
        var_source: Option<VarSource>,
    },
    /// An arrow kind refers back into itself (an infinite kind).
    CycleDetected {
        /// The location of the arrow constraint that closes the cycle.
        span: Option<Span>,
        /// The variable at which the cycle was detected.
        var: KindVar,
        /// The store at the moment of detection.
        snapshot: StoreSnapshot,
        /// The program-level type variable involved, when known.
        var_source: Option<VarSource>,
    },
}

impl KindError {
    /// A short name for the variable an error is about: the program-level
    /// type variable when known, the raw kind variable otherwise.
    fn subject_name(var: KindVar, var_source: &Option<VarSource>) -> String {
        match var_source {
            Some(source) => source.name.clone(),
            None => var.to_string(),
        }
    }
}

impl fmt::Display for KindError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KindError::ConstraintConflict {
                applied,
                existing,
                var_source,
                ..
            } => {
                let subject = Self::subject_name(applied.subject(), var_source);
                write!(
                    f,
                    "kind mismatch: `{}` cannot be both {} and {}",
                    subject,
                    applied.shape(),
                    existing
                )
            }
            KindError::CycleDetected { var, var_source, .. } => {
                let subject = Self::subject_name(*var, var_source);
                write!(f, "infinite kind: `{}` occurs in its own kind", subject)
            }
        }
    }
}

impl std::error::Error for KindError {}

#[cfg(test)]
mod tests {
    use crate::kind::Provenance;

    use super::*;

    fn snapshot() -> StoreSnapshot {
        StoreSnapshot {
            classes: vec![ClassSnapshot {
                repr: KindVar(0),
                members: vec![KindVar(0), KindVar(1)],
                descriptor: Some(Descriptor::Type { prov: Provenance::Default }),
            }],
        }
    }

    #[test]
    fn conflict_display() {
        let err = KindError::ConstraintConflict {
            applied: Constraint::IsAbility {
                var: KindVar(0),
                prov: Provenance::Default,
            },
            existing: Descriptor::Type { prov: Provenance::Default },
            snapshot: snapshot(),
            var_source: None,
        };
        assert_eq!(
            err.to_string(),
            "kind mismatch: `?0` cannot be both Ability and Type"
        );
    }

    #[test]
    fn conflict_display_prefers_source_name() {
        let err = KindError::ConstraintConflict {
            applied: Constraint::IsAbility {
                var: KindVar(0),
                prov: Provenance::Default,
            },
            existing: Descriptor::Type { prov: Provenance::Default },
            snapshot: snapshot(),
            var_source: Some(VarSource::new("a", Span::new(0, 1))),
        };
        assert_eq!(
            err.to_string(),
            "kind mismatch: `a` cannot be both Ability and Type"
        );
    }

    #[test]
    fn cycle_display() {
        let err = KindError::CycleDetected {
            span: None,
            var: KindVar(3),
            snapshot: snapshot(),
            var_source: None,
        };
        assert_eq!(err.to_string(), "infinite kind: `?3` occurs in its own kind");
    }

    #[test]
    fn snapshot_class_lookup() {
        let snap = snapshot();
        assert!(snap.class_of(KindVar(1)).is_some());
        assert!(snap.class_of(KindVar(9)).is_none());
        let rendered = snap.to_string();
        assert_eq!(rendered, "?0 {?0 ?1} = Type\n");
    }
}
