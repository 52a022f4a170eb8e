//! Unsolved kind constraints, as produced by constraint generation.

use std::fmt;

use crate::kind::{Descriptor, KindVar, Provenance};

/// A single kind constraint awaiting application.
///
/// Constraints carry rich provenance so that a conflict discovered much
/// later can still point at the program text that demanded the fact. The
/// solved counterpart is [`Descriptor`], which keeps only the single best
/// provenance per equivalence class.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Constraint {
    /// `var` has the base kind `Type`.
    IsType { var: KindVar, prov: Provenance },
    /// `var` has the base kind `Ability`.
    IsAbility { var: KindVar, prov: Provenance },
    /// `var` has the arrow kind `arg -> ret`.
    IsArr {
        var: KindVar,
        prov: Provenance,
        arg: KindVar,
        ret: KindVar,
    },
    /// `left` and `right` have the same kind.
    Unify {
        prov: Provenance,
        left: KindVar,
        right: KindVar,
    },
}

impl Constraint {
    /// The provenance this constraint carries.
    pub fn provenance(&self) -> &Provenance {
        match self {
            Constraint::IsType { prov, .. }
            | Constraint::IsAbility { prov, .. }
            | Constraint::IsArr { prov, .. }
            | Constraint::Unify { prov, .. } => prov,
        }
    }

    /// The variable this constraint is about.
    pub fn subject(&self) -> KindVar {
        match self {
            Constraint::IsType { var, .. }
            | Constraint::IsAbility { var, .. }
            | Constraint::IsArr { var, .. } => *var,
            Constraint::Unify { left, .. } => *left,
        }
    }

    /// Re-express a solved fact as a constraint on `var`.
    ///
    /// Used when two solved classes collide during unification: the merge is
    /// reported as if one class's fact had been applied to the other's
    /// variable, so every conflict uniformly names a constraint plus an
    /// existing fact.
    pub fn from_descriptor(var: KindVar, descriptor: &Descriptor) -> Constraint {
        match descriptor {
            Descriptor::Type { prov } => Constraint::IsType { var, prov: prov.clone() },
            Descriptor::Ability { prov } => Constraint::IsAbility { var, prov: prov.clone() },
            Descriptor::Arr { prov, arg, ret } => Constraint::IsArr {
                var,
                prov: prov.clone(),
                arg: *arg,
                ret: *ret,
            },
        }
    }

    /// Short description of the kind shape this constraint demands.
    pub fn shape(&self) -> String {
        match self {
            Constraint::IsType { .. } => "Type".to_string(),
            Constraint::IsAbility { .. } => "Ability".to_string(),
            Constraint::IsArr { arg, ret, .. } => format!("{} -> {}", arg, ret),
            Constraint::Unify { right, .. } => format!("the kind of {}", right),
        }
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constraint::IsType { var, .. } => write!(f, "{} is Type", var),
            Constraint::IsAbility { var, .. } => write!(f, "{} is Ability", var),
            Constraint::IsArr { var, arg, ret, .. } => {
                write!(f, "{} is {} -> {}", var, arg, ret)
            }
            Constraint::Unify { left, right, .. } => write!(f, "{} ~ {}", left, right),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constraint_display() {
        let c = Constraint::IsArr {
            var: KindVar(0),
            prov: Provenance::Default,
            arg: KindVar(1),
            ret: KindVar(2),
        };
        assert_eq!(c.to_string(), "?0 is ?1 -> ?2");
        let u = Constraint::Unify {
            prov: Provenance::Default,
            left: KindVar(3),
            right: KindVar(4),
        };
        assert_eq!(u.to_string(), "?3 ~ ?4");
    }

    #[test]
    fn from_descriptor_round_trips_shape() {
        let desc = Descriptor::Arr {
            prov: Provenance::Builtin,
            arg: KindVar(7),
            ret: KindVar(8),
        };
        let c = Constraint::from_descriptor(KindVar(9), &desc);
        assert_eq!(c.subject(), KindVar(9));
        assert_eq!(c.shape(), "?7 -> ?8");
    }
}
