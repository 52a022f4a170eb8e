//! Kind representation for the Reef kind system.
//!
//! Defines the resolved kind tree (`Kind`), kind variables (`KindVar`),
//! constraint provenance (`Provenance`), and the per-class solved fact
//! (`Descriptor`). These form the foundation of kind inference: every type
//! constructor in a Reef program has a kind built from the base kinds
//! `Type` and `Ability` and the arrow former `k1 -> k2`.

use std::fmt;

use reef_common::Span;

/// A kind variable, identified by a `u32` index into the unification table.
///
/// Kind variables are created during constraint generation and unified with
/// concrete kinds or other variables. The `ena` crate handles the union-find
/// mechanics. Identity is the synthetic index only; the syntactic source of
/// a variable lives in a display-only side table (see [`VarSource`]).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct KindVar(pub u32);

impl fmt::Display for KindVar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "?{}", self.0)
    }
}

/// The program-level type variable a kind variable was created for.
///
/// Used ONLY for display in error messages (e.g. naming `a` instead of
/// `?17`). It is never consulted for identity or equality.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VarSource {
    /// The surface-syntax name of the type variable.
    pub name: String,
    /// Where the type variable appears in source.
    pub span: Span,
}

impl VarSource {
    pub fn new(name: impl Into<String>, span: Span) -> Self {
        VarSource { name: name.into(), span }
    }
}

/// Why a constraint exists.
///
/// Defaults are inserted by the solver itself and may be silently overridden
/// when contradicted; explicit constraints come from program text and make
/// any contradiction a hard, user-facing error.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Provenance {
    /// Inserted automatically as a default.
    Default,
    /// Required by the program at the given source location.
    Explicit(Span),
    /// Synthetic provenance for builtin kind axioms.
    Builtin,
}

impl Provenance {
    /// Whether this constraint was inserted as a default.
    pub fn is_default(&self) -> bool {
        matches!(self, Provenance::Default)
    }

    /// The source location, if the constraint came from program text.
    pub fn span(&self) -> Option<Span> {
        match self {
            Provenance::Explicit(span) => Some(*span),
            Provenance::Default | Provenance::Builtin => None,
        }
    }
}

/// A fully resolved kind.
///
/// This is the query-surface type: once a solve session has succeeded,
/// every kind variable resolves to one of these trees.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Kind {
    /// The kind of ordinary types (`Int`, `List Int`, ...).
    Type,
    /// The kind of abilities (`IO`, `Net`, ...).
    Ability,
    /// An arrow kind `k1 -> k2`, the kind of type constructors.
    Arr(Box<Kind>, Box<Kind>),
}

impl Kind {
    /// Create an arrow kind.
    pub fn arr(arg: Kind, ret: Kind) -> Kind {
        Kind::Arr(Box::new(arg), Box::new(ret))
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Kind::Type => write!(f, "Type"),
            Kind::Ability => write!(f, "Ability"),
            Kind::Arr(arg, ret) => {
                // Arrows are right-associative; parenthesize a left-nested one.
                if matches!(arg.as_ref(), Kind::Arr(..)) {
                    write!(f, "({}) -> {}", arg, ret)
                } else {
                    write!(f, "{} -> {}", arg, ret)
                }
            }
        }
    }
}

/// The solved fact attached to an equivalence class.
///
/// At most one descriptor survives per class, carrying a single best
/// provenance; provenances are never accumulated. A `Type` descriptor with
/// `Provenance::Default` is the "default-inserted" note: a later explicit
/// occurrence of the same fact upgrades the note without changing the fact.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Descriptor {
    /// The class has the base kind `Type`.
    Type { prov: Provenance },
    /// The class has the base kind `Ability`.
    Ability { prov: Provenance },
    /// The class has the arrow kind `arg -> ret`.
    Arr { prov: Provenance, arg: KindVar, ret: KindVar },
}

impl Descriptor {
    /// The provenance of the surviving fact.
    pub fn provenance(&self) -> &Provenance {
        match self {
            Descriptor::Type { prov }
            | Descriptor::Ability { prov }
            | Descriptor::Arr { prov, .. } => prov,
        }
    }

    /// Whether two descriptors assert the same kind shape.
    pub fn same_shape(&self, other: &Descriptor) -> bool {
        matches!(
            (self, other),
            (Descriptor::Type { .. }, Descriptor::Type { .. })
                | (Descriptor::Ability { .. }, Descriptor::Ability { .. })
                | (Descriptor::Arr { .. }, Descriptor::Arr { .. })
        )
    }
}

impl fmt::Display for Descriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Descriptor::Type { .. } => write!(f, "Type"),
            Descriptor::Ability { .. } => write!(f, "Ability"),
            Descriptor::Arr { arg, ret, .. } => write!(f, "{} -> {}", arg, ret),
        }
    }
}

/// An explicit provenance survives over a default one; otherwise the
/// existing (left) side wins.
fn surviving_prov(left: &Provenance, right: &Provenance) -> Provenance {
    if left.is_default() && !right.is_default() {
        right.clone()
    } else {
        left.clone()
    }
}

// ── ena trait implementations ──────────────────────────────────────────

impl ena::unify::UnifyKey for KindVar {
    type Value = Option<Descriptor>;

    fn index(&self) -> u32 {
        self.0
    }

    fn from_index(u: u32) -> Self {
        KindVar(u)
    }

    fn tag() -> &'static str {
        "KindVar"
    }
}

impl ena::unify::UnifyValue for Descriptor {
    type Error = (Descriptor, Descriptor);

    /// Reconcile the descriptors of two classes being merged.
    ///
    /// Same base shape: one fact survives with the better provenance. Two
    /// arrows: the left shape survives; the applier unifies the two arrows'
    /// argument/result variables via implied constraints it derives before
    /// the union. Different shapes: the merge fails with the colliding pair.
    fn unify_values(left: &Self, right: &Self) -> Result<Self, Self::Error> {
        match (left, right) {
            (Descriptor::Type { prov: lp }, Descriptor::Type { prov: rp }) => {
                Ok(Descriptor::Type { prov: surviving_prov(lp, rp) })
            }
            (Descriptor::Ability { prov: lp }, Descriptor::Ability { prov: rp }) => {
                Ok(Descriptor::Ability { prov: surviving_prov(lp, rp) })
            }
            (Descriptor::Arr { prov: lp, arg, ret }, Descriptor::Arr { prov: rp, .. }) => {
                Ok(Descriptor::Arr {
                    prov: surviving_prov(lp, rp),
                    arg: *arg,
                    ret: *ret,
                })
            }
            _ => Err((left.clone(), right.clone())),
        }
    }
}

// ── Tests ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use ena::unify::UnifyValue;

    use super::*;

    #[test]
    fn kind_display() {
        assert_eq!(format!("{}", Kind::Type), "Type");
        assert_eq!(format!("{}", Kind::Ability), "Ability");
        assert_eq!(
            format!("{}", Kind::arr(Kind::Type, Kind::Type)),
            "Type -> Type"
        );
        // Right-nested arrows need no parentheses.
        assert_eq!(
            format!("{}", Kind::arr(Kind::Type, Kind::arr(Kind::Type, Kind::Type))),
            "Type -> Type -> Type"
        );
        // Left-nested arrows do.
        assert_eq!(
            format!("{}", Kind::arr(Kind::arr(Kind::Type, Kind::Type), Kind::Ability)),
            "(Type -> Type) -> Ability"
        );
    }

    #[test]
    fn explicit_provenance_survives_default() {
        let default = Descriptor::Type { prov: Provenance::Default };
        let explicit = Descriptor::Type {
            prov: Provenance::Explicit(Span::new(3, 7)),
        };

        let merged = Descriptor::unify_values(&default, &explicit)
            .expect("same shapes must reconcile");
        assert!(!merged.provenance().is_default());

        // The other way around: the explicit fact is not demoted.
        let merged = Descriptor::unify_values(&explicit, &default)
            .expect("same shapes must reconcile");
        assert!(!merged.provenance().is_default());
    }

    #[test]
    fn base_kind_mismatch_fails() {
        let ty = Descriptor::Type { prov: Provenance::Default };
        let ab = Descriptor::Ability { prov: Provenance::Default };
        let err = Descriptor::unify_values(&ty, &ab).unwrap_err();
        assert!(err.0.same_shape(&ty));
        assert!(err.1.same_shape(&ab));
    }

    #[test]
    fn arrow_reconciliation_keeps_left_shape() {
        let left = Descriptor::Arr {
            prov: Provenance::Default,
            arg: KindVar(0),
            ret: KindVar(1),
        };
        let right = Descriptor::Arr {
            prov: Provenance::Builtin,
            arg: KindVar(2),
            ret: KindVar(3),
        };
        let merged = Descriptor::unify_values(&left, &right).unwrap();
        match merged {
            Descriptor::Arr { arg, ret, prov } => {
                assert_eq!(arg, KindVar(0));
                assert_eq!(ret, KindVar(1));
                assert!(!prov.is_default());
            }
            other => panic!("expected Arr, got {:?}", other),
        }
    }
}
