//! Generation context.
//!
//! The generation context is the only mutable state threaded through the
//! generators, and it is threaded explicitly: the per-call [`Ctx`] is `Copy`
//! and cloned with an incremented indent for nested scopes, never shared.
//! The phase machine runs `Idle → EmittingDeclarationUnit →
//! EmittingDefinitionUnit → Done` once per unit.

/// Which output unit is being rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitKind {
    /// The header: signatures only.
    Declaration,
    /// The source: full bodies, plus the synthesized entry point.
    Definition,
}

/// The generation phase of a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    EmittingDeclarationUnit,
    EmittingDefinitionUnit,
    Done,
}

impl Phase {
    /// Whether `next` is a legal successor of `self`.
    pub fn can_advance_to(self, next: Phase) -> bool {
        matches!(
            (self, next),
            (Phase::Idle, Phase::EmittingDeclarationUnit)
                | (Phase::EmittingDeclarationUnit, Phase::EmittingDefinitionUnit)
                | (Phase::EmittingDefinitionUnit, Phase::Done)
        )
    }
}

/// Per-call rendering context: the unit being emitted and the indent level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ctx {
    pub unit: UnitKind,
    pub indent: usize,
}

impl Ctx {
    pub fn declaration() -> Ctx {
        Ctx {
            unit: UnitKind::Declaration,
            indent: 0,
        }
    }

    pub fn definition() -> Ctx {
        Ctx {
            unit: UnitKind::Definition,
            indent: 0,
        }
    }

    /// A child context one level deeper. This is a copy; the parent's indent
    /// is untouched.
    pub fn nested(self) -> Ctx {
        Ctx {
            unit: self.unit,
            indent: self.indent + 1,
        }
    }
}
