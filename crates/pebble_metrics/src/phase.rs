//! Named stages of a simulation frame

/// One stage of the per-frame pipeline, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Pointer,
    Integrate,
    Boundary,
    GridRebuild,
    Collide,
    Render,
}

impl Phase {
    pub const COUNT: usize = 6;

    pub const ALL: [Phase; Phase::COUNT] = [
        Phase::Pointer,
        Phase::Integrate,
        Phase::Boundary,
        Phase::GridRebuild,
        Phase::Collide,
        Phase::Render,
    ];

    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn name(self) -> &'static str {
        match self {
            Phase::Pointer => "pointer",
            Phase::Integrate => "integrate",
            Phase::Boundary => "boundary",
            Phase::GridRebuild => "grid_rebuild",
            Phase::Collide => "collide",
            Phase::Render => "render",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indices_match_order() {
        for (i, phase) in Phase::ALL.iter().enumerate() {
            assert_eq!(phase.index(), i);
        }
    }
}
