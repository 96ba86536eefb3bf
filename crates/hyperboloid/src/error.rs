use thiserror::Error;

/// A kernel input outside the domain of a closed-form formula.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum DomainError {
    /// Inverse disk projection requires `a² + b² < 1`.
    #[error("disk point ({a}, {b}) is not inside the open unit disk")]
    OutsideDisk { a: f64, b: f64 },

    /// The symmetric two-axis translation requires `sinh²(dx)·sinh²(dz) < 1`.
    #[error("symmetric translation by ({dx}, {dz}) has no real solution")]
    DegenerateTranslation { dx: f64, dz: f64 },
}
