//! Three-valued decision types.

/// Outcome of a single comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Truth {
    True,
    False,
    /// The compare value is not known yet.
    Unknown,
}

impl From<bool> for Truth {
    fn from(value: bool) -> Self {
        if value {
            Truth::True
        } else {
            Truth::False
        }
    }
}

/// Outcome of reducing a rule or a rule list against partial attributes.
#[derive(Debug, Clone, PartialEq)]
pub enum Reduced<T> {
    /// Satisfied regardless of any attribute not yet supplied.
    Allow,
    /// Can never be satisfied.
    Deny,
    /// Satisfied only if the residual holds once more attributes are known.
    Partial(T),
}

impl<T> Reduced<T> {
    /// Returns true if the decision is allow.
    pub fn is_allowed(&self) -> bool {
        matches!(self, Reduced::Allow)
    }

    /// Returns true if the decision is deny.
    pub fn is_denied(&self) -> bool {
        matches!(self, Reduced::Deny)
    }

    /// Returns true unless the decision is deny.
    ///
    /// This is the optimistic reading used by lenient enforcement.
    pub fn may_allow(&self) -> bool {
        !self.is_denied()
    }

    /// Returns the residual, if any.
    pub fn residual(&self) -> Option<&T> {
        match self {
            Reduced::Partial(residual) => Some(residual),
            _ => None,
        }
    }
}
