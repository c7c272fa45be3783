//! Tagged completion status.

/// Response status from a tagged response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Command completed successfully.
    Ok,
    /// Command failed (operational error).
    No,
    /// Command failed (protocol/syntax error).
    Bad,
}

impl Status {
    /// Returns true if this is a successful status.
    #[must_use]
    pub fn is_ok(self) -> bool {
        matches!(self, Self::Ok)
    }

    /// Returns true for the verbs followed by `[code] text`: the three
    /// completion statuses plus `BYE` and `PREAUTH`.
    #[must_use]
    pub fn is_status_verb(verb: &str) -> bool {
        ["OK", "NO", "BAD", "BYE", "PREAUTH"]
            .iter()
            .any(|v| v.eq_ignore_ascii_case(verb))
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Ok => "OK",
            Self::No => "NO",
            Self::Bad => "BAD",
        })
    }
}
