use thiserror::Error;

/// Fatal inference failures. Any of these aborts the run.
#[derive(Debug, Error)]
pub enum InferError {
    #[error("cyclic hierarchy detected: {}", join_orders(.path, " -> "))]
    CyclicHierarchy { path: Vec<usize> },
}

/// Non-fatal findings collected while inferring. Affected rules are left
/// unmerged; output stays valid.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Warning {
    #[error("malformed query '{text}' at byte {position}: {reason}")]
    MalformedQuery {
        text: String,
        position: usize,
        reason: String,
    },

    #[error("label merge of rules [{}] dropped: {reason}", join_orders(.members, ", "))]
    AmbiguousMergeField { members: Vec<usize>, reason: String },

    #[error("merge of rules [{}] blocked: {}", join_orders(.members, ", "), .reasons.join("; "))]
    UnsafeMergeBlocked {
        members: Vec<usize>,
        reasons: Vec<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown condition field '{0}'")]
pub struct UnknownField(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown merge level '{0}'; expected none, conservative, aggressive or interactive")]
pub struct UnknownMergeLevel(pub String);

fn join_orders(orders: &[usize], sep: &str) -> String {
    orders
        .iter()
        .map(usize::to_string)
        .collect::<Vec<_>>()
        .join(sep)
}
