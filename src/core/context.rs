/// Token identifying the context (active channel) a fetch was issued under.
///
/// Tokens are opaque and only meaningful to the [`ContextGuard`] that issued
/// them. The zero value is the "no context yet" sentinel a guard starts in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContextToken(u64);

/// Monotonic generation counter owned by the controller.
///
/// Every channel switch calls [`begin`](ContextGuard::begin) exactly once and
/// threads the returned token through the completion messages of the fetches
/// it starts. When a completion arrives, the single `update` site that would
/// apply it checks [`is_current`](ContextGuard::is_current) first; a stale
/// result is dropped without touching state. Because both the increment and
/// the check run on the one controller task, they are totally ordered and no
/// locking is needed.
#[derive(Debug, Default)]
pub struct ContextGuard {
    current: u64,
}

impl ContextGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new context. The returned token is strictly greater than every
    /// previously issued token and becomes the current one; all older tokens
    /// are permanently stale from this point on.
    pub fn begin(&mut self) -> ContextToken {
        self.current += 1;
        ContextToken(self.current)
    }

    /// True iff `token` is the most recently issued token. Side-effect free.
    pub fn is_current(&self, token: ContextToken) -> bool {
        token.0 == self.current
    }

    /// The token currently in force, without starting a new context. Fetches
    /// that extend the active context (detail panes, load-more) capture this
    /// at issuance. Before any switch it is the "no context yet" sentinel.
    pub fn current(&self) -> ContextToken {
        ContextToken(self.current)
    }
}
