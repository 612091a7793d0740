/// How snapshot materialization resolves fields whose value is assigned by
/// the backend at write-commit time and is not yet known locally.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ServerTimestampBehavior {
    /// Surface the pending sentinel untouched.
    #[default]
    None,
    /// Substitute a locally estimated value.
    Estimate,
    /// Substitute the field's previous committed value.
    Previous,
}

/// Options forwarded verbatim to the client's snapshot materialization.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SnapshotOptions {
    pub server_timestamps: ServerTimestampBehavior,
}

/// Per-binding configuration shared by all document and collection bindings.
#[derive(Clone, Debug)]
pub struct BindingOptions {
    /// Forwarded to every read and listen issued by the binding.
    pub snapshot: SnapshotOptions,
    /// When true (the default), failures propagate to the registered change
    /// observers' error callbacks; when false they are captured into the
    /// binding's `error` field for the caller to branch on.
    pub throw_error: bool,
}

impl Default for BindingOptions {
    fn default() -> Self {
        Self {
            snapshot: SnapshotOptions::default(),
            throw_error: true,
        }
    }
}

/// Configuration for the paginated collection bindings.
#[derive(Clone, Debug)]
pub struct PaginateOptions {
    /// Page size; the binding over-fetches one extra item per page to derive
    /// `has_more`.
    pub limit: usize,
    /// First page to request; pages only ever grow from here.
    pub default_page: u32,
    /// Forwarded to the wrapped collection binding.
    pub binding: BindingOptions,
}

impl Default for PaginateOptions {
    fn default() -> Self {
        Self {
            limit: 20,
            default_page: 1,
            binding: BindingOptions::default(),
        }
    }
}
