//! Observable state cells for the data-bound handles.

/// State of a read binding: the data, whether a request is in flight, and
/// the last failure's message.
///
/// During a refetch the previous `data` stays visible while `loading` is
/// set; it is replaced or cleared only when the request settles.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestState<T> {
    /// Payload of the last successful settlement.
    pub data: Option<T>,
    /// Whether a request is currently in flight.
    pub loading: bool,
    /// Message of the last failed settlement, verbatim from the backend.
    pub error: Option<String>,
}

impl<T> RequestState<T> {
    /// Idle empty state: nothing loaded, nothing in flight.
    pub fn idle() -> Self {
        Self {
            data: None,
            loading: false,
            error: None,
        }
    }

    /// Initial state of a binding that fires a request immediately.
    pub(crate) fn loading() -> Self {
        Self {
            data: None,
            loading: true,
            error: None,
        }
    }

    /// Whether the binding has settled with either data or an error.
    pub fn is_settled(&self) -> bool {
        !self.loading && (self.data.is_some() || self.error.is_some())
    }
}

impl<T> Default for RequestState<T> {
    fn default() -> Self {
        Self::idle()
    }
}

/// State of a mutation: in flight, failed, or succeeded.
///
/// `success` is sticky after a successful submit until the owning handle's
/// `reset`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MutationState {
    /// Whether a submit is currently in flight.
    pub loading: bool,
    /// Message of the last failed submit, verbatim from the backend.
    pub error: Option<String>,
    /// Whether the last settled submit succeeded.
    pub success: bool,
}
