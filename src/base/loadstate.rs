/// Where a request currently is in its exchange with the server.
///
/// A request walks `Unopened → Opened → Sent → AwaitingResponse` and then
/// either finishes (`Done`), loops back through `Redirecting`, or makes a
/// single `RetryingAuth` pass after a digest challenge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadState {
    /// No connection yet.
    #[default]
    Unopened,

    /// Connected; the request message has not been written.
    Opened,

    /// The request message is on the wire.
    Sent,

    /// A response has been parsed and is being classified.
    AwaitingResponse,

    /// Following a `Location` header.
    Redirecting,

    /// Resending with a digest `Authorization` header.
    RetryingAuth,

    /// A final response is available.
    Done,
}

impl LoadState {
    /// Whether the socket is expected to be connected in this state.
    pub fn is_connected(self) -> bool {
        !matches!(self, LoadState::Unopened | LoadState::Done)
    }
}
