use std::fmt;

/// Lifecycle of a [`super::TraceSession`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SessionState {
    #[default]
    Reset,
    OpenScope,
    Ready,
    Tracing,
}

/// Operations that move a session between states.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionOp {
    Begin,
    Submit,
    End,
    Clear,
    Reset,
    Bind,
    Trace,
}

impl SessionState {
    /// Returns the state reached by applying `op`, or `None` if `op` is not
    /// allowed in this state.
    pub fn transition(self, op: SessionOp) -> Option<Self> {
        use SessionState::*;

        match (self, op) {
            (Reset | Ready, SessionOp::Begin) => Some(OpenScope),
            (OpenScope, SessionOp::Submit) => Some(OpenScope),
            (OpenScope, SessionOp::End) => Some(Ready),
            (Ready | Tracing, SessionOp::Clear) => Some(Ready),
            (_, SessionOp::Reset) => Some(Reset),
            (Ready | Tracing, SessionOp::Bind) => Some(Tracing),
            (Ready | Tracing, SessionOp::Trace) => Some(Tracing),
            _ => None,
        }
    }

    /// Applies `op`, panicking if it's not allowed in this state.
    pub(crate) fn apply(&mut self, op: SessionOp) {
        *self = self.transition(op).unwrap_or_else(|| {
            panic!("cannot {op} trace session in state {self}");
        });
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Reset => "reset",
            SessionState::OpenScope => "open-scope",
            SessionState::Ready => "ready",
            SessionState::Tracing => "tracing",
        };

        write!(f, "{name}")
    }
}

impl fmt::Display for SessionOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionOp::Begin => "begin",
            SessionOp::Submit => "submit to",
            SessionOp::End => "end",
            SessionOp::Clear => "clear",
            SessionOp::Reset => "reset",
            SessionOp::Bind => "bind",
            SessionOp::Trace => "trace",
        };

        write!(f, "{name}")
    }
}
