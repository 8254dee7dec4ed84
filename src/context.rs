//! Per-call context: the callee service and the invocation being routed.

use faststr::FastStr;

/// The callee service a selection is performed for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    /// Stable string identifying the remote service independent of method.
    pub service_name: FastStr,
}

impl Target {
    pub fn new(service_name: impl Into<FastStr>) -> Self {
        Self {
            service_name: service_name.into(),
        }
    }
}

/// One remote call request.
///
/// Arguments are opaque to the balancer; only their string forms are ever
/// consumed (by consistent-hash key derivation), so that is what the caller
/// provides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub method: FastStr,
    pub args: Vec<FastStr>,
}

impl Invocation {
    pub fn new(method: impl Into<FastStr>) -> Self {
        Self {
            method: method.into(),
            args: Vec::new(),
        }
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<FastStr>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }
}

/// Key of all per-method balancer state: `"{service}.{method}"`.
pub fn method_key(target: &Target, invocation: &Invocation) -> FastStr {
    FastStr::from(format!("{}.{}", target.service_name, invocation.method))
}
