use std::fmt;

use crate::base::display_ext::DisplayOptionExt;
use crate::metrics::Metric;
use crate::metrics::Metrics;

/// How an observed metric must relate to the expected one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Op {
    AtLeast,
    Equal,
}

/// A metric value a [`Wait`](crate::metrics::Wait) blocks on.
#[derive(Debug)]
pub(crate) struct Condition {
    op: Op,
    expect: Metric,
}

impl Condition {
    pub(crate) fn at_least(expect: Metric) -> Self {
        Self {
            op: Op::AtLeast,
            expect,
        }
    }

    pub(crate) fn equal(expect: Metric) -> Self {
        Self {
            op: Op::Equal,
            expect,
        }
    }

    pub(crate) fn is_met(&self, metrics: &Metrics) -> bool {
        match self.op {
            Op::AtLeast => metrics >= &self.expect,
            Op::Equal => metrics == &self.expect,
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = match self.op {
            Op::AtLeast => ">=",
            Op::Equal => "==",
        };

        write!(f, "{}{}", self.expect.name(), op)?;

        match &self.expect {
            Metric::Term(v)
            | Metric::LastLogIndex(v)
            | Metric::CommitIndex(v)
            | Metric::AppliedIndex(v) => write!(f, "{}", v),
            Metric::Snapshot(v) => write!(f, "{}", v.display()),
        }
    }
}
