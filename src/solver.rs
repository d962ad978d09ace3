//! Choice of MILP solver backend and the outcome of a solve.
use anyhow::{Context, Result, ensure};
use highs::HighsModelStatus;
use itertools::Itertools;
use strum::IntoEnumIterator;

/// The MILP solvers which a case can be handed to
#[derive(
    Debug,
    Default,
    Clone,
    Copy,
    PartialEq,
    Eq,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum SolverKind {
    /// HiGHS, which is built into the program
    #[default]
    Highs,
    /// GNU Linear Programming Kit
    Glpk,
    /// COIN-OR branch and cut
    Cbc,
    /// IBM ILOG CPLEX
    Cplex,
    /// Gurobi
    Gurobi,
}

impl SolverKind {
    /// Whether the backend is compiled into this program
    pub fn is_available(self) -> bool {
        matches!(self, Self::Highs)
    }

    /// Look up a solver by name, checking that it can be used.
    ///
    /// Names are not case sensitive.
    pub fn from_name(name: &str) -> Result<Self> {
        let kind: Self = name.parse().with_context(|| {
            format!(
                "Unknown solver '{name}'. Choose one of: {}",
                Self::iter().join(", ")
            )
        })?;

        ensure!(
            kind.is_available(),
            "Solver '{kind}' is not available. Install it or choose another ({}).",
            Self::iter().filter(|kind| kind.is_available()).join(", ")
        );

        Ok(kind)
    }
}

/// Options passed through to the solver
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SolverOptions {
    /// Time limit for the solve, in seconds
    pub time_limit: Option<f64>,
    /// Relative MIP gap at which the solver may stop
    pub mip_rel_gap: Option<f64>,
    /// Whether to show the solver's own output on the console
    pub tee: bool,
}

/// How a solve ended
#[derive(Debug, Clone, PartialEq, derive_more::Display)]
pub enum Termination {
    /// A proven optimal solution was found
    #[display("optimal")]
    Optimal,
    /// No solution satisfies the constraints
    #[display("infeasible")]
    Infeasible,
    /// The objective can be increased without limit
    #[display("unbounded")]
    Unbounded,
    /// The solver could not tell which of the two applies
    #[display("infeasible_or_unbounded")]
    InfeasibleOrUnbounded,
    /// The solve stopped at its time limit
    #[display("time_limit")]
    TimeLimit,
    /// The solve stopped at its iteration limit
    #[display("iteration_limit")]
    IterationLimit,
    /// Any other outcome, with the solver's description of it
    #[display("error({_0})")]
    Error(String),
}

impl Termination {
    /// Whether the solve found a proven optimum
    pub fn is_optimal(&self) -> bool {
        *self == Self::Optimal
    }
}

impl From<HighsModelStatus> for Termination {
    fn from(status: HighsModelStatus) -> Self {
        match status {
            // A model with no variables is trivially solved
            HighsModelStatus::Optimal | HighsModelStatus::ModelEmpty => Self::Optimal,
            HighsModelStatus::Infeasible => Self::Infeasible,
            HighsModelStatus::Unbounded => Self::Unbounded,
            HighsModelStatus::UnboundedOrInfeasible => Self::InfeasibleOrUnbounded,
            HighsModelStatus::ReachedTimeLimit => Self::TimeLimit,
            HighsModelStatus::ReachedIterationLimit => Self::IterationLimit,
            status => Self::Error(format!("{status:?}")),
        }
    }
}
