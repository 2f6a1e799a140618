//! The optimizer script mini-language.
//!
//! A script is a semicolon-separated sequence of clauses, each naming a
//! pass followed by `-flag value` pairs, e.g.
//! `"mis -p 10 -t 0.005;default -p 5 -gen rng -obj hpwl -cost (hpwl);"`.
//! Scripts are parsed once into a typed command list before any state is
//! touched, so a malformed script fails the run up front.

use strata_diagnostics::{Category, Diagnostic, DiagnosticCode, DiagnosticSink};
use thiserror::Error;

/// A malformed script or an unknown pass name. Fatal before the run.
#[derive(Debug, Error, PartialEq)]
pub enum ScriptError {
    /// The clause names no known pass.
    #[error("unknown pass name `{0}`")]
    UnknownPass(String),
    /// A clause is empty of even a pass name, or a flag is not a flag.
    #[error("malformed script clause `{0}`")]
    MalformedClause(String),
    /// A flag appeared without its value.
    #[error("flag `{flag}` of pass `{pass}` is missing its value")]
    MissingValue {
        /// The pass being parsed.
        pass: String,
        /// The flag with no value.
        flag: String,
    },
    /// A flag value failed to parse.
    #[error("invalid value `{value}` for flag `{flag}` of pass `{pass}`")]
    InvalidValue {
        /// The pass being parsed.
        pass: String,
        /// The offending flag.
        flag: String,
        /// The unparseable value.
        value: String,
    },
}

/// The iteration budget shared by every pass.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PassBudget {
    /// Maximum number of iterations (`-p`).
    pub passes: u32,
    /// Relative-improvement tolerance (`-t`): the pass stops early once an
    /// iteration improves the objective by less than this fraction.
    pub tolerance: f64,
}

impl Default for PassBudget {
    fn default() -> Self {
        Self {
            passes: 1,
            tolerance: 0.01,
        }
    }
}

/// The move generator of the random pass (`-gen`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum MoveGenerator {
    /// Random single-cell relocations and pairwise swaps.
    #[default]
    Rng,
}

/// The named objective of the random pass (`-obj`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ObjectiveKind {
    /// Half-perimeter wirelength.
    #[default]
    Hpwl,
}

/// The acceptance cost expression of the random pass (`-cost`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum CostExpr {
    /// Plain HPWL.
    #[default]
    Hpwl,
}

/// The options of the random (`default`) pass.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RandomParams {
    /// Candidate moves per cell per iteration (`-f`).
    pub frequency: u32,
    /// Move generator.
    pub generator: MoveGenerator,
    /// Scored objective.
    pub objective: ObjectiveKind,
    /// Acceptance cost expression.
    pub cost: CostExpr,
}

impl Default for RandomParams {
    fn default() -> Self {
        Self {
            frequency: 10,
            generator: MoveGenerator::Rng,
            objective: ObjectiveKind::Hpwl,
            cost: CostExpr::Hpwl,
        }
    }
}

/// One parsed script clause.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PassCommand {
    /// Maximum-independent-set batch reassignment (`mis`).
    Mis(PassBudget),
    /// Whole-layout improving swaps (`gs`).
    GlobalSwap(PassBudget),
    /// Adjacent-row improving swaps (`vs`).
    VerticalSwap(PassBudget),
    /// Sliding-window segment reordering (`ro`).
    Reorder(PassBudget),
    /// Greedy random-move hill climbing (`default`).
    Random(PassBudget, RandomParams),
}

impl PassCommand {
    /// The pass name as written in a script.
    pub fn name(&self) -> &'static str {
        match self {
            PassCommand::Mis(_) => "mis",
            PassCommand::GlobalSwap(_) => "gs",
            PassCommand::VerticalSwap(_) => "vs",
            PassCommand::Reorder(_) => "ro",
            PassCommand::Random(..) => "default",
        }
    }

    /// The pass's iteration budget.
    pub fn budget(&self) -> PassBudget {
        match self {
            PassCommand::Mis(b)
            | PassCommand::GlobalSwap(b)
            | PassCommand::VerticalSwap(b)
            | PassCommand::Reorder(b)
            | PassCommand::Random(b, _) => *b,
        }
    }
}

const UNKNOWN_FLAG: DiagnosticCode = DiagnosticCode::new(Category::Optimize, 401);

/// Parses a script into its command list.
///
/// Unknown pass names are a [`ScriptError`]; unknown flags of a known pass
/// are skipped with a diagnostic.
pub fn parse_script(script: &str, sink: &DiagnosticSink) -> Result<Vec<PassCommand>, ScriptError> {
    let mut commands = Vec::new();
    for clause in script.split(';') {
        let mut tokens = clause.split_whitespace();
        let name = match tokens.next() {
            Some(name) => name,
            None => continue, // empty clause, e.g. a trailing semicolon
        };

        let mut budget = PassBudget::default();
        let mut random = RandomParams::default();
        let is_random = name == "default";
        match name {
            "mis" | "gs" | "vs" | "ro" | "default" => {}
            _ => return Err(ScriptError::UnknownPass(name.to_string())),
        }

        while let Some(flag) = tokens.next() {
            if !flag.starts_with('-') {
                return Err(ScriptError::MalformedClause(clause.trim().to_string()));
            }
            let value = tokens.next().ok_or_else(|| ScriptError::MissingValue {
                pass: name.to_string(),
                flag: flag.to_string(),
            })?;
            let invalid = || ScriptError::InvalidValue {
                pass: name.to_string(),
                flag: flag.to_string(),
                value: value.to_string(),
            };
            match flag {
                "-p" => budget.passes = value.parse().map_err(|_| invalid())?,
                "-t" => budget.tolerance = value.parse().map_err(|_| invalid())?,
                "-f" if is_random => random.frequency = value.parse().map_err(|_| invalid())?,
                "-gen" if is_random => match value {
                    "rng" => random.generator = MoveGenerator::Rng,
                    _ => return Err(invalid()),
                },
                "-obj" if is_random => match value {
                    "hpwl" => random.objective = ObjectiveKind::Hpwl,
                    _ => return Err(invalid()),
                },
                "-cost" if is_random => match value {
                    "hpwl" | "(hpwl)" => random.cost = CostExpr::Hpwl,
                    _ => return Err(invalid()),
                },
                _ => {
                    sink.emit(Diagnostic::warning(
                        UNKNOWN_FLAG,
                        format!("ignoring unknown flag `{flag}` of pass `{name}`"),
                    ));
                }
            }
        }

        commands.push(match name {
            "mis" => PassCommand::Mis(budget),
            "gs" => PassCommand::GlobalSwap(budget),
            "vs" => PassCommand::VerticalSwap(budget),
            "ro" => PassCommand::Reorder(budget),
            _ => PassCommand::Random(budget, random),
        });
    }
    Ok(commands)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_script() {
        let sink = DiagnosticSink::new();
        let script = "mis -p 10 -t 0.005;gs -p 10 -t 0.005;vs -p 10 -t 0.005;\
                      ro -p 10 -t 0.005;default -p 5 -f 20 -gen rng -obj hpwl -cost (hpwl);";
        let commands = parse_script(script, &sink).unwrap();
        assert_eq!(commands.len(), 5);
        assert_eq!(
            commands[0],
            PassCommand::Mis(PassBudget {
                passes: 10,
                tolerance: 0.005
            })
        );
        assert_eq!(commands[1].name(), "gs");
        assert_eq!(commands[2].name(), "vs");
        assert_eq!(commands[3].name(), "ro");
        match commands[4] {
            PassCommand::Random(budget, params) => {
                assert_eq!(budget.passes, 5);
                assert_eq!(params.frequency, 20);
                assert_eq!(params.cost, CostExpr::Hpwl);
            }
            ref other => panic!("expected a random pass, got {other:?}"),
        }
        assert!(sink.diagnostics().is_empty());
    }

    #[test]
    fn unknown_pass_is_a_configuration_error() {
        let sink = DiagnosticSink::new();
        assert_eq!(
            parse_script("bogus -p 1;", &sink),
            Err(ScriptError::UnknownPass("bogus".to_string()))
        );
    }

    #[test]
    fn unknown_flag_is_skipped_with_diagnostic() {
        let sink = DiagnosticSink::new();
        let commands = parse_script("gs -p 3 -zz 7;", &sink).unwrap();
        assert_eq!(commands.len(), 1);
        assert_eq!(commands[0].budget().passes, 3);
        assert_eq!(sink.diagnostics().len(), 1);
        assert!(!sink.has_errors());
    }

    #[test]
    fn missing_value_is_rejected() {
        let sink = DiagnosticSink::new();
        assert!(matches!(
            parse_script("mis -p;", &sink),
            Err(ScriptError::MissingValue { .. })
        ));
    }

    #[test]
    fn non_numeric_budget_is_rejected() {
        let sink = DiagnosticSink::new();
        assert!(matches!(
            parse_script("mis -p many;", &sink),
            Err(ScriptError::InvalidValue { .. })
        ));
    }

    #[test]
    fn defaults_apply_when_flags_are_absent() {
        let sink = DiagnosticSink::new();
        let commands = parse_script("ro", &sink).unwrap();
        assert_eq!(commands[0].budget(), PassBudget::default());
    }

    #[test]
    fn empty_and_whitespace_clauses_are_skipped() {
        let sink = DiagnosticSink::new();
        let commands = parse_script("mis -p 1; ; \n;gs -p 1;", &sink).unwrap();
        assert_eq!(commands.len(), 2);
    }
}
