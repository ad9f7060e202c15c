//! The format-script interpreter.
//!
//! Direct interpretation over source lines: each statement is dispatched
//! as it is reached, loop/conditional bodies are carved out with the
//! block extractor and executed recursively, and shapes accumulate on the
//! run's output list. There is no AST.
//!
//! One run owns all of its state (environment, input cursor, shape list,
//! point buffer, group id, deadline), so concurrent runs never share
//! anything and identical inputs reproduce identical output.

mod statement;


use log::debug;

use crate::block::{self, Line};
use crate::error::{ErrorKind, RunResult, ScriptError};
use crate::shape::{Shape, ShapeIds, Vertex};
use crate::stream::TokenStream;
use crate::timeout::Deadline;
use crate::variables::Variables;

/// Default execution budget in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 3000;

// ---------------------------------------------------------------------------
// Control flow
// ---------------------------------------------------------------------------

/// Control-flow outcome of executing a statement or block.
///
/// `break`/`continue` travel as ordinary return values up to the nearest
/// enclosing loop; errors travel separately through `Result`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Flow {
    Normal,
    Break,
    Continue,
}

// ---------------------------------------------------------------------------
// Interpreter state
// ---------------------------------------------------------------------------

/// The run's mutable state plus its output.
pub struct Interpreter {
    /// Variable environment.
    variables: Variables,
    /// Cursor over the raw input data.
    stream: TokenStream,
    /// Emitted shapes, in emission order.
    shapes: Vec<Shape>,
    /// Per-type id counters.
    ids: ShapeIds,
    /// Staging buffer filled by `Push`, drained by zero-arg `Poly`.
    point_buffer: Vec<Vertex>,
    /// Innermost active `group` id, if any.
    current_group: Option<String>,
    /// `rep` nesting depth; `break`/`continue` require this nonzero.
    loop_depth: u32,
    /// Cooperative wall-clock budget.
    deadline: Deadline,
}

impl Interpreter {
    /// Create an interpreter over the given input data, starting the
    /// execution deadline now.
    #[must_use]
    pub fn new(input_data: &str, timeout_ms: u64) -> Self {
        Self {
            variables: Variables::new(),
            stream: TokenStream::new(input_data),
            shapes: Vec::new(),
            ids: ShapeIds::default(),
            point_buffer: Vec::new(),
            current_group: None,
            loop_depth: 0,
            deadline: Deadline::starting_now(timeout_ms),
        }
    }

    /// Run a format script to completion.
    pub fn run(&mut self, script: &str) -> RunResult<()> {
        debug!("starting run over {} script bytes", script.len());
        let lines = block::split_lines(script);
        // Top-level statements sit at column 0. Flow cannot escape here:
        // break/continue outside a loop fail before they propagate.
        self.exec_block(&lines, 0)?;
        debug!("run finished with {} shapes", self.shapes.len());
        Ok(())
    }

    /// The emitted shapes.
    #[must_use]
    pub fn shapes(&self) -> &[Shape] {
        &self.shapes
    }

    /// Consume the interpreter, yielding the shape list.
    #[must_use]
    pub fn into_shapes(self) -> Vec<Shape> {
        self.shapes
    }

    /// Execute the statements of one block at the given baseline column.
    fn exec_block(&mut self, lines: &[Line<'_>], baseline: usize) -> RunResult<Flow> {
        let mut i = 0;
        while i < lines.len() {
            self.deadline.check()?;
            let line = lines[i];
            if block::is_blank(line.text) {
                i += 1;
                continue;
            }
            if block::indent_width(line.text) > baseline {
                return Err(ScriptError::new(ErrorKind::Indentation, "unexpected indent")
                    .with_line(line.number));
            }
            let (flow, consumed) = self.exec_statement(lines, i, baseline)?;
            if flow != Flow::Normal {
                return Ok(flow);
            }
            i += consumed;
        }
        Ok(Flow::Normal)
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

/// The outcome of [`interpret`]: a shape list or an error message.
///
/// Exactly one side is meaningful: when `error` is set, `shapes` is
/// empty.
#[derive(Debug, Clone, PartialEq)]
pub struct Interpretation {
    /// Emitted shapes, in emission order.
    pub shapes: Vec<Shape>,
    /// Terminal error message, if the run failed.
    pub error: Option<String>,
}

/// Interpret `format_script` against `input_data` under a wall-clock
/// budget of `timeout_ms` milliseconds.
#[must_use]
pub fn interpret(format_script: &str, input_data: &str, timeout_ms: u64) -> Interpretation {
    let mut interp = Interpreter::new(input_data, timeout_ms);
    match interp.run(format_script) {
        Ok(()) => Interpretation {
            shapes: interp.into_shapes(),
            error: None,
        },
        Err(err) => Interpretation {
            shapes: Vec::new(),
            error: Some(err.to_string()),
        },
    }
}
