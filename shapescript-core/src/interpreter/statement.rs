//! Statement dispatch and execution.
//!
//! Implements the per-line dispatcher plus the individual statement
//! handlers: `Read`, `rep` loops, `group` blocks, if/elif/else chains,
//! break/continue, and the shape-emitting commands.

use log::trace;

use crate::block::{self, Line};
use crate::command::Command;
use crate::error::{ErrorKind, RunResult, ScriptError};
use crate::expr;
use crate::shape::{Shape, ShapeKind, Vertex, PALETTE};
use crate::variables;

use super::{Flow, Interpreter};

impl Interpreter {
    /// Execute the statement starting at `lines[idx]`.
    ///
    /// Returns the resulting control flow and the number of lines
    /// consumed (the statement line plus any blocks it owns).
    pub(super) fn exec_statement(
        &mut self,
        lines: &[Line<'_>],
        idx: usize,
        baseline: usize,
    ) -> RunResult<(Flow, usize)> {
        let line = lines[idx];
        let content = block::strip_comment(line.text).trim();
        trace!("line {}: {content}", line.number);

        let Some(head) = content.split_whitespace().next() else {
            return Ok((Flow::Normal, 1));
        };
        // Block headers may carry the `:` glued to the keyword (`else:`).
        let head_keyword = head.strip_suffix(':').unwrap_or(head);

        match Command::from_keyword(head_keyword) {
            Some(Command::Rep) => {
                return self.exec_rep_statement(lines, idx, baseline, content, head_keyword);
            }
            Some(Command::Group) => {
                return self.exec_group_statement(lines, idx, baseline, content, head_keyword);
            }
            Some(Command::If) => {
                return self.exec_if_chain(lines, idx, baseline, content, head_keyword);
            }
            Some(Command::Elif) => {
                return Err(
                    ScriptError::new(ErrorKind::Syntax, "'elif' without matching 'if'")
                        .with_line(line.number),
                );
            }
            Some(Command::Else) => {
                return Err(
                    ScriptError::new(ErrorKind::Syntax, "'else' without matching 'if'")
                        .with_line(line.number),
                );
            }
            _ => {}
        }

        // Single-line statements; the keyword must stand alone, with no
        // glued `:`.
        match Command::from_keyword(head) {
            Some(cmd @ (Command::Break | Command::Continue)) => {
                let flow = self.check_break_continue(cmd, content, line.number)?;
                Ok((flow, 1))
            }
            Some(Command::Read) => {
                self.exec_read(rest_of(content, head), line.number)?;
                Ok((Flow::Normal, 1))
            }
            Some(cmd) => {
                self.exec_shape_command(cmd, rest_of(content, head));
                Ok((Flow::Normal, 1))
            }
            None => Err(
                ScriptError::new(ErrorKind::Syntax, format!("Unknown command `{head}`"))
                    .with_line(line.number),
            ),
        }
    }

    // =======================================================================
    // Control flow
    // =======================================================================

    /// Validate a bare `break`/`continue` and turn it into a flow value.
    fn check_break_continue(
        &self,
        cmd: Command,
        content: &str,
        line_number: usize,
    ) -> RunResult<Flow> {
        let keyword = cmd.keyword();
        if content.split_whitespace().nth(1).is_some() {
            return Err(ScriptError::new(
                ErrorKind::Syntax,
                format!("'{keyword}' takes no arguments"),
            )
            .with_line(line_number));
        }
        if self.loop_depth == 0 {
            return Err(ScriptError::new(
                ErrorKind::Syntax,
                format!("'{keyword}' outside of a loop"),
            )
            .with_line(line_number));
        }
        Ok(if cmd == Command::Break {
            Flow::Break
        } else {
            Flow::Continue
        })
    }

    /// `rep [var] <count>:` evaluates the count once, then runs the block
    /// that many times with a fresh scope per iteration.
    fn exec_rep_statement(
        &mut self,
        lines: &[Line<'_>],
        idx: usize,
        baseline: usize,
        content: &str,
        keyword: &str,
    ) -> RunResult<(Flow, usize)> {
        let line = lines[idx];
        let header = header_body(content, keyword, line.number)?;
        if header.is_empty() {
            return Err(
                ScriptError::new(ErrorKind::Syntax, "'rep' header needs an iteration count")
                    .with_line(line.number),
            );
        }

        // `rep i n:` binds `i`; `rep n:` is just a count. The induction
        // variable form needs a valid name AND a remaining expression.
        let (var, count_src) = match header.split_once(|c: char| c.is_whitespace()) {
            Some((first, rest)) if variables::is_valid_name(first) && !rest.trim().is_empty() => {
                (Some(first), rest.trim())
            }
            _ => (None, header),
        };

        let count = expr::evaluate(count_src, &self.variables)
            .map_err(|e| e.with_line(line.number))?;
        // Truncate toward zero; NaN truncates to 0.
        let iterations = count as i64;

        let (body, block_col) = block::extract_block(lines, idx, baseline);
        let Some(block_col) = block_col else {
            return Err(
                ScriptError::new(ErrorKind::Indentation, "expected an indented block")
                    .with_line(line.number),
            );
        };

        self.loop_depth += 1;
        let result = self.run_iterations(var, iterations, body, block_col);
        self.loop_depth -= 1;
        result?;
        Ok((Flow::Normal, 1 + body.len()))
    }

    fn run_iterations(
        &mut self,
        var: Option<&str>,
        iterations: i64,
        body: &[Line<'_>],
        block_col: usize,
    ) -> RunResult<()> {
        for index in 0..iterations.max(0) {
            self.deadline.check()?;
            self.variables.push_scope();
            if let Some(name) = var {
                self.variables.define(name, index as f64);
            }
            let flow = self.exec_block(body, block_col);
            self.variables.pop_scope();
            match flow? {
                Flow::Break => break,
                Flow::Continue | Flow::Normal => {}
            }
        }
        Ok(())
    }

    /// `group <id>:` runs the block with a group id applied to every
    /// shape emitted inside it, restoring the previous id afterwards.
    fn exec_group_statement(
        &mut self,
        lines: &[Line<'_>],
        idx: usize,
        baseline: usize,
        content: &str,
        keyword: &str,
    ) -> RunResult<(Flow, usize)> {
        let line = lines[idx];
        let header = header_body(content, keyword, line.number)?;
        if header.is_empty() {
            return Err(ScriptError::new(ErrorKind::Syntax, "'group' header needs an id")
                .with_line(line.number));
        }
        let id = if let Some(text) = quoted_text(header) {
            text.to_owned()
        } else {
            let value = expr::evaluate(header, &self.variables)
                .map_err(|e| e.with_line(line.number))?;
            format!("{value}")
        };

        let (body, block_col) = block::extract_block(lines, idx, baseline);
        let Some(block_col) = block_col else {
            return Err(
                ScriptError::new(ErrorKind::Indentation, "expected an indented block")
                    .with_line(line.number),
            );
        };

        let previous = self.current_group.replace(id);
        let flow = self.exec_block(body, block_col);
        self.current_group = previous;
        Ok((flow?, 1 + body.len()))
    }

    /// `if <cond>:` plus any `elif`/`else` continuation lines at the same
    /// column. Headers are checked top-to-bottom and the first truthy one
    /// runs; later headers are still syntax-checked so malformed chains
    /// fail even when unreachable.
    fn exec_if_chain(
        &mut self,
        lines: &[Line<'_>],
        idx: usize,
        baseline: usize,
        content: &str,
        keyword: &str,
    ) -> RunResult<(Flow, usize)> {
        let line = lines[idx];
        let condition = header_body(content, keyword, line.number)?;
        if condition.is_empty() {
            return Err(ScriptError::new(ErrorKind::Syntax, "'if' header needs a condition")
                .with_line(line.number));
        }

        let (body, block_col) = block::extract_block(lines, idx, baseline);
        let Some(block_col) = block_col else {
            return Err(
                ScriptError::new(ErrorKind::Indentation, "expected an indented block")
                    .with_line(line.number),
            );
        };

        let mut flow = Flow::Normal;
        let mut matched = false;
        let taken = expr::evaluate(condition, &self.variables)
            .map_err(|e| e.with_line(line.number))?;
        if expr::truthy(taken) {
            flow = self.exec_block(body, block_col)?;
            matched = true;
        }
        let mut next = idx + 1 + body.len();

        // Chain continuations: elif/else lines at the same column.
        loop {
            let mut j = next;
            while j < lines.len() && block::is_blank(lines[j].text) {
                j += 1;
            }
            if j >= lines.len() {
                break;
            }
            let cont = lines[j];
            let cont_content = block::strip_comment(cont.text).trim();
            let Some(cont_head) = cont_content.split_whitespace().next() else {
                break;
            };
            let cont_keyword = cont_head.strip_suffix(':').unwrap_or(cont_head);
            let cmd = Command::from_keyword(cont_keyword);
            let in_chain = block::indent_width(cont.text) == baseline
                && matches!(cmd, Some(Command::Elif | Command::Else));
            if !in_chain {
                break;
            }

            let header = header_body(cont_content, cont_keyword, cont.number)?;
            let (cont_body, cont_col) = block::extract_block(lines, j, baseline);
            let Some(cont_col) = cont_col else {
                return Err(
                    ScriptError::new(ErrorKind::Indentation, "expected an indented block")
                        .with_line(cont.number),
                );
            };
            next = j + 1 + cont_body.len();

            if cmd == Some(Command::Elif) {
                if header.is_empty() {
                    return Err(
                        ScriptError::new(ErrorKind::Syntax, "'elif' header needs a condition")
                            .with_line(cont.number),
                    );
                }
                if !matched {
                    let taken = expr::evaluate(header, &self.variables)
                        .map_err(|e| e.with_line(cont.number))?;
                    if expr::truthy(taken) {
                        flow = self.exec_block(cont_body, cont_col)?;
                        matched = true;
                    }
                }
            } else {
                if !header.is_empty() {
                    return Err(ScriptError::new(ErrorKind::Syntax, "'else' takes no condition")
                        .with_line(cont.number));
                }
                if !matched {
                    flow = self.exec_block(cont_body, cont_col)?;
                }
                // Nothing may follow `else` in the same chain.
                break;
            }
        }

        Ok((flow, next - idx))
    }

    // =======================================================================
    // Input
    // =======================================================================

    /// `Read v1 v2 ...` binds one input number per name.
    fn exec_read(&mut self, names: &str, line_number: usize) -> RunResult<()> {
        for name in names.split_whitespace() {
            if !variables::is_valid_name(name) {
                return Err(ScriptError::new(
                    ErrorKind::Syntax,
                    format!("Invalid variable name `{name}`"),
                )
                .with_line(line_number));
            }
            let value = self
                .stream
                .consume_number()
                .map_err(|e| e.with_line(line_number))?;
            self.variables.set(name, value);
        }
        Ok(())
    }

    // =======================================================================
    // Shape commands
    // =======================================================================

    /// Execute one shape-emitting command against its classified
    /// arguments. Under-supplied commands are deliberately silent no-ops.
    fn exec_shape_command(&mut self, cmd: Command, args_src: &str) {
        let mut numbers: Vec<f64> = Vec::new();
        let mut strings: Vec<String> = Vec::new();
        let mut color: Option<String> = None;
        for arg in self.classify_args(args_src) {
            match arg {
                Arg::Number(v) => numbers.push(v),
                Arg::Str(s) => strings.push(s),
                Arg::Color(c) => {
                    if color.is_none() {
                        color = Some(c);
                    }
                }
            }
        }
        let label = strings.first().cloned();

        match cmd {
            Command::Point => {
                if let [x, y, ..] = numbers[..] {
                    self.emit(ShapeKind::Point { x, y }, color, label);
                }
            }
            Command::Push => {
                if let [x, y, ..] = numbers[..] {
                    self.point_buffer.push(Vertex { x, y });
                }
            }
            Command::Line => {
                if let [x1, y1, x2, y2, ..] = numbers[..] {
                    self.emit(ShapeKind::Line { x1, y1, x2, y2 }, color, label);
                }
            }
            Command::Seg => {
                if let [x1, y1, x2, y2, ..] = numbers[..] {
                    self.emit(ShapeKind::Segment { x1, y1, x2, y2 }, color, label);
                }
            }
            Command::Circle => {
                if let [x, y, r, ..] = numbers[..] {
                    self.emit(ShapeKind::Circle { x, y, r }, color, label);
                }
            }
            Command::Poly => self.exec_poly(&numbers, color, label),
            Command::Text => {
                if let [x, y, ..] = numbers[..] {
                    // The content is the LAST string argument.
                    if let Some(content) = strings.last().cloned() {
                        let font_size = numbers.get(2).copied().unwrap_or(12.0);
                        self.emit(
                            ShapeKind::Text {
                                x,
                                y,
                                content,
                                font_size,
                            },
                            color,
                            None,
                        );
                    }
                }
            }
            _ => {}
        }
    }

    /// `Poly` with no numeric arguments drains the point buffer; with six
    /// or more (an even count) it takes its vertices inline. Anything in
    /// between is a no-op that leaves the buffer untouched.
    fn exec_poly(&mut self, numbers: &[f64], color: Option<String>, label: Option<String>) {
        if numbers.len() >= 6 && numbers.len() % 2 == 0 {
            let points = numbers
                .chunks_exact(2)
                .map(|pair| Vertex {
                    x: pair[0],
                    y: pair[1],
                })
                .collect();
            self.emit(ShapeKind::Polygon { points }, color, label);
        } else if numbers.is_empty() && !self.point_buffer.is_empty() {
            let points = self.point_buffer.clone();
            self.point_buffer.clear();
            self.emit(ShapeKind::Polygon { points }, color, label);
        }
    }

    /// Tokenize the argument text and classify each token independently.
    ///
    /// A token that fails to evaluate as an expression silently becomes
    /// an opaque label, a long-standing quirk that scripts rely on.
    fn classify_args(&self, src: &str) -> Vec<Arg> {
        split_tokens(src)
            .into_iter()
            .map(|tok| match tok {
                RawToken::Quoted(text) => Arg::Str(text),
                RawToken::Bare(text) => {
                    if text.starts_with('#') {
                        Arg::Color(text)
                    } else {
                        match expr::evaluate(&text, &self.variables) {
                            Ok(value) => Arg::Number(value),
                            Err(_) => Arg::Str(text),
                        }
                    }
                }
            })
            .collect()
    }

    /// Append a shape, assigning its id, the palette fallback color, and
    /// the active group.
    fn emit(&mut self, kind: ShapeKind, color: Option<String>, label: Option<String>) {
        let color = color.unwrap_or_else(|| PALETTE[self.shapes.len() % PALETTE.len()].to_owned());
        let id = self.ids.next_id(&kind);
        self.shapes.push(Shape {
            id,
            color,
            label,
            group_id: self.current_group.clone(),
            kind,
        });
    }
}

// ---------------------------------------------------------------------------
// Argument tokenization
// ---------------------------------------------------------------------------

/// A classified shape-command argument.
enum Arg {
    Number(f64),
    Str(String),
    Color(String),
}

/// A raw argument token before classification.
enum RawToken {
    Quoted(String),
    Bare(String),
}

/// Whitespace/quote tokenization of a command's argument text.
fn split_tokens(src: &str) -> Vec<RawToken> {
    let chars: Vec<char> = src.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if c.is_whitespace() {
            i += 1;
            continue;
        }
        if c == '"' || c == '\'' {
            let quote = c;
            i += 1;
            let start = i;
            while i < chars.len() && chars[i] != quote {
                i += 1;
            }
            tokens.push(RawToken::Quoted(chars[start..i].iter().collect()));
            if i < chars.len() {
                i += 1; // closing quote
            }
        } else {
            let start = i;
            while i < chars.len() && !chars[i].is_whitespace() && chars[i] != '"' && chars[i] != '\''
            {
                i += 1;
            }
            tokens.push(RawToken::Bare(chars[start..i].iter().collect()));
        }
    }
    tokens
}

// ---------------------------------------------------------------------------
// Header helpers
// ---------------------------------------------------------------------------

/// Split a block header into its expression text: validates the trailing
/// `:` and strips the leading keyword.
fn header_body<'a>(content: &'a str, keyword: &str, line_number: usize) -> RunResult<&'a str> {
    let Some(without_colon) = content.strip_suffix(':') else {
        return Err(ScriptError::new(
            ErrorKind::Syntax,
            format!("Missing `:` after '{keyword}' header"),
        )
        .with_line(line_number));
    };
    Ok(without_colon[keyword.len()..].trim())
}

/// The text after the leading keyword token.
fn rest_of<'a>(content: &'a str, head: &str) -> &'a str {
    content[head.len()..].trim_start()
}

/// The inner text of a `"..."` or `'...'` literal, if `s` is one.
fn quoted_text(s: &str) -> Option<&str> {
    let bytes = s.as_bytes();
    if bytes.len() >= 2 {
        let quote = bytes[0];
        if (quote == b'"' || quote == b'\'') && bytes[bytes.len() - 1] == quote {
            return Some(&s[1..s.len() - 1]);
        }
    }
    None
}
