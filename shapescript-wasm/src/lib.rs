//! WASM bindings exposing the shapescript interpreter to a JavaScript
//! host. Scheduling concerns (deferring a run so the host UI can repaint
//! first) belong to the caller, not to this crate.

use shapescript_core::interpreter::{self, DEFAULT_TIMEOUT_MS};
use wasm_bindgen::prelude::*;

/// Result of one interpretation run, shaped for the JavaScript host.
#[wasm_bindgen]
pub struct InterpretOutput {
    shapes_json: String,
    error: Option<String>,
}

#[wasm_bindgen]
impl InterpretOutput {
    /// The emitted shapes as a JSON array string (`[]` on error).
    #[wasm_bindgen(getter, js_name = shapesJson)]
    pub fn shapes_json(&self) -> String {
        self.shapes_json.clone()
    }

    /// The terminal error message, if the run failed.
    #[wasm_bindgen(getter)]
    pub fn error(&self) -> Option<String> {
        self.error.clone()
    }

    #[wasm_bindgen(getter, js_name = hasError)]
    pub fn has_error(&self) -> bool {
        self.error.is_some()
    }
}

/// Interpret a format script against input data.
///
/// `timeout_ms` defaults to 3000 when omitted.
#[wasm_bindgen(js_name = interpretScript)]
#[must_use]
pub fn interpret_script(
    format_script: &str,
    input_data: &str,
    timeout_ms: Option<u32>,
) -> InterpretOutput {
    run_program(format_script, input_data, timeout_ms)
}

fn run_program(format_script: &str, input_data: &str, timeout_ms: Option<u32>) -> InterpretOutput {
    let timeout = timeout_ms.map_or(DEFAULT_TIMEOUT_MS, u64::from);
    let result = interpreter::interpret(format_script, input_data, timeout);
    let shapes_json = serde_json::to_string(&result.shapes).unwrap_or_else(|_| "[]".to_owned());
    InterpretOutput {
        shapes_json,
        error: result.error,
    }
}
