//! Line-delimited JSON tool host
//!
//! Each input line is one call, `{"tool": "<name>", "args": {...}}`. Each call
//! gets exactly one output line, either `{"status": "ok", "result": ...}` or
//! `{"status": "error", "error": "..."}`. Blank lines are ignored.

use std::io::{BufRead, Write};
use std::path::Path;

use serde_json::{Map, Value, json};
use tracing::{debug, warn};

use super::Toolbox;
use crate::error::{Error, Result};

/// Tools a host can call
pub const TOOLS: [&str; 6] = [
    "search_file_by_name",
    "add_log_to_journal",
    "analyze_mood_trend",
    "add_log_to_file",
    "add_reminder",
    "search_web",
];

/// Answer calls from `input` until it ends
///
/// # Errors
/// Returns an I/O error if reading `input` or writing `output` fails. A call
/// that fails is answered on `output` and does not stop the loop.
pub fn serve<R: BufRead, W: Write>(tools: &Toolbox, input: R, mut output: W) -> Result<()> {
    for line in input.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        writeln!(output, "{}", handle_line(tools, &line))?;
        output.flush()?;
    }
    Ok(())
}

/// Run one call and build its reply
#[must_use]
pub fn handle_line(tools: &Toolbox, line: &str) -> Value {
    let outcome = serde_json::from_str::<Value>(line)
        .map_err(|e| Error::call(&format!("Malformed call: {e}")))
        .and_then(|request| dispatch(tools, &request));

    match outcome {
        Ok(result) => json!({ "status": "ok", "result": result }),
        Err(e) => {
            warn!("Tool call failed: {e}");
            json!({ "status": "error", "error": e.to_string() })
        },
    }
}

fn dispatch(tools: &Toolbox, request: &Value) -> Result<Value> {
    let tool = request
        .get("tool")
        .and_then(Value::as_str)
        .ok_or_else(|| Error::call("Missing \"tool\" name"))?;
    let no_args = Map::new();
    let args = match request.get("args") {
        None | Some(Value::Null) => Args(&no_args),
        Some(Value::Object(args)) => Args(args),
        Some(_) => return Err(Error::call("\"args\" must be an object")),
    };
    debug!("Dispatching {tool}");

    match tool {
        "search_file_by_name" => {
            let root = args.optional("root_dir")?.map(Path::new);
            Ok(json!(tools.search_file_by_name(args.required("filename")?, root)?))
        },
        "add_log_to_journal" => {
            tools.add_log_to_journal(
                args.required("year")?,
                args.required("month")?,
                args.required("date")?,
                args.required("mood")?,
                args.required("log")?,
            )?;
            Ok(Value::Null)
        },
        "analyze_mood_trend" => {
            let report =
                tools.analyze_mood_trend(args.required("from_date")?, args.required("to_date")?)?;
            Ok(json!(report))
        },
        "add_log_to_file" => {
            tools.add_log_to_file(args.required("filename")?, args.required("log")?)?;
            Ok(Value::Null)
        },
        "add_reminder" => {
            tools.add_reminder(args.required("title")?, args.required("message")?)?;
            Ok(Value::Null)
        },
        "search_web" => Ok(json!(tools.search_web(args.required("query")?))),
        other => Err(Error::call(&format!("Unknown tool '{other}', expected one of {TOOLS:?}"))),
    }
}

/// String arguments of one call
struct Args<'a>(&'a Map<String, Value>);

impl<'a> Args<'a> {
    fn optional(&self, name: &str) -> Result<Option<&'a str>> {
        match self.0.get(name) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(value)) => Ok(Some(value.as_str())),
            Some(_) => Err(Error::call(&format!("Argument '{name}' must be a string"))),
        }
    }

    fn required(&self, name: &str) -> Result<&'a str> {
        self.optional(name)?.ok_or_else(|| Error::call(&format!("Missing argument '{name}'")))
    }
}
