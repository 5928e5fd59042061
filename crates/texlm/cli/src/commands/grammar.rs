//! Grammar listing

use serde_json::json;
use texlm_dsl::{GRAMMAR, OPERATIONS};

use crate::error::CliResult;
use crate::output::{print_single, OutputFormat};

pub fn execute(format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Table => {
            print!("{}", GRAMMAR);
            Ok(())
        }
        _ => {
            let operations: Vec<_> = OPERATIONS
                .iter()
                .map(|(name, arity)| json!({ "name": name, "arity": arity }))
                .collect();
            print_single(
                &json!({ "grammar": GRAMMAR, "operations": operations }),
                format,
            )
        }
    }
}
