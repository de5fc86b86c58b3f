//! Plain YAML output.

use crate::error::{Error, Result};
use crate::options::DumpOptions;
use crate::value::Value;
use std::path::Path;
use yaml_rust2::YamlEmitter;

/// Serialize a value as plain YAML, without a document start marker.
pub fn dump(value: &Value, options: &DumpOptions) -> Result<String> {
    let yaml = value.to_yaml();
    let mut out = String::new();
    {
        let mut emitter = YamlEmitter::new(&mut out);
        emitter.multiline_strings(options.multiline_strings);
        emitter.compact(options.compact);
        emitter.dump(&yaml).map_err(|err| Error::Emit {
            message: err.to_string(),
        })?;
    }

    let mut text = match out.strip_prefix("---") {
        Some(rest) => rest.trim_start_matches([' ', '\n']).to_string(),
        None => out,
    };
    if !text.ends_with('\n') {
        text.push('\n');
    }
    Ok(text)
}

/// Serialize a value as plain YAML into a file.
pub fn dump_to_path(value: &Value, path: impl AsRef<Path>, options: &DumpOptions) -> Result<()> {
    let path = path.as_ref();
    let text = dump(value, options)?;
    std::fs::write(path, text).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })
}
