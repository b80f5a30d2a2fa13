//! Implementation of the `inspect` command.

use crate::cli::args::InspectArgs;
use crate::module::decoder::decode_module;
use crate::module::info::{compute_checksum, module_info};
use crate::sourcemap::consumer::consume_source_map;
use crate::{DebuggerError, Result};
use itertools::Itertools;
use std::fs;

pub fn run_inspect(args: &InspectArgs) -> Result<()> {
    let bytes = fs::read(&args.module).map_err(|err| {
        DebuggerError::FileError(format!(
            "failed to read {}: {}",
            args.module.display(),
            err
        ))
    })?;

    let info = module_info(&bytes)?;
    let ast = decode_module(&bytes)?;

    if args.json {
        let document = serde_json::json!({
            "module": args.module.display().to_string(),
            "checksum": compute_checksum(&bytes),
            "info": info,
            "source_map_url": ast.source_map_url,
            "functions": (0..ast.function_count() as u32)
                .map(|index| ast.function_name(index))
                .collect::<Vec<_>>(),
            "imports": ast
                .import_functions
                .iter()
                .sorted_by_key(|(index, _)| **index)
                .map(|(index, (module, field))| {
                    serde_json::json!({ "index": index, "module": module, "field": field })
                })
                .collect::<Vec<_>>(),
        });
        println!("{}", serde_json::to_string_pretty(&document).unwrap_or_default());
    } else {
        println!("Module: {}", args.module.display());
        println!("Size: {} bytes", info.total_size);
        println!("Checksum: {}", compute_checksum(&bytes));
        println!();

        println!("Sections:");
        for section in &info.sections {
            println!("  {:<24} {:>8} bytes @ {:#x}", section.name, section.size, section.offset);
        }
        println!();

        println!("Functions ({}):", ast.function_count());
        for index in 0..ast.function_count() as u32 {
            let body = &ast.instruction_map[index as usize];
            if body.is_empty() {
                let (module, field) = ast
                    .import_functions
                    .get(&index)
                    .cloned()
                    .unwrap_or_else(|| ("?".to_string(), "?".to_string()));
                println!("  [{index}] {} (import {module}.{field})", ast.function_name(index));
            } else {
                println!("  [{index}] {} ({} instructions)", ast.function_name(index), body.len());
            }
        }
    }

    if args.source_map {
        match consume_source_map(&args.module, ast.source_map_url.as_deref(), &args.workspace)? {
            Some(mapping) => {
                println!();
                println!("Source map ({} entries):", mapping.len());
                for (offset, position) in &mapping {
                    println!("  {:#06x} -> {}:{}", offset, position.file.display(), position.line);
                }
            }
            None => println!("No source map URL in module."),
        }
    }

    Ok(())
}
