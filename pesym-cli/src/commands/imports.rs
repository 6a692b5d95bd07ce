use std::path::Path;

use pesym::{
    symbols::{walk_imports, ImportKind, ImportTable},
    File,
};
use serde::Serialize;

use crate::{
    app::GlobalOptions,
    commands::common::{hexa, load_image, walk_options},
    output::{print_banner, print_output},
};

#[derive(Debug, Serialize)]
pub struct ImportInfo {
    /// Hint for named imports, the ordinal otherwise
    pub ordinal: u16,
    pub by_ordinal: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mangled: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ModuleInfo {
    pub name: String,
    pub lookup_table: u32,
    pub address_table: u32,
    pub symbols: Vec<ImportInfo>,
    pub unresolved: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skipped: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ImportsOutput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
    pub modules: Vec<ModuleInfo>,
    pub module_count: usize,
    pub symbol_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnostic: Option<String>,
}

impl From<ImportTable> for ImportsOutput {
    fn from(table: ImportTable) -> Self {
        let modules = table
            .modules
            .into_iter()
            .map(|module| ModuleInfo {
                name: module.name,
                lookup_table: module.descriptor.original_first_thunk,
                address_table: module.descriptor.first_thunk,
                symbols: module
                    .records
                    .into_iter()
                    .map(|record| match record.kind {
                        ImportKind::Ordinal(ordinal) => ImportInfo {
                            ordinal,
                            by_ordinal: true,
                            name: None,
                            mangled: None,
                        },
                        ImportKind::Name {
                            hint,
                            name,
                            demangled,
                        } => ImportInfo {
                            ordinal: hint,
                            by_ordinal: false,
                            name: Some(demangled),
                            mangled: Some(name),
                        },
                    })
                    .collect(),
                unresolved: module.unresolved,
                skipped: module.skipped.map(|reason| reason.to_string()),
            })
            .collect();

        ImportsOutput {
            section: table.section,
            modules,
            module_count: table.module_count,
            symbol_count: table.symbol_count,
            diagnostic: table.diagnostic.map(|d| d.to_string()),
        }
    }
}

pub fn report(file: &File, full: bool) -> ImportsOutput {
    walk_imports(file.layout(), &walk_options(full)).into()
}

pub fn display(out: &ImportsOutput) {
    if let Some(diagnostic) = &out.diagnostic {
        println!();
        println!("No imports listed: {diagnostic}.");
        return;
    }

    print_banner(&format!(
        "Listing imports from {}",
        out.section.as_deref().unwrap_or("???")
    ));

    println!("--------------------");
    println!("  External modules");
    println!("--------------------");
    println!();
    for module in &out.modules {
        println!("  {}", module.name);
    }
    println!();

    println!("---------------------");
    println!("  Ordn.   Func name");
    println!("---------------------");
    println!();

    for module in &out.modules {
        println!("{}", module.name);

        if let Some(reason) = &module.skipped {
            println!("Skipping imports for {} ({reason})...", module.name);
            continue;
        }

        for symbol in &module.symbols {
            println!(
                "  {}  {}",
                hexa(u64::from(symbol.ordinal), 4),
                symbol.name.as_deref().unwrap_or("???")
            );
        }
        println!();
    }

    println!(
        "{} dependencies located and resolved, with {} symbols total.",
        out.module_count, out.symbol_count
    );
}

pub fn run(path: &Path, full: bool, opts: &GlobalOptions) -> anyhow::Result<()> {
    let file = load_image(path)?;
    let out = report(&file, full);

    print_output(&out, opts, display)
}
