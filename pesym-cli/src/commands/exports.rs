use std::path::Path;

use pesym::{
    symbols::{walk_exports, ExportTable, ExportTarget},
    File,
};
use serde::Serialize;

use crate::{
    app::GlobalOptions,
    commands::common::{load_image, truncate, walk_options, MAX_RAW_NAME},
    output::{print_banner, print_output, Align, TabWriter},
};

#[derive(Debug, Serialize)]
pub struct ExportInfo {
    pub ordinal: String,
    pub name: String,
    pub mangled: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub forwarder: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ExportsOutput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dll_name: Option<String>,
    pub number_of_functions: u32,
    pub number_of_names: u32,
    pub ordinal_base: u32,
    pub exports: Vec<ExportInfo>,
    pub skipped: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnostic: Option<String>,
}

impl From<ExportTable> for ExportsOutput {
    fn from(table: ExportTable) -> Self {
        let (number_of_functions, number_of_names, ordinal_base) =
            table.directory.as_ref().map_or((0, 0, 0), |dir| {
                (dir.number_of_functions, dir.number_of_names, dir.ordinal_base)
            });

        let exports = table
            .records
            .into_iter()
            .map(|record| {
                let (address, forwarder) = match record.target {
                    ExportTarget::Address(rva) => (Some(rva), None),
                    ExportTarget::Forwarder(target) => (None, Some(target)),
                };
                ExportInfo {
                    ordinal: record.ordinal.to_string(),
                    name: record.demangled,
                    mangled: record.name,
                    address,
                    forwarder,
                }
            })
            .collect();

        ExportsOutput {
            section: table.section,
            dll_name: table.dll_name,
            number_of_functions,
            number_of_names,
            ordinal_base,
            exports,
            skipped: table.skipped,
            diagnostic: table.diagnostic.map(|d| d.to_string()),
        }
    }
}

pub fn report(file: &File, full: bool) -> ExportsOutput {
    walk_exports(file.layout(), &walk_options(full)).into()
}

pub fn display(out: &ExportsOutput) {
    if let Some(diagnostic) = &out.diagnostic {
        println!();
        println!("No exports listed: {diagnostic}.");
        return;
    }

    print_banner(&format!(
        "Listing exports from {}",
        out.section.as_deref().unwrap_or("???")
    ));
    println!(
        "PE Name...........: {}",
        out.dll_name.as_deref().unwrap_or("???")
    );
    println!("Num of functions..: {}", out.number_of_functions);
    println!("Num of names......: {}", out.number_of_names);
    println!("Ordinal base......: {}", out.ordinal_base);
    println!();

    let mut tw = TabWriter::new(&[
        ("Ordn.", Align::Left),
        ("Func name", Align::Left),
        ("Mangled name", Align::Left),
    ]);
    for export in &out.exports {
        tw.row(vec![
            export.ordinal.clone(),
            export.name.clone(),
            truncate(&export.mangled, MAX_RAW_NAME),
        ]);
    }
    tw.print();

    println!("{} exports located and resolved.", out.exports.len());
    if out.skipped > 0 {
        println!("{} names could not be read.", out.skipped);
    }
}

pub fn run(path: &Path, full: bool, opts: &GlobalOptions) -> anyhow::Result<()> {
    let file = load_image(path)?;
    let out = report(&file, full);

    print_output(&out, opts, display)
}
