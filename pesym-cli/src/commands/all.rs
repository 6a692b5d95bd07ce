use std::path::Path;

use serde::Serialize;

use crate::{
    app::GlobalOptions,
    commands::{
        common::load_image,
        dos::{self, DosDump},
        exports::{self, ExportsOutput},
        imports::{self, ImportsOutput},
        info::{self, ImageInfo},
        sections::{self, SectionsOutput},
    },
    output::print_output,
};

#[derive(Debug, Serialize)]
struct FullReport {
    info: ImageInfo,
    dos: DosDump,
    sections: SectionsOutput,
    exports: ExportsOutput,
    imports: ImportsOutput,
}

pub fn run(path: &Path, full: bool, opts: &GlobalOptions) -> anyhow::Result<()> {
    let file = load_image(path)?;

    let report = FullReport {
        info: info::report(path, &file),
        dos: dos::report(&file),
        sections: sections::report(&file),
        exports: exports::report(&file, full),
        imports: imports::report(&file, full),
    };

    print_output(&report, opts, |report| {
        info::display(&report.info);
        dos::display(&report.dos);
        sections::display(&report.sections);
        exports::display(&report.exports);
        imports::display(&report.imports);
        println!();
    })
}
