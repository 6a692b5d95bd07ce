mod common;

use std::io::Write;

use pesym::prelude::*;

#[test]
fn sample_dll() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(&common::sample_dll()).unwrap();
    file.flush().unwrap();

    let image = File::from_file(file.path()).unwrap();

    verify_headers(&image);
    verify_exports(&image);
    verify_imports(&image);
    verify_full_names(&image);
}

/// Verify the headers written by the builder
fn verify_headers(image: &File) {
    let layout = image.layout();

    assert_eq!(image.len(), 0xC00);
    assert_eq!(layout.dos_header().pe_pointer, 0x80);
    assert_eq!(layout.file_header().machine_name(), "INTEL_I386");
    assert_eq!(layout.file_header().number_of_sections, 2);
    assert_eq!(layout.optional_header().image_base, 0x1000_0000);
    assert_eq!(layout.optional_header().subsystem_name(), "WINDOWS_GUI");
    assert_eq!(layout.dos_stub().len(), 0x80);
    assert!(layout.dos_stub().starts_with(b"MZ"));

    let names: Vec<&str> = layout.sections().iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec![".edata", ".idata"]);

    let exports = layout.directory(DataDirectoryType::ExportTable).unwrap();
    assert_eq!(exports.virtual_address, common::EXPORT_RVA);
    assert!(layout.directory(DataDirectoryType::ResourceTable).is_none());

    assert_eq!(image.rva_to_offset(0x3100).unwrap(), 0x500);
    assert!(image.rva_to_offset(0x9000).is_err());
}

/// Verify the export listing, including the forwarded slot
fn verify_exports(image: &File) {
    let exports = walk_exports(image.layout(), &WalkOptions::default());

    assert!(exports.diagnostic.is_none());
    assert_eq!(exports.dll_name.as_deref(), Some("sample.dll"));
    assert_eq!(exports.section.as_deref(), Some(".edata"));
    assert_eq!(exports.skipped, 0);

    let directory = exports.directory.unwrap();
    assert_eq!(directory.ordinal_base, 1);
    assert_eq!(directory.number_of_functions, 3);
    assert_eq!(directory.number_of_names, 3);

    let listing: Vec<(String, &str)> = exports
        .records
        .iter()
        .map(|r| (r.ordinal.to_string(), r.demangled.as_str()))
        .collect();
    assert_eq!(
        listing,
        vec![
            ("0x003".to_string(), "Bar()"),
            ("FWD".to_string(), "KERNEL32.Sleep()"),
            ("0x002".to_string(), "Nap()"),
            ("0x001".to_string(), "Widget::Foo()"),
        ]
    );

    assert_eq!(exports.records[0].name, "_Bar@8");
    assert_eq!(exports.records[0].target, ExportTarget::Address(0x1010));
    assert_eq!(exports.records[1].ordinal, ExportOrdinal::Forwarder);
    assert_eq!(
        exports.records[2].target,
        ExportTarget::Forwarder("KERNEL32.Sleep".to_string())
    );
    assert_eq!(exports.records[3].ordinal, ExportOrdinal::Ordinal(1));
}

/// Verify both import modules and their symbols
fn verify_imports(image: &File) {
    let imports = walk_imports(image.layout(), &WalkOptions::default());

    assert!(imports.diagnostic.is_none());
    assert_eq!(imports.section.as_deref(), Some(".idata"));
    assert_eq!(imports.module_count, 2);
    assert_eq!(imports.symbol_count, 3);

    let kernel32 = &imports.modules[0];
    assert_eq!(kernel32.name, "KERNEL32.dll");
    assert!(kernel32.skipped.is_none());
    assert_eq!(kernel32.records.len(), 2);
    match &kernel32.records[0].kind {
        ImportKind::Name {
            hint,
            name,
            demangled,
        } => {
            assert_eq!(*hint, 0x0123);
            assert_eq!(name, "_Sleep@4");
            assert_eq!(demangled, "Sleep()");
        }
        other => panic!("expected a named import, got {other:?}"),
    }
    assert_eq!(kernel32.records[1].kind, ImportKind::Ordinal(0x10));

    // No lookup table: the address table is walked instead
    let msvcp = &imports.modules[1];
    assert_eq!(msvcp.name, "MSVCP.dll");
    assert_eq!(msvcp.descriptor.original_first_thunk, 0);
    assert_eq!(msvcp.records.len(), 1);
    assert_eq!(msvcp.records[0].module, "MSVCP.dll");

    let modules: Vec<&str> = imports.records().map(|r| r.module.as_str()).collect();
    assert_eq!(modules, vec!["KERNEL32.dll", "KERNEL32.dll", "MSVCP.dll"]);
}

/// Verify that full decoding only changes decorated C++ names
fn verify_full_names(image: &File) {
    let options = WalkOptions {
        base_name_only: false,
    };

    let exports = walk_exports(image.layout(), &options);
    let foo = exports
        .records
        .iter()
        .find(|r| r.name == "?Foo@Widget@@QAEHXZ")
        .unwrap();
    assert_eq!(foo.demangled, "int __thiscall Widget::Foo()");
    assert_eq!(exports.records[0].demangled, "Bar()");

    let imports = walk_imports(image.layout(), &options);
    match &imports.modules[1].records[0].kind {
        ImportKind::Name { demangled, .. } => {
            assert_eq!(demangled, "unsigned int __thiscall Str::length()");
        }
        other => panic!("expected a named import, got {other:?}"),
    }
}

#[test]
fn sample_dll_from_memory() {
    let image = File::from_mem(common::sample_dll()).unwrap();

    let exports = walk_exports(image.layout(), &WalkOptions::default());
    let imports = walk_imports(image.layout(), &WalkOptions::default());
    assert_eq!(exports.len(), 4);
    assert_eq!(imports.records().count(), 3);
}

#[test]
fn wide_image_reports_no_directories() {
    let image = File::from_mem(common::no_directories()).unwrap();

    let exports = walk_exports(image.layout(), &WalkOptions::default());
    assert!(exports.is_empty());
    assert_eq!(exports.diagnostic, Some(Diagnostic::NoDataDirectories));

    let imports = walk_imports(image.layout(), &WalkOptions::default());
    assert!(imports.modules.is_empty());
    assert_eq!(imports.module_count, 0);
    assert_eq!(imports.diagnostic, Some(Diagnostic::NoDataDirectories));
}

#[test]
fn rejects_non_pe_input() {
    assert!(matches!(File::from_mem(Vec::new()), Err(Error::Empty)));
    assert!(matches!(
        File::from_mem([b"\x7FELF".as_slice(), &[0u8; 124]].concat()),
        Err(Error::BadDosSignature(0x457F))
    ));

    let mut bad_nt = common::sample_dll();
    bad_nt[0x80..0x84].copy_from_slice(b"NE\0\0");
    assert!(matches!(
        File::from_mem(bad_nt),
        Err(Error::BadNtSignature(0x0000_454E))
    ));

    assert!(matches!(
        File::from_file(std::path::Path::new("/nonexistent/sample.dll")),
        Err(Error::FileError(_))
    ));
}

#[test]
fn damaged_images_never_panic() {
    let pristine = common::sample_dll();
    let options = WalkOptions {
        base_name_only: false,
    };

    let mut damaged = Vec::new();
    for offset in (0..pristine.len()).step_by(3) {
        let mut image = pristine.clone();
        image[offset] ^= 0xFF;
        damaged.push(image);
    }
    for len in (0..pristine.len()).step_by(64) {
        damaged.push(pristine[..len].to_vec());
    }

    for image in damaged {
        if let Ok(file) = File::from_mem(image) {
            let _ = walk_exports(file.layout(), &options);
            let _ = walk_imports(file.layout(), &options);
        }
    }
}
