//! Source stubs for assembly-only entries

use crate::segments::rewrite_entry_kind;
use autodecomp_core::{Config, Error, FragmentEntry, FragmentKind, Result};
use std::io::Write;
use std::path::PathBuf;
use tracing::info;

const STUB_HEADERS: [&str; 3] = [
    "#include <ultra64.h>",
    "#include \"functions.h\"",
    "#include \"variables.h\"",
];

/// Function labels declared in an assembly file, in order
pub fn functions_in_asm(asm: &str) -> Vec<String> {
    asm.lines()
        .filter(|line| line.starts_with("glabel"))
        .filter_map(|line| line.split_whitespace().nth(1))
        .map(str::to_string)
        .collect()
}

/// Render a source file holding one marker per function of `asm`
///
/// `unit` names the nonmatchings directory the split assembly lands in,
/// normally the entry's derived name.
pub fn generate_stub(asm: &str, marker_prefix: &str, nonmatchings_dir: &str, unit: &str) -> String {
    let markers: Vec<String> = functions_in_asm(asm)
        .iter()
        .map(|func| format!("{}(\"{}/{}/{}.s\")", marker_prefix, nonmatchings_dir, unit, func))
        .collect();

    format!("{}\n\n{}\n", STUB_HEADERS.join("\n"), markers.join("\n\n"))
}

/// Turn an `asm` entry into a `c` entry backed by a freshly generated stub
///
/// Writes `<src_dir>/<segment>_<HEX>.c` (never over an existing file) and then
/// rewrites the entry in the fragment config. Returns the new source path.
pub fn promote_entry(config: &Config, entry: &FragmentEntry) -> Result<PathBuf> {
    if entry.kind != FragmentKind::Asm {
        return Err(Error::config(format!(
            "entry {} is `{}`, only `asm` entries can be promoted",
            entry.address, entry.kind
        )));
    }
    let unit = entry
        .derived_name()
        .ok_or_else(|| Error::config(format!("entry {} has no enclosing segment", entry.address)))?;

    let asm_path = config
        .resolve(&config.segments.asm_dir)
        .join(format!("{}.s", entry.address.to_hex_name()));
    let asm = std::fs::read_to_string(&asm_path)
        .map_err(|_| Error::not_found(asm_path.display().to_string()))?;

    let stub = generate_stub(
        &asm,
        &config.marker_prefix,
        &config.segments.nonmatchings_dir,
        &unit,
    );

    let src_dir = config.resolve(&config.segments.src_dir);
    std::fs::create_dir_all(&src_dir)?;
    let src_path = src_dir.join(format!("{}.c", unit));
    std::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&src_path)?
        .write_all(stub.as_bytes())?;
    info!("Wrote stub {:?} for entry {}", src_path, entry.address);

    rewrite_entry_kind(
        &config.segments_path(),
        &config.segments.section,
        entry,
        &FragmentKind::C,
        Some(&unit),
    )?;
    Ok(src_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segments::find_entry;
    use autodecomp_core::Address;

    const ASM: &str = "\
.include \"macro.inc\"

.section .text, \"ax\"

glabel func_1E34C0
    addiu $sp, $sp, -0x18
    jr $ra

glabel func_1E3500
    jr $ra
";

    #[test]
    fn test_functions_in_asm() {
        assert_eq!(functions_in_asm(ASM), vec!["func_1E34C0", "func_1E3500"]);
    }

    #[test]
    fn test_generate_stub() {
        let stub = generate_stub(ASM, "#pragma GLOBAL_ASM", "asm/nonmatchings", "game_1E34C0");
        assert_eq!(
            stub,
            "#include <ultra64.h>\n\
             #include \"functions.h\"\n\
             #include \"variables.h\"\n\
             \n\
             #pragma GLOBAL_ASM(\"asm/nonmatchings/game_1E34C0/func_1E34C0.s\")\n\
             \n\
             #pragma GLOBAL_ASM(\"asm/nonmatchings/game_1E34C0/func_1E3500.s\")\n"
        );
    }

    #[test]
    fn test_promote_entry() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.project_root = dir.path().to_path_buf();

        std::fs::write(
            config.segments_path(),
            "segments:\n  - name: game\n    subsegments:\n      - [0x1e34c0, asm]\n",
        )
        .unwrap();
        std::fs::create_dir_all(dir.path().join("asm")).unwrap();
        std::fs::write(dir.path().join("asm/1E34C0.s"), ASM).unwrap();

        let entry = find_entry(&config.segments_path(), "subsegments", Address(0x1E34C0)).unwrap();
        let src = promote_entry(&config, &entry).unwrap();

        assert_eq!(src, dir.path().join("src/game_1E34C0.c"));
        assert!(std::fs::read_to_string(&src).unwrap().contains("func_1E3500.s"));
        assert!(std::fs::read_to_string(config.segments_path())
            .unwrap()
            .contains("- [0x1e34c0, c, game_1E34C0]\n"));

        // the stub now exists and the entry is no longer `asm`
        assert!(promote_entry(&config, &entry).is_err());
    }
}
