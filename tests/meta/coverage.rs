//! Keeps `tests/unit` in one-to-one correspondence with `src`

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;
    use std::fs;
    use std::io;
    use std::path::Path;

    const SRC_DIR: &str = "src";
    const UNIT_DIR: &str = "tests/unit";

    // Entry points and module wiring carry no behaviour of their own
    fn needs_unit_tests(relative: &str) -> bool {
        !matches!(relative, "lib.rs" | "main.rs") && !relative.ends_with("mod.rs")
    }

    // Relative paths of every directory and `.rs` file below `root`
    fn tree(root: &Path) -> io::Result<BTreeSet<String>> {
        let mut found = BTreeSet::new();
        walk(root, root, &mut found)?;
        Ok(found)
    }

    fn walk(root: &Path, dir: &Path, found: &mut BTreeSet<String>) -> io::Result<()> {
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            let relative = path
                .strip_prefix(root)
                .map_err(io::Error::other)?
                .to_string_lossy()
                .replace('\\', "/");

            if path.is_dir() {
                found.insert(relative);
                walk(root, &path, found)?;
            } else if path.extension().is_some_and(|ext| ext == "rs") {
                found.insert(relative);
            }
        }
        Ok(())
    }

    fn report(title: &str, lines: &[String]) -> String {
        format!("{title}:\n{}", lines.join("\n"))
    }

    // Tests every source file has a unit test file at the same relative path
    #[test]
    fn test_sources_have_unit_tests() {
        let sources = tree(Path::new(SRC_DIR)).unwrap();
        let units = tree(Path::new(UNIT_DIR)).unwrap();

        let missing: Vec<String> = sources
            .iter()
            .filter(|path| needs_unit_tests(path) && !units.contains(*path))
            .map(|path| format!("  - src/{path} -> {UNIT_DIR}/{path}"))
            .collect();

        assert!(
            missing.is_empty(),
            "{}",
            report("Source files without unit tests", &missing)
        );
    }

    // Tests no unit test file outlives the source file it covers
    #[test]
    fn test_unit_tests_have_sources() {
        let sources = tree(Path::new(SRC_DIR)).unwrap();
        let units = tree(Path::new(UNIT_DIR)).unwrap();

        let orphaned: Vec<String> = units
            .iter()
            .filter(|path| !path.ends_with("mod.rs") && !sources.contains(*path))
            .map(|path| format!("  - {UNIT_DIR}/{path} (no src/{path})"))
            .collect();

        assert!(
            orphaned.is_empty(),
            "{}",
            report("Unit tests without sources", &orphaned)
        );
    }

    // Tests every unit test file is declared by its directory's mod.rs
    #[test]
    fn test_unit_tests_are_compiled() {
        let units = tree(Path::new(UNIT_DIR)).unwrap();
        let root = Path::new(UNIT_DIR);

        let undeclared: Vec<String> = units
            .iter()
            .filter(|path| *path != "mod.rs" && !path.ends_with("/mod.rs"))
            .filter_map(|path| {
                let full = root.join(path);
                let name = full.file_stem()?.to_str()?.to_string();
                let parent = full.parent()?;
                let wiring = fs::read_to_string(parent.join("mod.rs")).unwrap_or_default();
                let declared = wiring
                    .lines()
                    .any(|line| line.trim().trim_start_matches("pub ") == format!("mod {name};"));
                (!declared).then(|| format!("  - {UNIT_DIR}/{path}"))
            })
            .collect();

        assert!(
            undeclared.is_empty(),
            "{}",
            report("Unit tests missing from their mod.rs", &undeclared)
        );
    }

    // Tests every test source other than module wiring defines at least one test
    #[test]
    fn test_test_files_define_tests() {
        let all = tree(Path::new("tests")).unwrap();

        let empty: Vec<String> = all
            .iter()
            .filter(|path| path.ends_with(".rs") && !path.ends_with("mod.rs"))
            .filter(|path| {
                fs::read_to_string(Path::new("tests").join(path))
                    .map(|content| !content.contains("#[test]"))
                    .unwrap_or(true)
            })
            .map(|path| format!("  - tests/{path}"))
            .collect();

        assert!(
            empty.is_empty(),
            "{}",
            report("Test files without any #[test]", &empty)
        );
    }
}
