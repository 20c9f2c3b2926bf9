//! Common test utilities and helpers
//!
//! This module provides shared utilities for integration tests.

#![allow(dead_code)]

use std::path::PathBuf;
use std::process::{Command, Output};
use std::time::{Duration, SystemTime};
use tempfile::TempDir;

/// Test project context
///
/// Creates a temporary directory holding a build file, sources and a
/// `bin/` directory of fake toolchain scripts that log every invocation.
pub struct TestProject {
    /// Temporary directory for the test project
    pub dir: TempDir,
}

impl TestProject {
    /// Create a new test project in a temporary directory
    pub fn new() -> Self {
        let project = Self {
            dir: TempDir::new().expect("Failed to create temp directory"),
        };
        project.install_fake_toolchain();
        project
    }

    /// Get the path to the test project directory
    pub fn path(&self) -> PathBuf {
        self.dir.path().to_path_buf()
    }

    /// Create a file in the test project
    pub fn create_file(&self, name: &str, content: &str) {
        let path = self.dir.path().join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent directories");
        }
        std::fs::write(path, content).expect("Failed to write file");
    }

    /// Create a directory in the test project
    pub fn create_dir(&self, name: &str) {
        let path = self.dir.path().join(name);
        std::fs::create_dir_all(path).expect("Failed to create directory");
    }

    /// Check if a file exists in the test project
    pub fn file_exists(&self, name: &str) -> bool {
        self.dir.path().join(name).exists()
    }

    /// Set the modification time of a file to `offset` from now
    pub fn set_mtime_from_now(&self, name: &str, offset: Duration, future: bool) {
        let now = SystemTime::now();
        let time = if future { now + offset } else { now - offset };
        let file = std::fs::File::options()
            .write(true)
            .open(self.dir.path().join(name))
            .expect("Failed to open file");
        file.set_modified(time).expect("Failed to set mtime");
    }

    /// Toolchain invocations logged so far, one line per process
    pub fn invocations(&self) -> Vec<String> {
        std::fs::read_to_string(self.log_path())
            .unwrap_or_default()
            .lines()
            .map(str::to_string)
            .collect()
    }

    /// Forget logged invocations
    pub fn clear_invocations(&self) {
        let _ = std::fs::remove_file(self.log_path());
    }

    fn log_path(&self) -> PathBuf {
        self.dir.path().join("toolchain.log")
    }

    fn bin_dir(&self) -> PathBuf {
        self.dir.path().join("bin")
    }

    #[cfg(unix)]
    fn write_script(&self, name: &str, body: &str) {
        use std::os::unix::fs::PermissionsExt;

        let path = self.bin_dir().join(name);
        std::fs::create_dir_all(self.bin_dir()).expect("Failed to create bin dir");
        std::fs::write(&path, body).expect("Failed to write script");
        let mut perms = std::fs::metadata(&path).unwrap().permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(&path, perms).expect("Failed to chmod script");
    }

    /// Install `fakecc` and `ar` scripts
    ///
    /// Both append `<name> <args..>` to the log and touch whatever follows
    /// `-o` (or, for `ar`, the archive argument). `fakecc` fails on any
    /// source named `broken.c`.
    #[cfg(unix)]
    fn install_fake_toolchain(&self) {
        self.write_script(
            "fakecc",
            r#"#!/bin/sh
echo "fakecc $*" >> "$BAKE_TEST_LOG"
out=""
while [ $# -gt 0 ]; do
  case "$1" in
    -o) out="$2"; shift ;;
    *broken.c) echo "broken.c: error: expected ';'" >&2; exit 1 ;;
  esac
  shift
done
if [ -n "$out" ]; then touch "$out"; fi
exit 0
"#,
        );
        self.write_script(
            "ar",
            r#"#!/bin/sh
echo "ar $*" >> "$BAKE_TEST_LOG"
touch "$2"
exit 0
"#,
        );
    }

    #[cfg(not(unix))]
    fn install_fake_toolchain(&self) {}

    /// Run bake in the project directory with the fake toolchain on PATH
    pub fn run_bake(&self, args: &[&str]) -> Output {
        let path = std::env::var_os("PATH").unwrap_or_default();
        let mut paths = vec![self.bin_dir()];
        paths.extend(std::env::split_paths(&path));

        let mut cmd = Command::new(env!("CARGO_BIN_EXE_bake"));
        cmd.current_dir(self.path())
            .env("PATH", std::env::join_paths(paths).expect("Invalid PATH"))
            .env("BAKE_TEST_LOG", self.log_path())
            .env_remove("BAKE_JOBS")
            .env_remove("RUST_LOG");
        for arg in args {
            cmd.arg(arg);
        }
        cmd.output().expect("Failed to execute bake")
    }
}

impl Default for TestProject {
    fn default() -> Self {
        Self::new()
    }
}

/// Library `core` (two units) and executable `app` depending on it
pub const SAMPLE_BAKEFILE: &str = r#"
[config]
cc = "fakecc"
as = "as"
ld = "fakecc"

[project]
sub = [["Demo app", "app"], ["Core library", "core"]]

[project.core]
type = "lib"
srcs = "core"
bin = "build/core"
binname = "libcore.a"
ccflags = ["-O2"]
incflags = ["-Icore"]
ldflags = [""]
deps = []

[project.app]
type = "exec"
srcs = "app"
bin = "build/app"
binname = "demo"
ccflags = ["-O2"]
incflags = ["-Icore"]
ldflags = ["-Lbuild/core", "-lcore"]
deps = ["core"]
"#;

/// Write the sample build file and its sources
pub fn sample_project() -> TestProject {
    let project = TestProject::new();
    project.create_file("bake.toml", SAMPLE_BAKEFILE);
    project.create_file("core/alpha.c", "int alpha(void) { return 1; }\n");
    project.create_file("core/beta.c", "int beta(void) { return 2; }\n");
    project.create_file("app/main.c", "int main(void) { return 0; }\n");
    project
}
