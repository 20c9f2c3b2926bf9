//! Compile, link and archive steps
//!
//! Turns a [`ProjectDescriptor`] into concrete toolchain argument vectors
//! and runs them. Every step blocks until its process exits; a failed step
//! aborts the run.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use rayon::prelude::*;

use crate::config::defaults::{ARCHIVER, ARCHIVER_FLAGS, OBJECT_EXTENSION, SOURCE_EXTENSION};
use crate::core::events::{BuildEvent, Reporter};
use crate::core::project::{ProjectDescriptor, ProjectKind};
use crate::core::staleness;
use crate::error::{BakeError, BuildError, FilesystemError};
use crate::infra::filesystem;
use crate::infra::process::CommandRunner;
use crate::infra::toolchain::Toolchain;

/// A translation unit and the object it compiles to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceUnit {
    pub source: PathBuf,
    pub object: PathBuf,
}

/// Object path for `source`: its file name with the suffix replaced, in `output_dir`
pub fn object_path(output_dir: &Path, source: &Path) -> PathBuf {
    let name = source.file_name().map(Path::new).unwrap_or(source);
    output_dir.join(name.with_extension(OBJECT_EXTENSION))
}

/// Every `.c` unit of `project`, in lexical order
pub fn discover_units(project: &ProjectDescriptor) -> Result<Vec<SourceUnit>, FilesystemError> {
    let sources = filesystem::list_sources(&project.source_dir, SOURCE_EXTENSION)?;
    Ok(sources
        .into_iter()
        .map(|source| SourceUnit {
            object: object_path(&project.output_dir, &source),
            source,
        })
        .collect())
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// `[cc, ccflags.., incflags.., -o, object, -c, source]`
pub fn compile_argv(toolchain: &Toolchain, project: &ProjectDescriptor, unit: &SourceUnit) -> Vec<String> {
    let mut argv = vec![toolchain.compiler().to_string()];
    argv.extend(project.compile_flags.iter().cloned());
    argv.extend(project.include_flags.iter().cloned());
    argv.push("-o".to_string());
    argv.push(path_arg(&unit.object));
    argv.push("-c".to_string());
    argv.push(path_arg(&unit.source));
    argv
}

/// `[ld, incflags.., ccflags.., ldflags.., objects.., -o, output]`
///
/// Compile and include flags are repeated here so that flags affecting both
/// phases (`-m32`, `-flto`, ...) reach the link. A link flag list holding a
/// single empty string means "no link flags".
pub fn link_argv(toolchain: &Toolchain, project: &ProjectDescriptor, objects: &[PathBuf]) -> Vec<String> {
    let mut argv = vec![toolchain.linker().to_string()];
    argv.extend(project.include_flags.iter().cloned());
    argv.extend(project.compile_flags.iter().cloned());
    if !matches!(project.link_flags.as_slice(), [only] if only.is_empty()) {
        argv.extend(project.link_flags.iter().cloned());
    }
    argv.extend(objects.iter().map(|o| path_arg(o)));
    argv.push("-o".to_string());
    argv.push(path_arg(&project.output_path()));
    argv
}

/// `[ar, rcs, output, objects..]`
pub fn archive_argv(project: &ProjectDescriptor, objects: &[PathBuf]) -> Vec<String> {
    let mut argv = vec![
        ARCHIVER.to_string(),
        ARCHIVER_FLAGS.to_string(),
        path_arg(&project.output_path()),
    ];
    argv.extend(objects.iter().map(|o| path_arg(o)));
    argv
}

/// Drives the toolchain for one project at a time
pub struct Pipeline<'a> {
    toolchain: &'a Toolchain,
    runner: &'a dyn CommandRunner,
    reporter: &'a dyn Reporter,
    jobs: usize,
}

impl<'a> Pipeline<'a> {
    /// Create a sequential pipeline
    pub fn new(toolchain: &'a Toolchain, runner: &'a dyn CommandRunner, reporter: &'a dyn Reporter) -> Self {
        Self {
            toolchain,
            runner,
            reporter,
            jobs: 1,
        }
    }

    /// Compile up to `jobs` units of one project at once
    #[must_use]
    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs.max(1);
        self
    }

    fn run(&self, project: &ProjectDescriptor, argv: &[String]) -> Result<(), BakeError> {
        let program = argv.first().map(String::as_str).unwrap_or_default();
        self.runner
            .run(argv, None)
            .and_then(|outcome| outcome.into_result(program))
            .map_err(|source| BakeError::Toolchain {
                project: project.display_name.clone(),
                source,
            })
    }

    /// Compile one unit; `index` is 1-based
    pub fn compile_unit(
        &self,
        project: &ProjectDescriptor,
        unit: &SourceUnit,
        index: usize,
        total: usize,
    ) -> Result<(), BakeError> {
        self.reporter.report(&BuildEvent::Compiling {
            project: project.display_name.clone(),
            index,
            total,
            source: unit.source.clone(),
        });
        let argv = compile_argv(self.toolchain, project, unit);
        tracing::debug!(?argv, "compile");
        self.run(project, &argv)
    }

    /// Compile every unit of the rebuild set
    ///
    /// With more than one job, units run on a bounded pool. The first failure
    /// to complete stops units that have not started yet; once the running
    /// ones finish, that failure is returned.
    pub fn compile_all(&self, project: &ProjectDescriptor, units: &[SourceUnit]) -> Result<(), BakeError> {
        let total = units.len();
        if self.jobs <= 1 || total <= 1 {
            for (i, unit) in units.iter().enumerate() {
                self.compile_unit(project, unit, i + 1, total)?;
            }
            return Ok(());
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.jobs)
            .build()
            .map_err(|e| BakeError::Toolchain {
                project: project.display_name.clone(),
                source: BuildError::WorkerPool {
                    jobs: self.jobs,
                    error: e.to_string(),
                },
            })?;

        let first_failure = Mutex::new(None);
        let outcome = pool.install(|| {
            units.par_iter().enumerate().try_for_each(|(i, unit)| {
                self.compile_unit(project, unit, i + 1, total).map_err(|e| {
                    first_failure
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner)
                        .get_or_insert(e);
                })
            })
        });
        if outcome.is_ok() {
            return Ok(());
        }

        first_failure
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
            .map_or(Ok(()), Err)
    }

    /// Link an executable from `objects`
    pub fn link_executable(&self, project: &ProjectDescriptor, objects: &[PathBuf]) -> Result<(), BakeError> {
        self.reporter.report(&BuildEvent::Linking {
            project: project.display_name.clone(),
        });
        let argv = link_argv(self.toolchain, project, objects);
        tracing::debug!(?argv, "link");
        self.run(project, &argv)
    }

    /// Archive `objects` into a static library
    pub fn archive_library(&self, project: &ProjectDescriptor, objects: &[PathBuf]) -> Result<(), BakeError> {
        self.reporter.report(&BuildEvent::Linking {
            project: project.display_name.clone(),
        });
        let argv = archive_argv(project, objects);
        tracing::debug!(?argv, "archive");
        self.run(project, &argv)
    }

    /// Discover, compile what is stale, then link or archive everything
    pub fn build(&self, project: &ProjectDescriptor) -> Result<(), BakeError> {
        let units = discover_units(project)?;
        if units.is_empty() {
            tracing::warn!(
                "No .{SOURCE_EXTENSION} files in {} for '{}'",
                project.source_dir.display(),
                project.id
            );
        }

        let stale = staleness::rebuild_set(&units)?;
        tracing::info!(
            "{}: {} of {} units need compiling",
            project.id,
            stale.len(),
            units.len()
        );

        filesystem::create_dir_all(&project.output_dir)?;

        if stale.is_empty() {
            self.reporter.report(&BuildEvent::UpToDate {
                project: project.display_name.clone(),
            });
        } else {
            self.compile_all(project, &stale)?;
        }

        let objects: Vec<PathBuf> = units.into_iter().map(|u| u.object).collect();
        match project.kind {
            ProjectKind::Exec => self.link_executable(project, &objects),
            ProjectKind::Lib => self.archive_library(project, &objects),
        }
    }
}


#[cfg(test)]
mod tests {
    use super::testing::FakeRunner;
    use super::*;
    use crate::config::defaults::MIN_PROPTEST_ITERATIONS;
    use crate::core::events::testing::{NullReporter, RecordingReporter};
    use crate::core::project::fixtures::project;
    use crate::infra::process::ExitOutcome;
    use proptest::prelude::*;
    use tempfile::TempDir;

    fn strings(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| (*s).to_string()).collect()
    }

    fn toolchain() -> Toolchain {
        Toolchain::new("gcc", "as", "gcc")
    }

    #[test]
    fn test_object_path_replaces_suffix() {
        assert_eq!(
            object_path(Path::new("build"), Path::new("src/main.c")),
            PathBuf::from("build/main.o")
        );
        assert_eq!(
            object_path(Path::new("build"), Path::new("src/v1.2.c")),
            PathBuf::from("build/v1.2.o")
        );
    }

    #[test]
    fn test_compile_argv_layout() {
        let p = project("app", ProjectKind::Exec, &[]);
        let unit = SourceUnit {
            source: PathBuf::from("src/app/main.c"),
            object: PathBuf::from("out/app/main.o"),
        };
        assert_eq!(
            compile_argv(&toolchain(), &p, &unit),
            strings(&["gcc", "-O2", "-Iinclude", "-o", "out/app/main.o", "-c", "src/app/main.c"])
        );
    }

    #[test]
    fn test_link_argv_layout() {
        let mut p = project("app", ProjectKind::Exec, &[]);
        p.link_flags = strings(&["-Lout/core", "-lcore"]);
        let objects = vec![PathBuf::from("out/app/a.o"), PathBuf::from("out/app/b.o")];
        assert_eq!(
            link_argv(&toolchain(), &p, &objects),
            strings(&[
                "gcc", "-Iinclude", "-O2", "-Lout/core", "-lcore", "out/app/a.o", "out/app/b.o", "-o",
                "out/app/app"
            ])
        );
    }

    #[test]
    fn test_link_argv_single_empty_flag_means_none() {
        let mut p = project("app", ProjectKind::Exec, &[]);
        p.link_flags = strings(&[""]);
        let argv = link_argv(&toolchain(), &p, &[PathBuf::from("a.o")]);
        assert_eq!(argv, strings(&["gcc", "-Iinclude", "-O2", "a.o", "-o", "out/app/app"]));
    }

    #[test]
    fn test_archive_argv_exact() {
        let mut p = project("x", ProjectKind::Lib, &[]);
        p.output_dir = PathBuf::from("lib");
        p.output_name = "libx.a".to_string();
        let objects = vec![PathBuf::from("a.o"), PathBuf::from("b.o")];
        assert_eq!(archive_argv(&p, &objects), strings(&["ar", "rcs", "lib/libx.a", "a.o", "b.o"]));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(MIN_PROPTEST_ITERATIONS))]

        #[test]
        fn test_compile_argv_preserves_flag_order(
            ccflags in prop::collection::vec("-[a-zA-Z0-9=]{1,8}", 0..6),
            incflags in prop::collection::vec("-I[a-z/]{1,8}", 0..6),
        ) {
            let mut p = project("app", ProjectKind::Exec, &[]);
            p.compile_flags = ccflags.clone();
            p.include_flags = incflags.clone();
            let unit = SourceUnit { source: PathBuf::from("s/a.c"), object: PathBuf::from("o/a.o") };

            let argv = compile_argv(&toolchain(), &p, &unit);
            let mut expected = vec!["gcc".to_string()];
            expected.extend(ccflags);
            expected.extend(incflags);
            expected.extend(strings(&["-o", "o/a.o", "-c", "s/a.c"]));
            prop_assert_eq!(argv, expected);
        }

        #[test]
        fn test_archive_argv_keeps_object_order(names in prop::collection::vec("[a-z]{1,6}\\.o", 0..10)) {
            let p = project("x", ProjectKind::Lib, &[]);
            let objects: Vec<PathBuf> = names.iter().map(PathBuf::from).collect();
            let argv = archive_argv(&p, &objects);
            prop_assert_eq!(&argv[3..], names.as_slice());
        }
    }

    fn project_in(dir: &TempDir, kind: ProjectKind, sources: &[&str]) -> ProjectDescriptor {
        let mut p = project("core", kind, &[]);
        p.source_dir = dir.path().join("src");
        p.output_dir = dir.path().join("out");
        std::fs::create_dir_all(&p.source_dir).unwrap();
        for name in sources {
            std::fs::write(p.source_dir.join(name), "int x;\n").unwrap();
        }
        p
    }

    #[test]
    fn test_build_compiles_all_then_archives_full_set() {
        let dir = TempDir::new().unwrap();
        let p = project_in(&dir, ProjectKind::Lib, &["b.c", "a.c"]);
        let runner = FakeRunner::new();
        let tc = toolchain();
        let reporter = RecordingReporter::new();

        Pipeline::new(&tc, &runner, &reporter).build(&p).unwrap();

        let calls = runner.calls();
        assert_eq!(calls.len(), 3);
        assert!(calls[0].last().unwrap().ends_with("a.c"));
        assert!(calls[1].last().unwrap().ends_with("b.c"));
        assert_eq!(calls[2][0], "ar");
        assert_eq!(calls[2].len(), 5);
        assert!(dir.path().join("out").is_dir());

        let events = reporter.events();
        assert!(matches!(&events[0], BuildEvent::Compiling { index: 1, total: 2, .. }));
        assert!(matches!(&events[1], BuildEvent::Compiling { index: 2, total: 2, .. }));
        assert!(matches!(&events[2], BuildEvent::Linking { .. }));
    }

    #[test]
    fn test_build_skips_fresh_units_but_links_everything() {
        let dir = TempDir::new().unwrap();
        let p = project_in(&dir, ProjectKind::Exec, &["a.c", "b.c"]);
        std::fs::create_dir_all(&p.output_dir).unwrap();

        let past = std::time::UNIX_EPOCH + std::time::Duration::from_secs(1_000);
        let later = std::time::UNIX_EPOCH + std::time::Duration::from_secs(2_000);
        for (name, time) in [("a.c", past), ("b.c", later)] {
            let file = std::fs::File::options().write(true).open(p.source_dir.join(name)).unwrap();
            file.set_modified(time).unwrap();
        }
        for name in ["a.o", "b.o"] {
            std::fs::write(p.output_dir.join(name), "").unwrap();
            let file = std::fs::File::options().write(true).open(p.output_dir.join(name)).unwrap();
            file.set_modified(past + std::time::Duration::from_secs(500)).unwrap();
        }

        let runner = FakeRunner::new();
        let tc = toolchain();
        Pipeline::new(&tc, &runner, &NullReporter).build(&p).unwrap();

        let calls = runner.calls();
        assert_eq!(calls.len(), 2, "only b.c recompiles, then one link");
        assert!(calls[0].last().unwrap().ends_with("b.c"));
        let link = &calls[1];
        assert_eq!(link[0], "gcc");
        assert!(link.iter().any(|a| a.ends_with("a.o")));
        assert!(link.iter().any(|a| a.ends_with("b.o")));
    }

    #[test]
    fn test_build_links_even_when_up_to_date() {
        let dir = TempDir::new().unwrap();
        let p = project_in(&dir, ProjectKind::Lib, &[]);
        let runner = FakeRunner::new();
        let tc = toolchain();
        let reporter = RecordingReporter::new();

        Pipeline::new(&tc, &runner, &reporter).build(&p).unwrap();

        assert_eq!(runner.calls().len(), 1);
        assert!(matches!(&reporter.events()[0], BuildEvent::UpToDate { .. }));
    }

    #[test]
    fn test_compile_failure_stops_project() {
        let dir = TempDir::new().unwrap();
        let p = project_in(&dir, ProjectKind::Exec, &["a.c", "b.c", "c.c"]);
        let runner = FakeRunner::failing_on("b.c");
        let tc = toolchain();

        let err = Pipeline::new(&tc, &runner, &NullReporter).build(&p).unwrap_err();

        assert!(matches!(
            err,
            BakeError::Toolchain { source: BuildError::NonZeroExit { code: 1, .. }, .. }
        ));
        assert_eq!(runner.calls().len(), 2, "c.c and the link are never attempted");
    }

    #[test]
    fn test_parallel_compile_finishes_before_link() {
        let dir = TempDir::new().unwrap();
        let names: Vec<String> = (0..8).map(|i| format!("u{i}.c")).collect();
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
        let p = project_in(&dir, ProjectKind::Lib, &refs);
        let runner = FakeRunner::new();
        let tc = toolchain();

        Pipeline::new(&tc, &runner, &NullReporter)
            .with_jobs(4)
            .build(&p)
            .unwrap();

        let calls = runner.calls();
        assert_eq!(calls.len(), 9);
        assert_eq!(calls.last().unwrap()[0], "ar");
        assert!(calls[..8].iter().all(|c| c[0] == "gcc"));
    }

    #[test]
    fn test_parallel_compile_propagates_failure() {
        let dir = TempDir::new().unwrap();
        let p = project_in(&dir, ProjectKind::Lib, &["a.c", "b.c", "c.c", "d.c"]);
        let runner = FakeRunner::failing_on("c.c");
        let tc = toolchain();

        let result = Pipeline::new(&tc, &runner, &NullReporter).with_jobs(2).build(&p);

        assert!(result.is_err());
        assert!(runner.calls().iter().all(|c| c[0] != "ar"));
    }

    /// Fails `fast.c` at once and `slow.c` after a delay, with distinct codes
    struct StaggeredRunner;

    impl CommandRunner for StaggeredRunner {
        fn run(&self, argv: &[String], _cwd: Option<&Path>) -> Result<ExitOutcome, BuildError> {
            let source = argv.last().map(String::as_str).unwrap_or_default();
            if source.ends_with("slow.c") {
                std::thread::sleep(std::time::Duration::from_millis(300));
                Ok(ExitOutcome::NonZeroExit(3))
            } else if source.ends_with("fast.c") {
                Ok(ExitOutcome::NonZeroExit(2))
            } else {
                Ok(ExitOutcome::Success)
            }
        }
    }

    #[test]
    fn test_parallel_compile_returns_earliest_failure() {
        let dir = TempDir::new().unwrap();
        let p = project_in(&dir, ProjectKind::Lib, &["fast.c", "slow.c"]);
        let tc = toolchain();

        let err = Pipeline::new(&tc, &StaggeredRunner, &NullReporter)
            .with_jobs(2)
            .build(&p)
            .unwrap_err();

        match err {
            BakeError::Toolchain {
                source: BuildError::NonZeroExit { code, .. },
                ..
            } => assert_eq!(code, 2),
            other => panic!("unexpected error: {other}"),
        }
    }
}
