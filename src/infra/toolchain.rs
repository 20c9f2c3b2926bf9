//! Toolchain configuration
//!
//! Resolved compiler, assembler and linker command names.

/// C toolchain command names
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toolchain {
    /// C compiler (`[config].cc`)
    compiler: String,
    /// Assembler (`[config].as`), reserved
    assembler: String,
    /// Linker driver (`[config].ld`)
    linker: String,
}

impl Toolchain {
    /// Create a new toolchain from command names
    pub fn new(
        compiler: impl Into<String>,
        assembler: impl Into<String>,
        linker: impl Into<String>,
    ) -> Self {
        Self {
            compiler: compiler.into(),
            assembler: assembler.into(),
            linker: linker.into(),
        }
    }

    /// Get the compiler command
    pub fn compiler(&self) -> &str {
        &self.compiler
    }

    /// Get the assembler command
    ///
    /// No pipeline step invokes the assembler yet.
    pub fn assembler(&self) -> &str {
        &self.assembler
    }

    /// Get the linker command
    pub fn linker(&self) -> &str {
        &self.linker
    }
}

impl Default for Toolchain {
    fn default() -> Self {
        Self::new("cc", "as", "cc")
    }
}
