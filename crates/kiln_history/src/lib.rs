//! Cross-module build history lookup.
//!
//! When a module's classpath changes, the build needs to know which upstream
//! module produced each classpath entry so it can read that module's build
//! history file. [`GradleModulesInfo`] describes the modules of a session and
//! [`GradleModulesApiHistory`] maps an artifact (a class directory or an
//! archive) back to the history file of the module that built it.

#![warn(missing_docs)]

pub mod archive;
pub mod modules;
pub mod resolver;

pub use archive::module_names_in_archive;
pub use modules::{GradleModule, GradleModulesInfo};
pub use resolver::{EmptyModulesApiHistory, GradleModulesApiHistory, ModulesApiHistory};
