//! Build rounds over module chunks.
//!
//! A [`BuildRound`] decides whether a chunk needs compiling at all, writes
//! the module descriptor the compiler reads, and hands it to a
//! [`CompilerInvoker`]. [`BuildSession`] runs the rounds of a whole project
//! in dependency order, chunks of one level in parallel, and records the
//! changes each round produced in the history files of its modules.

#![warn(missing_docs)]

pub mod descriptor;
pub mod error;
pub mod invoker;
pub mod record;
pub mod round;
pub mod session;

pub use descriptor::{JvmSourceRoot, ModuleDescriptor, ModuleEntry};
pub use error::BuildError;
pub use invoker::{CommandInvoker, CompileOutput, CompileRequest, CompilerInvoker};
pub use record::{now_millis, record_changes};
pub use round::{BuildRound, CompiledChunk, RoundContext, RoundOutcome, RoundSettings};
pub use session::{BuildReport, BuildSession, ChunkReport, ChunkStatus, SessionOptions};
