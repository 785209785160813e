//! fdata - reader for perf2bolt text profiles
//!
//! Parses LBR branch profiles, memory event profiles and non-LBR sample
//! profiles into per-function containers, and resolves function names
//! against them, including LTO-renamed (`.lto_priv.N`, `.constprop.N`)
//! functions whose numbering changed between builds.
//!
//! ```
//! use fdata::DataReader;
//!
//! let text = "1 main 3fb 0 /lib/ld-2.21.so 12 4 221\n";
//! let mut reader = DataReader::new(text);
//! reader.parse().unwrap();
//!
//! let main = reader.get_func_branch_data(&["main"]).unwrap();
//! assert_eq!(main.data()[0].branches, 221);
//! ```

pub mod buffer;
pub mod cli;
pub mod config;
pub mod error;
pub mod location;
pub mod lto;
pub mod profile;
pub mod reader;
pub mod records;
pub mod report;

pub use buffer::ProfileBuffer;
pub use config::ReaderConfig;
pub use error::{LookupError, ParseError, ReaderError};
pub use location::Location;
pub use profile::{FuncBranchData, FuncMemData, FuncSampleData};
pub use reader::{DataReader, ParseStats};
pub use records::{BranchHistory, BranchInfo, MemInfo, SampleInfo};
