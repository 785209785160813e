// Per-function profile containers
//
// Each container owns the ordered records of one function plus secondary
// indices, so repeated observations are coalesced in amortized O(1) no matter
// in which order they arrive. Records are only ever added through the
// bump/merge operations; after parsing the containers are sorted once and
// become read-only.

mod branch;
mod memory;
mod sample;

pub use branch::FuncBranchData;
pub use memory::FuncMemData;
pub use sample::FuncSampleData;
