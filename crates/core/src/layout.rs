//! Column positions shared by the pipeline stages.

// Primary table
pub const MATERIAL: usize = 0;
pub const SEASON: usize = 1;
pub const FIRST_AVAILABLE: usize = 2;
pub const DISCONTINUE: usize = 3;
pub const RESOLVED_FIRST_AVAILABLE: usize = 4;
pub const RESOLVED_DISCONTINUE: usize = 5;
pub const FIRST_AVAILABLE_CHANGED: usize = 6;
pub const DISCONTINUE_CHANGED: usize = 7;

/// Columns read and written in the primary table.
pub const PRIMARY_WIDTH: usize = 8;

// Reference table
pub const REF_MATERIAL: usize = 0;
pub const REF_SEASON: usize = 1;
pub const REF_FIRST_AVAILABLE: usize = 2;
pub const REF_DISCONTINUE: usize = 3;
pub const REF_STATUS: usize = 4;

/// Columns copied by the clean and reference mirrors.
pub const MIRROR_WIDTH: usize = 4;
