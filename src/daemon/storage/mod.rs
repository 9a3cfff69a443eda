//!  Storage is organized through [snapshot_storage::JsonSnapshotStorage].
//!  The basic idea is:
//!   - All usage lives in a single JSON document inside the application directory.
//!   - The document is a year/month/week/day tree, each day holding per-application and
//!     per-website records.
//!   - The document is always rewritten whole, through a temporary file.

pub mod entities;
pub mod snapshot_storage;
